use sea_orm_migration::prelude::*;

/// Per-event leader assignments with permission flags
#[derive(DeriveIden)]
enum EventLeaders {
    Table,
    Id,
    EventId,
    UserId,
    CanView,
    CanAddRegistrations,
    CanRecordPayments,
    CanViewPayments,
    AssignedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Events {
    Table,
    Id,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EventLeaders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EventLeaders::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EventLeaders::EventId).big_integer().not_null())
                    .col(ColumnDef::new(EventLeaders::UserId).big_integer().not_null())
                    .col(
                        ColumnDef::new(EventLeaders::CanView)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(EventLeaders::CanAddRegistrations)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(EventLeaders::CanRecordPayments)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(EventLeaders::CanViewPayments)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(EventLeaders::AssignedBy).big_integer().null())
                    .col(
                        ColumnDef::new(EventLeaders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_leaders_event")
                            .from(EventLeaders::Table, EventLeaders::EventId)
                            .to(Events::Table, Events::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_event_leaders_event_user_unique")
                    .table(EventLeaders::Table)
                    .col(EventLeaders::EventId)
                    .col(EventLeaders::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_event_leaders_user")
                    .table(EventLeaders::Table)
                    .col(EventLeaders::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(EventLeaders::Table).to_owned())
            .await?;
        Ok(())
    }
}
