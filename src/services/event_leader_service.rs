use crate::entities::{
    EventStatus, RegistrationStatus, event_entity as events, event_leader_entity as leaders,
    registration_entity as registrations,
};
use crate::error::{AppError, AppResult};
use crate::middlewares::AuthUser;
use crate::models::{
    AssignLeaderRequest, EventLeaderResponse, EventResponse, LeaderDashboardStats,
    LeaderPermission,
};
use crate::services::audit_service::{AuditService, snapshot};
use crate::services::ledger;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::collections::HashMap;

/// Fail with `Forbidden` unless the caller may act on the event. Admins always may.
pub async fn ensure_event_permission<C>(
    conn: &C,
    user: &AuthUser,
    event_id: i64,
    permission: LeaderPermission,
) -> AppResult<()>
where
    C: ConnectionTrait,
{
    if has_event_permission(conn, user, event_id, permission).await? {
        Ok(())
    } else {
        log::warn!("User {} lacks {permission:?} on event {event_id}", user.id);
        Err(AppError::Forbidden)
    }
}

pub async fn has_event_permission<C>(
    conn: &C,
    user: &AuthUser,
    event_id: i64,
    permission: LeaderPermission,
) -> AppResult<bool>
where
    C: ConnectionTrait,
{
    if user.is_admin() {
        return Ok(true);
    }
    let assignment = leaders::Entity::find()
        .filter(leaders::Column::EventId.eq(event_id))
        .filter(leaders::Column::UserId.eq(user.id))
        .one(conn)
        .await?;

    Ok(assignment.is_some_and(|a| match permission {
        LeaderPermission::View => a.can_view,
        LeaderPermission::AddRegistrations => a.can_add_registrations,
        LeaderPermission::RecordPayments => a.can_record_payments,
        LeaderPermission::ViewPayments => a.can_view_payments,
    }))
}

#[derive(Clone)]
pub struct EventLeaderService {
    pool: DatabaseConnection,
    audit: AuditService,
}

impl EventLeaderService {
    pub fn new(pool: DatabaseConnection, audit: AuditService) -> Self {
        Self { pool, audit }
    }

    /// Assign a leader to an event, or replace the permissions of an existing assignment.
    pub async fn assign_leader(
        &self,
        admin: &AuthUser,
        event_id: i64,
        request: AssignLeaderRequest,
    ) -> AppResult<EventLeaderResponse> {
        events::Entity::find_by_id(event_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Event".into()))?;

        let am = leaders::ActiveModel {
            event_id: Set(event_id),
            user_id: Set(request.user_id),
            can_view: Set(request.can_view.unwrap_or(true)),
            can_add_registrations: Set(request.can_add_registrations.unwrap_or(true)),
            can_record_payments: Set(request.can_record_payments.unwrap_or(true)),
            can_view_payments: Set(request.can_view_payments.unwrap_or(true)),
            assigned_by: Set(Some(admin.id)),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        leaders::Entity::insert(am)
            .on_conflict(
                OnConflict::columns([leaders::Column::EventId, leaders::Column::UserId])
                    .update_columns([
                        leaders::Column::CanView,
                        leaders::Column::CanAddRegistrations,
                        leaders::Column::CanRecordPayments,
                        leaders::Column::CanViewPayments,
                        leaders::Column::AssignedBy,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.pool)
            .await?;

        let assignment = self.find_assignment(event_id, request.user_id).await?;

        self.audit
            .record(
                Some(admin.id),
                "assign_event_leader",
                "event_leaders",
                assignment.id,
                None,
                snapshot(&assignment),
            )
            .await;

        Ok(assignment.into())
    }

    pub async fn remove_leader(
        &self,
        admin: &AuthUser,
        event_id: i64,
        user_id: i64,
    ) -> AppResult<()> {
        let assignment = self.find_assignment(event_id, user_id).await?;
        let old = snapshot(&assignment);
        let id = assignment.id;
        assignment.delete(&self.pool).await?;

        self.audit
            .record(
                Some(admin.id),
                "remove_event_leader",
                "event_leaders",
                id,
                old,
                None,
            )
            .await;
        Ok(())
    }

    pub async fn list_leaders(&self, event_id: i64) -> AppResult<Vec<EventLeaderResponse>> {
        let rows = leaders::Entity::find()
            .filter(leaders::Column::EventId.eq(event_id))
            .order_by_asc(leaders::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Events the caller can see from the leader portal
    pub async fn list_my_events(&self, user: &AuthUser) -> AppResult<Vec<EventResponse>> {
        let rows = self.visible_events(user).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn dashboard_stats(&self, user: &AuthUser) -> AppResult<LeaderDashboardStats> {
        let visible = self.visible_events(user).await?;
        let mut stats = LeaderDashboardStats {
            total_events: visible.len() as u64,
            active_events: visible
                .iter()
                .filter(|e| e.status == EventStatus::Open)
                .count() as u64,
            ..Default::default()
        };
        if visible.is_empty() {
            return Ok(stats);
        }

        let prices: HashMap<i64, i64> = visible.iter().map(|e| (e.id, e.price_cents)).collect();
        let event_ids: Vec<i64> = prices.keys().copied().collect();

        stats.total_registrations = registrations::Entity::find()
            .filter(registrations::Column::EventId.is_in(event_ids.iter().copied()))
            .count(&self.pool)
            .await?;

        let open: Vec<(i64, i64)> = registrations::Entity::find()
            .select_only()
            .column(registrations::Column::Id)
            .column(registrations::Column::EventId)
            .filter(registrations::Column::EventId.is_in(event_ids.iter().copied()))
            .filter(
                registrations::Column::Status
                    .is_in([RegistrationStatus::Pending, RegistrationStatus::Partial]),
            )
            .into_tuple()
            .all(&self.pool)
            .await?;

        let registration_ids: Vec<i64> = open.iter().map(|(id, _)| *id).collect();
        let mut paid: HashMap<i64, i64> = HashMap::new();
        for (registration_id, amount) in
            ledger::load_amounts_for(&self.pool, &registration_ids).await?
        {
            *paid.entry(registration_id).or_default() += amount;
        }

        stats.pending_payments = open
            .iter()
            .filter(|(id, event_id)| {
                let price = prices.get(event_id).copied().unwrap_or_default();
                price > paid.get(id).copied().unwrap_or_default()
            })
            .count() as u64;

        Ok(stats)
    }

    async fn visible_events(&self, user: &AuthUser) -> AppResult<Vec<events::Model>> {
        let query = events::Entity::find().order_by_desc(events::Column::EventDate);
        let rows = if user.is_admin() {
            query.all(&self.pool).await?
        } else {
            query
                .inner_join(leaders::Entity)
                .filter(leaders::Column::UserId.eq(user.id))
                .filter(leaders::Column::CanView.eq(true))
                .all(&self.pool)
                .await?
        };
        Ok(rows)
    }

    pub async fn ensure_permission(
        &self,
        user: &AuthUser,
        event_id: i64,
        permission: LeaderPermission,
    ) -> AppResult<()> {
        ensure_event_permission(&self.pool, user, event_id, permission).await
    }

    async fn find_assignment(&self, event_id: i64, user_id: i64) -> AppResult<leaders::Model> {
        leaders::Entity::find()
            .filter(leaders::Column::EventId.eq(event_id))
            .filter(leaders::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Event leader".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::{admin, insert_event, leader, setup_db};
    use crate::entities::EventStatus;

    fn request(user_id: i64, can_record_payments: bool) -> AssignLeaderRequest {
        AssignLeaderRequest {
            user_id,
            can_view: None,
            can_add_registrations: Some(false),
            can_record_payments: Some(can_record_payments),
            can_view_payments: None,
        }
    }

    #[tokio::test]
    async fn permissions_follow_assignment() {
        let db = setup_db().await;
        let service = EventLeaderService::new(db.clone(), AuditService::new(db.clone()));
        let event = insert_event(&db, 5_000, None, EventStatus::Open).await;
        let other = insert_event(&db, 5_000, None, EventStatus::Open).await;

        service
            .assign_leader(&admin(), event.id, request(42, true))
            .await
            .unwrap();

        let lead = leader(42);
        assert!(service
            .ensure_permission(&lead, event.id, LeaderPermission::RecordPayments)
            .await
            .is_ok());
        assert!(matches!(
            service
                .ensure_permission(&lead, event.id, LeaderPermission::AddRegistrations)
                .await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            service
                .ensure_permission(&lead, other.id, LeaderPermission::View)
                .await,
            Err(AppError::Forbidden)
        ));
        assert!(service
            .ensure_permission(&admin(), other.id, LeaderPermission::RecordPayments)
            .await
            .is_ok());

        let mine = service.list_my_events(&lead).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, event.id);
    }

    #[tokio::test]
    async fn reassigning_updates_permissions_in_place() {
        let db = setup_db().await;
        let service = EventLeaderService::new(db.clone(), AuditService::new(db.clone()));
        let event = insert_event(&db, 0, None, EventStatus::Open).await;

        service
            .assign_leader(&admin(), event.id, request(7, true))
            .await
            .unwrap();
        let updated = service
            .assign_leader(&admin(), event.id, request(7, false))
            .await
            .unwrap();
        assert!(!updated.can_record_payments);
        assert_eq!(service.list_leaders(event.id).await.unwrap().len(), 1);

        service.remove_leader(&admin(), event.id, 7).await.unwrap();
        assert!(service.list_leaders(event.id).await.unwrap().is_empty());
        assert!(matches!(
            service.remove_leader(&admin(), event.id, 7).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn dashboard_counts_only_visible_events() {
        use crate::database::test_support::insert_member;
        use chrono::Utc;
        use sea_orm::ActiveModelTrait;

        let db = setup_db().await;
        let service = EventLeaderService::new(db.clone(), AuditService::new(db.clone()));
        let lead = leader(42);
        assert_eq!(
            service.dashboard_stats(&lead).await.unwrap(),
            LeaderDashboardStats::default()
        );

        let open = insert_event(&db, 5_000, None, EventStatus::Open).await;
        let closed = insert_event(&db, 0, None, EventStatus::Closed).await;
        let hidden = insert_event(&db, 5_000, None, EventStatus::Open).await;
        for event_id in [open.id, closed.id] {
            service
                .assign_leader(&admin(), event_id, request(42, false))
                .await
                .unwrap();
        }

        let now = Utc::now();
        let add = |email: &'static str, event_id: i64, status: RegistrationStatus| {
            let db = db.clone();
            async move {
                let member = insert_member(&db, email).await;
                registrations::ActiveModel {
                    member_id: Set(member.id),
                    event_id: Set(event_id),
                    status: Set(status),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&db)
                .await
                .unwrap()
            }
        };
        let owing = add("anna@example.org", open.id, RegistrationStatus::Pending).await;
        add("simeon@example.org", open.id, RegistrationStatus::Paid).await;
        add("zacchaeus@example.org", closed.id, RegistrationStatus::Pending).await;
        add("levi@example.org", hidden.id, RegistrationStatus::Pending).await;

        let stats = service.dashboard_stats(&lead).await.unwrap();
        assert_eq!(stats.total_events, 2);
        assert_eq!(stats.active_events, 1);
        assert_eq!(stats.total_registrations, 3);
        // the free closed event owes nothing
        assert_eq!(stats.pending_payments, 1);
        assert!(owing.id > 0);

        let everything = service.dashboard_stats(&admin()).await.unwrap();
        assert_eq!(everything.total_events, 3);
        assert_eq!(everything.pending_payments, 2);
    }
}
