use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Card payment confirmed by the processor webhook
    #[sea_orm(string_value = "stripe")]
    Stripe,
    #[sea_orm(string_value = "cash")]
    Cash,
    #[sea_orm(string_value = "check")]
    Check,
    #[sea_orm(string_value = "zelle")]
    Zelle,
    #[sea_orm(string_value = "venmo")]
    Venmo,
    #[sea_orm(string_value = "paypal")]
    Paypal,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Stripe => write!(f, "stripe"),
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Check => write!(f, "check"),
            PaymentMethod::Zelle => write!(f, "zelle"),
            PaymentMethod::Venmo => write!(f, "venmo"),
            PaymentMethod::Paypal => write!(f, "paypal"),
        }
    }
}

/// Payment row
/// - immutable once written; only manual rows may be deleted
/// - external_payment_id is the processor idempotency key (unique)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub registration_id: i64,
    /// Amount in cents, always > 0
    pub amount_cents: i64,
    pub method: PaymentMethod,
    /// Reference entered by staff (check number, Zelle confirmation...)
    pub transaction_id: Option<String>,
    #[sea_orm(unique)]
    pub external_payment_id: Option<String>,
    pub notes: Option<String>,
    /// NULL for automated payments
    pub recorded_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Model {
    pub fn is_external(&self) -> bool {
        self.external_payment_id.is_some()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::registrations::Entity",
        from = "Column::RegistrationId",
        to = "super::registrations::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Registration,
}

impl Related<super::registrations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Registration.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
