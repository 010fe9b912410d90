use crate::entities::{PaymentMethod, RegistrationStatus, payment_entity};
use crate::utils::to_decimal;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Payment standing derived from total paid vs event price
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
    Overpaid,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecordPaymentRequest {
    pub registration_id: i64,
    #[schema(value_type = String, example = "40.00")]
    pub amount: Decimal,
    pub method: PaymentMethod,
    /// Check number, Zelle confirmation, etc.
    pub transaction_id: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    pub id: i64,
    pub registration_id: i64,
    #[schema(value_type = String, example = "40.00")]
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub transaction_id: Option<String>,
    pub external_payment_id: Option<String>,
    pub notes: Option<String>,
    pub recorded_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<payment_entity::Model> for PaymentResponse {
    fn from(m: payment_entity::Model) -> Self {
        Self {
            id: m.id,
            registration_id: m.registration_id,
            amount: to_decimal(m.amount_cents),
            method: m.method,
            transaction_id: m.transaction_id,
            external_payment_id: m.external_payment_id,
            notes: m.notes,
            recorded_by: m.recorded_by,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BalanceResponse {
    pub registration_id: i64,
    #[schema(value_type = String, example = "100.00")]
    pub event_price: Decimal,
    #[schema(value_type = String, example = "40.00")]
    pub total_paid: Decimal,
    /// Negative when overpaid
    #[schema(value_type = String, example = "60.00")]
    pub balance_due: Decimal,
    pub payment_count: u64,
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecordPaymentResponse {
    pub payment: PaymentResponse,
    pub balance: BalanceResponse,
    pub registration_status: RegistrationStatus,
    /// Set when the payment exceeded the balance due
    pub warning: Option<String>,
}

/// Outcome of an external payment confirmation
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExternalPaymentResponse {
    pub payment: PaymentResponse,
    pub registration_status: RegistrationStatus,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaymentQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub registration_id: Option<i64>,
    pub event_id: Option<i64>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ReconcileReport {
    pub examined: u64,
    pub corrected: u64,
}
