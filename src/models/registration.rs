use crate::entities::{PaymentMethod, RegistrationStatus, registration_entity};
use crate::models::{BalanceResponse, MemberResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Anonymous signup form submission
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicRegistrationRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile_phone: String,
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,
    /// How the registrant intends to pay; informational only
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
    /// Cloudflare Turnstile token, required when verification is configured
    pub turnstile_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PublicRegistrationResponse {
    pub registration: RegistrationResponse,
    pub member_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegistrationResponse {
    pub id: i64,
    pub member_id: i64,
    pub event_id: i64,
    pub status: RegistrationStatus,
    pub payment_method_preference: Option<PaymentMethod>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<registration_entity::Model> for RegistrationResponse {
    fn from(m: registration_entity::Model) -> Self {
        Self {
            id: m.id,
            member_id: m.member_id,
            event_id: m.event_id,
            status: m.status,
            payment_method_preference: m.payment_method_preference,
            notes: m.notes,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Registration with its member, event name and balance computed on read
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegistrationDetail {
    pub registration: RegistrationResponse,
    pub member: Option<MemberResponse>,
    pub event_name: String,
    /// Omitted for leaders without payment visibility
    pub balance: Option<BalanceResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateRegistrationRequest {
    pub member_id: i64,
    pub event_id: i64,
    pub status: Option<RegistrationStatus>,
    pub payment_method_preference: Option<PaymentMethod>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateRegistrationRequest {
    pub status: Option<RegistrationStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RegistrationQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub event_id: Option<i64>,
    pub member_id: Option<i64>,
    pub status: Option<RegistrationStatus>,
}
