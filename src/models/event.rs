use crate::entities::{EventStatus, event_entity};
use crate::utils::to_decimal;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateEventRequest {
    pub name: String,
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    /// Dollars, two decimal places
    #[schema(value_type = String, example = "100.00")]
    pub price: Decimal,
    pub capacity: Option<i32>,
    pub status: Option<EventStatus>,
    pub allow_partial_payment: Option<bool>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateEventRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub event_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    #[schema(value_type = Option<String>, example = "100.00")]
    pub price: Option<Decimal>,
    pub capacity: Option<i32>,
    /// Set to true to remove the capacity limit
    pub unlimited_capacity: Option<bool>,
    pub status: Option<EventStatus>,
    pub allow_partial_payment: Option<bool>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<EventStatus>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EventResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    #[schema(value_type = String, example = "100.00")]
    pub price: Decimal,
    pub capacity: Option<i32>,
    pub status: EventStatus,
    pub allow_partial_payment: bool,
    pub public_signup_slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<event_entity::Model> for EventResponse {
    fn from(m: event_entity::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            event_date: m.event_date,
            end_date: m.end_date,
            location: m.location,
            price: to_decimal(m.price_cents),
            capacity: m.capacity,
            status: m.status,
            allow_partial_payment: m.allow_partial_payment,
            public_signup_slug: m.public_signup_slug,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EventStats {
    pub registration_count: u64,
    /// confirmed + paid
    pub confirmed_count: u64,
    pub capacity_remaining: Option<i64>,
    /// Sum of every payment recorded against the event
    #[schema(value_type = String, example = "1250.00")]
    pub total_revenue: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EventDetailResponse {
    pub event: EventResponse,
    pub stats: EventStats,
}

/// Fields shown on the public signup page
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PublicEventResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    #[schema(value_type = String, example = "100.00")]
    pub price: Decimal,
    pub allow_partial_payment: bool,
    pub capacity: Option<i32>,
    pub capacity_remaining: Option<i64>,
}
