use crate::entities::event_leader_entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Per-event capability checked for leaders; admins bypass it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderPermission {
    View,
    AddRegistrations,
    RecordPayments,
    ViewPayments,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AssignLeaderRequest {
    pub user_id: i64,
    pub can_view: Option<bool>,
    pub can_add_registrations: Option<bool>,
    pub can_record_payments: Option<bool>,
    pub can_view_payments: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EventLeaderResponse {
    pub id: i64,
    pub event_id: i64,
    pub user_id: i64,
    pub can_view: bool,
    pub can_add_registrations: bool,
    pub can_record_payments: bool,
    pub can_view_payments: bool,
    pub assigned_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<event_leader_entity::Model> for EventLeaderResponse {
    fn from(m: event_leader_entity::Model) -> Self {
        Self {
            id: m.id,
            event_id: m.event_id,
            user_id: m.user_id,
            can_view: m.can_view,
            can_add_registrations: m.can_add_registrations,
            can_record_payments: m.can_record_payments,
            can_view_payments: m.can_view_payments,
            assigned_by: m.assigned_by,
            created_at: m.created_at,
        }
    }
}

/// Leader portal summary across the events the caller can view
#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct LeaderDashboardStats {
    pub total_events: u64,
    /// Events currently open for signup
    pub active_events: u64,
    pub total_registrations: u64,
    /// Pending or partial registrations that still owe money
    pub pending_payments: u64,
}
