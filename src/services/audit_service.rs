use crate::entities::audit_log_entity as audit_logs;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde::Serialize;
use serde_json::Value;

/// Append-only audit trail. Writes are best effort: a failure is logged and never
/// reaches the caller.
#[derive(Clone)]
pub struct AuditService {
    pool: DatabaseConnection,
}

impl AuditService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn record(
        &self,
        user_id: Option<i64>,
        action: &str,
        table_name: &str,
        record_id: i64,
        old_data: Option<Value>,
        new_data: Option<Value>,
    ) {
        let entry = audit_logs::ActiveModel {
            user_id: Set(user_id),
            action: Set(action.to_string()),
            table_name: Set(table_name.to_string()),
            record_id: Set(Some(record_id.to_string())),
            old_data: Set(old_data),
            new_data: Set(new_data),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        if let Err(e) = entry.insert(&self.pool).await {
            log::warn!("Audit log write failed for {action} on {table_name}/{record_id}: {e}");
        }
    }
}

/// Snapshot a row for the audit trail; unserializable rows are recorded as absent.
pub fn snapshot<T: Serialize>(row: &T) -> Option<Value> {
    serde_json::to_value(row).ok()
}
