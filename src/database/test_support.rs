//! Fixtures for service tests: a migrated in-memory SQLite database and a few row builders.

use crate::config::DatabaseConfig;
use crate::entities::{
    EventStatus, MemberStatus, event_entity as events, member_entity as members,
};
use crate::middlewares::{AuthUser, UserRole};
use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

use super::{create_pool, run_migrations};

/// One connection keeps the in-memory database alive and serializes transactions.
pub async fn setup_db() -> DatabaseConnection {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        connect_timeout_secs: 5,
        acquire_timeout_secs: 30,
    };
    let pool = create_pool(&config).await.expect("connect sqlite");
    run_migrations(&pool).await.expect("migrate sqlite");
    pool
}

pub fn admin() -> AuthUser {
    AuthUser {
        id: 1,
        role: UserRole::Admin,
    }
}

pub fn leader(id: i64) -> AuthUser {
    AuthUser {
        id,
        role: UserRole::EventLeader,
    }
}

pub async fn insert_event(
    db: &DatabaseConnection,
    price_cents: i64,
    capacity: Option<i32>,
    status: EventStatus,
) -> events::Model {
    let now = Utc::now();
    events::ActiveModel {
        name: Set("Youth Retreat".to_string()),
        event_date: Set(now + Duration::days(14)),
        price_cents: Set(price_cents),
        capacity: Set(capacity),
        status: Set(status),
        allow_partial_payment: Set(true),
        public_signup_slug: Set(uuid::Uuid::new_v4().simple().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert event")
}

pub async fn insert_member(db: &DatabaseConnection, email: &str) -> members::Model {
    let now = Utc::now();
    members::ActiveModel {
        first_name: Set("Ruth".to_string()),
        last_name: Set("Moabite".to_string()),
        email: Set(Some(email.to_string())),
        member_status: Set(MemberStatus::Member),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert member")
}
