use crate::config::CapacityPolicy;
use crate::entities::{
    EventStatus, RegistrationStatus, event_entity as events, payment_entity as payments,
    registration_entity as registrations,
};
use crate::error::{AppError, AppResult};
use crate::middlewares::AuthUser;
use crate::models::{
    CreateEventRequest, EventDetailResponse, EventQuery, EventResponse, EventStats,
    PaginatedResponse, PaginationParams, PublicEventResponse, UpdateEventRequest,
};
use crate::services::audit_service::{AuditService, snapshot};
use crate::services::ledger;
use crate::utils::{to_cents, to_decimal};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};

/// Registration statuses that hold a capacity slot under the given policy
pub fn occupying_statuses(policy: CapacityPolicy) -> &'static [RegistrationStatus] {
    match policy {
        CapacityPolicy::Reserved => &[
            RegistrationStatus::Pending,
            RegistrationStatus::Partial,
            RegistrationStatus::Confirmed,
            RegistrationStatus::Paid,
        ],
        CapacityPolicy::ConfirmedOnly => &[RegistrationStatus::Confirmed, RegistrationStatus::Paid],
    }
}

pub async fn count_occupied<C>(conn: &C, event_id: i64, policy: CapacityPolicy) -> AppResult<u64>
where
    C: ConnectionTrait,
{
    let count = registrations::Entity::find()
        .filter(registrations::Column::EventId.eq(event_id))
        .filter(registrations::Column::Status.is_in(occupying_statuses(policy).iter().copied()))
        .count(conn)
        .await?;
    Ok(count)
}

fn capacity_remaining(capacity: Option<i32>, occupied: u64) -> Option<i64> {
    capacity.map(|cap| (i64::from(cap) - occupied as i64).max(0))
}

fn validate_price(price: rust_decimal::Decimal) -> AppResult<i64> {
    let cents = to_cents(price)?;
    if cents < 0 {
        return Err(AppError::InvalidAmount("Price cannot be negative".into()));
    }
    Ok(cents)
}

fn validate_capacity(capacity: Option<i32>) -> AppResult<()> {
    match capacity {
        Some(c) if c <= 0 => Err(AppError::ValidationError(
            "Capacity must be a positive number".into(),
        )),
        _ => Ok(()),
    }
}

/// URL-safe slug from the event name plus a random suffix
fn signup_slug(name: &str) -> String {
    let mut base = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            base.push(c.to_ascii_lowercase());
        } else if !base.ends_with('-') && !base.is_empty() {
            base.push('-');
        }
    }
    let base = base.trim_end_matches('-');
    let base: String = base.chars().take(48).collect();
    let suffix = &uuid::Uuid::new_v4().simple().to_string()[..8];
    if base.is_empty() {
        format!("event-{suffix}")
    } else {
        format!("{base}-{suffix}")
    }
}

#[derive(Clone)]
pub struct EventService {
    pool: DatabaseConnection,
    capacity_policy: CapacityPolicy,
    audit: AuditService,
}

impl EventService {
    pub fn new(pool: DatabaseConnection, capacity_policy: CapacityPolicy, audit: AuditService) -> Self {
        Self {
            pool,
            capacity_policy,
            audit,
        }
    }

    pub async fn list_events(&self, query: &EventQuery) -> AppResult<PaginatedResponse<EventResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut base_query = events::Entity::find();
        if let Some(status) = query.status {
            base_query = base_query.filter(events::Column::Status.eq(status));
        }

        let total = base_query.clone().count(&self.pool).await?;
        let rows = base_query
            .order_by_desc(events::Column::EventDate)
            .limit(params.per_page)
            .offset(params.offset())
            .all(&self.pool)
            .await?;

        Ok(PaginatedResponse::new(
            rows.into_iter().map(Into::into).collect(),
            params,
            total,
        ))
    }

    pub async fn get_event(&self, event_id: i64) -> AppResult<EventDetailResponse> {
        let event = self.find_event(event_id).await?;

        let registration_count = registrations::Entity::find()
            .filter(registrations::Column::EventId.eq(event_id))
            .count(&self.pool)
            .await?;
        let confirmed_count =
            count_occupied(&self.pool, event_id, CapacityPolicy::ConfirmedOnly).await?;
        let occupied = count_occupied(&self.pool, event_id, self.capacity_policy).await?;

        let revenue: Vec<i64> = payments::Entity::find()
            .inner_join(registrations::Entity)
            .filter(registrations::Column::EventId.eq(event_id))
            .select_only()
            .column(payments::Column::AmountCents)
            .into_tuple()
            .all(&self.pool)
            .await?;

        let stats = EventStats {
            registration_count,
            confirmed_count,
            capacity_remaining: capacity_remaining(event.capacity, occupied),
            total_revenue: to_decimal(revenue.into_iter().sum()),
        };

        Ok(EventDetailResponse {
            event: event.into(),
            stats,
        })
    }

    pub async fn create_event(
        &self,
        user: &AuthUser,
        request: CreateEventRequest,
    ) -> AppResult<EventResponse> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::ValidationError("Event name is required".into()));
        }
        let price_cents = validate_price(request.price)?;
        validate_capacity(request.capacity)?;

        let now = Utc::now();
        let event = events::ActiveModel {
            name: Set(name.clone()),
            description: Set(request.description),
            event_date: Set(request.event_date),
            end_date: Set(request.end_date),
            location: Set(request.location),
            price_cents: Set(price_cents),
            capacity: Set(request.capacity),
            status: Set(request.status.unwrap_or(EventStatus::Draft)),
            allow_partial_payment: Set(request.allow_partial_payment.unwrap_or(true)),
            public_signup_slug: Set(signup_slug(&name)),
            created_by: Set(Some(user.id)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!("Event {} created by user {}", event.id, user.id);
        self.audit
            .record(Some(user.id), "create_event", "events", event.id, None, snapshot(&event))
            .await;

        Ok(event.into())
    }

    pub async fn update_event(
        &self,
        user: &AuthUser,
        event_id: i64,
        request: UpdateEventRequest,
    ) -> AppResult<EventResponse> {
        let txn = self.pool.begin().await?;
        let event = events::Entity::find_by_id(event_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Event".into()))?;
        let old = snapshot(&event);
        let old_price_cents = event.price_cents;
        let mut am = event.into_active_model();

        if let Some(name) = request.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(AppError::ValidationError("Event name is required".into()));
            }
            am.name = Set(name);
        }
        if let Some(description) = request.description {
            am.description = Set(Some(description));
        }
        if let Some(event_date) = request.event_date {
            am.event_date = Set(event_date);
        }
        if let Some(end_date) = request.end_date {
            am.end_date = Set(Some(end_date));
        }
        if let Some(location) = request.location {
            am.location = Set(Some(location));
        }
        if let Some(price) = request.price {
            am.price_cents = Set(validate_price(price)?);
        }
        if request.unlimited_capacity == Some(true) {
            am.capacity = Set(None);
        } else if let Some(capacity) = request.capacity {
            validate_capacity(Some(capacity))?;
            am.capacity = Set(Some(capacity));
        }
        if let Some(status) = request.status {
            am.status = Set(status);
        }
        if let Some(allow) = request.allow_partial_payment {
            am.allow_partial_payment = Set(allow);
        }
        am.updated_at = Set(Utc::now());

        let updated = am.update(&txn).await?;
        if updated.price_cents != old_price_cents {
            let corrected =
                ledger::reconcile_event_registrations(&txn, event_id, updated.price_cents).await?;
            if corrected > 0 {
                log::info!(
                    "Event {event_id} price changed; {corrected} registration statuses updated"
                );
            }
        }
        txn.commit().await?;

        self.audit
            .record(Some(user.id), "update_event", "events", event_id, old, snapshot(&updated))
            .await;

        Ok(updated.into())
    }

    pub async fn delete_event(&self, user: &AuthUser, event_id: i64) -> AppResult<()> {
        let event = self.find_event(event_id).await?;

        let registrations = registrations::Entity::find()
            .filter(registrations::Column::EventId.eq(event_id))
            .count(&self.pool)
            .await?;
        if registrations > 0 {
            return Err(AppError::ValidationError(
                "Cannot delete an event with existing registrations. Cancel it instead.".into(),
            ));
        }

        let old = snapshot(&event);
        event.delete(&self.pool).await?;
        log::info!("Event {event_id} deleted by user {}", user.id);
        self.audit
            .record(Some(user.id), "delete_event", "events", event_id, old, None)
            .await;
        Ok(())
    }

    /// Signup page lookup. Only open events are visible to the public.
    pub async fn get_public_event(&self, slug: &str) -> AppResult<PublicEventResponse> {
        let event = events::Entity::find()
            .filter(events::Column::PublicSignupSlug.eq(slug))
            .filter(events::Column::Status.eq(EventStatus::Open))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Event".into()))?;

        let occupied = count_occupied(&self.pool, event.id, self.capacity_policy).await?;

        Ok(PublicEventResponse {
            id: event.id,
            name: event.name,
            description: event.description,
            event_date: event.event_date,
            end_date: event.end_date,
            location: event.location,
            price: to_decimal(event.price_cents),
            allow_partial_payment: event.allow_partial_payment,
            capacity: event.capacity,
            capacity_remaining: capacity_remaining(event.capacity, occupied),
        })
    }

    async fn find_event(&self, event_id: i64) -> AppResult<events::Model> {
        events::Entity::find_by_id(event_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Event".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::{admin, insert_event, insert_member, setup_db};
    use chrono::Duration;
    use std::str::FromStr;

    fn service(db: &DatabaseConnection) -> EventService {
        EventService::new(db.clone(), CapacityPolicy::Reserved, AuditService::new(db.clone()))
    }

    fn create_request(name: &str, price: &str, capacity: Option<i32>) -> CreateEventRequest {
        CreateEventRequest {
            name: name.to_string(),
            description: None,
            event_date: Utc::now() + Duration::days(30),
            end_date: None,
            location: Some("Fellowship Hall".to_string()),
            price: rust_decimal::Decimal::from_str(price).unwrap(),
            capacity,
            status: Some(EventStatus::Open),
            allow_partial_payment: None,
        }
    }

    #[test]
    fn slugs_are_url_safe() {
        let slug = signup_slug("  Women's Retreat 2026!  ");
        assert!(slug.starts_with("women-s-retreat-2026-"));
        assert_eq!(slug.len(), "women-s-retreat-2026-".len() + 8);
        assert!(signup_slug("!!!").starts_with("event-"));
    }

    #[tokio::test]
    async fn create_validates_price_and_capacity() {
        let db = setup_db().await;
        let svc = service(&db);

        assert!(matches!(
            svc.create_event(&admin(), create_request("Camp", "-1.00", None)).await,
            Err(AppError::InvalidAmount(_))
        ));
        assert!(matches!(
            svc.create_event(&admin(), create_request("Camp", "10.00", Some(0))).await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            svc.create_event(&admin(), create_request("  ", "10.00", None)).await,
            Err(AppError::ValidationError(_))
        ));

        let created = svc
            .create_event(&admin(), create_request("Camp", "125.50", Some(40)))
            .await
            .unwrap();
        assert_eq!(created.price.to_string(), "125.50");
        assert!(created.public_signup_slug.starts_with("camp-"));
    }

    #[tokio::test]
    async fn public_lookup_only_shows_open_events() {
        let db = setup_db().await;
        let svc = service(&db);
        let open = insert_event(&db, 2_000, Some(10), EventStatus::Open).await;
        let draft = insert_event(&db, 2_000, Some(10), EventStatus::Draft).await;

        let public = svc.get_public_event(&open.public_signup_slug).await.unwrap();
        assert_eq!(public.capacity_remaining, Some(10));
        assert_eq!(public.price.to_string(), "20.00");

        assert!(matches!(
            svc.get_public_event(&draft.public_signup_slug).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_is_refused_while_registrations_exist() {
        let db = setup_db().await;
        let svc = service(&db);
        let event = insert_event(&db, 0, None, EventStatus::Open).await;
        let member = insert_member(&db, "naomi@example.org").await;
        let now = Utc::now();
        registrations::ActiveModel {
            member_id: Set(member.id),
            event_id: Set(event.id),
            status: Set(RegistrationStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        assert!(matches!(
            svc.delete_event(&admin(), event.id).await,
            Err(AppError::ValidationError(_))
        ));

        let detail = svc.get_event(event.id).await.unwrap();
        assert_eq!(detail.stats.registration_count, 1);
        assert_eq!(detail.stats.confirmed_count, 0);

        let empty = insert_event(&db, 0, None, EventStatus::Draft).await;
        svc.delete_event(&admin(), empty.id).await.unwrap();
        assert!(matches!(
            svc.get_event(empty.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn price_change_moves_registration_statuses() {
        use crate::entities::PaymentMethod;
        use crate::models::RecordPaymentRequest;
        use crate::services::PaymentService;

        let db = setup_db().await;
        let svc = service(&db);
        let payments_svc = PaymentService::new(db.clone(), AuditService::new(db.clone()));
        let event = insert_event(&db, 5_000, None, EventStatus::Open).await;
        let now = Utc::now();
        let mut regs = Vec::new();
        for (email, status) in [
            ("lydia@example.org", RegistrationStatus::Pending),
            ("dorcas@example.org", RegistrationStatus::Cancelled),
        ] {
            let member = insert_member(&db, email).await;
            let reg = registrations::ActiveModel {
                member_id: Set(member.id),
                event_id: Set(event.id),
                status: Set(status),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&db)
            .await
            .unwrap();
            regs.push(reg);
        }

        let paid = payments_svc
            .record_manual_payment(
                &admin(),
                RecordPaymentRequest {
                    registration_id: regs[0].id,
                    amount: rust_decimal::Decimal::from_str("50.00").unwrap(),
                    method: PaymentMethod::Cash,
                    transaction_id: None,
                    notes: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(paid.registration_status, RegistrationStatus::Paid);

        let status_of = |id: i64| {
            let db = db.clone();
            async move {
                registrations::Entity::find_by_id(id)
                    .one(&db)
                    .await
                    .unwrap()
                    .unwrap()
                    .status
            }
        };

        let raise = UpdateEventRequest {
            price: Some(rust_decimal::Decimal::from_str("100.00").unwrap()),
            ..Default::default()
        };
        let updated = svc.update_event(&admin(), event.id, raise).await.unwrap();
        assert_eq!(updated.price.to_string(), "100.00");
        assert_eq!(status_of(regs[0].id).await, RegistrationStatus::Partial);
        assert_eq!(status_of(regs[1].id).await, RegistrationStatus::Cancelled);

        let lower = UpdateEventRequest {
            price: Some(rust_decimal::Decimal::from_str("50.00").unwrap()),
            ..Default::default()
        };
        svc.update_event(&admin(), event.id, lower).await.unwrap();
        assert_eq!(status_of(regs[0].id).await, RegistrationStatus::Paid);

        // non-price edits leave statuses alone
        let rename = UpdateEventRequest {
            name: Some("Spring Retreat".to_string()),
            ..Default::default()
        };
        svc.update_event(&admin(), event.id, rename).await.unwrap();
        assert_eq!(status_of(regs[0].id).await, RegistrationStatus::Paid);
    }
}
