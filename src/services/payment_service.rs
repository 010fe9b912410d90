use crate::entities::{
    PaymentMethod, event_entity as events, payment_entity as payments,
    registration_entity as registrations,
};
use crate::error::{AppError, AppResult};
use crate::middlewares::AuthUser;
use crate::models::{
    BalanceResponse, ExternalPaymentResponse, LeaderPermission, PaginatedResponse,
    PaginationParams, PaymentQuery, PaymentResponse, ReconcileReport, RecordPaymentRequest,
    RecordPaymentResponse,
};
use crate::services::audit_service::{AuditService, snapshot};
use crate::services::event_leader_service::ensure_event_permission;
use crate::services::ledger;
use crate::utils::{optional_field, payment_cents, to_decimal};
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

/// Registration row locked for the rest of the transaction
async fn lock_registration<C>(conn: &C, registration_id: i64) -> AppResult<registrations::Model>
where
    C: ConnectionTrait,
{
    registrations::Entity::find_by_id(registration_id)
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Registration".into()))
}

async fn find_event<C>(conn: &C, event_id: i64) -> AppResult<events::Model>
where
    C: ConnectionTrait,
{
    events::Entity::find_by_id(event_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Event".into()))
}

#[derive(Clone)]
pub struct PaymentService {
    pool: DatabaseConnection,
    audit: AuditService,
}

impl PaymentService {
    pub fn new(pool: DatabaseConnection, audit: AuditService) -> Self {
        Self { pool, audit }
    }

    /// Record a cash/check/etc. payment entered by staff.
    ///
    /// Overpayment is accepted and reported as a warning. The payment insert and the
    /// status reconciliation commit together.
    pub async fn record_manual_payment(
        &self,
        user: &AuthUser,
        request: RecordPaymentRequest,
    ) -> AppResult<RecordPaymentResponse> {
        let amount_cents = payment_cents(request.amount)?;
        if request.method == PaymentMethod::Stripe {
            return Err(AppError::ValidationError(
                "Card payments are recorded automatically by the payment processor".into(),
            ));
        }

        let txn = self.pool.begin().await?;

        let registration = lock_registration(&txn, request.registration_id).await?;
        ensure_event_permission(
            &txn,
            user,
            registration.event_id,
            LeaderPermission::RecordPayments,
        )
        .await?;
        let event = find_event(&txn, registration.event_id).await?;

        let before = ledger::registration_balance(&txn, registration.id, event.price_cents).await?;
        let warning = (amount_cents > before.balance_due_cents).then(|| {
            format!(
                "Payment of ${} exceeds the balance due of ${}",
                to_decimal(amount_cents),
                to_decimal(before.balance_due_cents)
            )
        });

        let payment = payments::ActiveModel {
            registration_id: Set(registration.id),
            amount_cents: Set(amount_cents),
            method: Set(request.method),
            transaction_id: Set(optional_field(request.transaction_id.as_deref())),
            external_payment_id: Set(None),
            notes: Set(optional_field(request.notes.as_deref())),
            recorded_by: Set(Some(user.id)),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let registration =
            ledger::reconcile_registration(&txn, registration, event.price_cents).await?;
        let after = ledger::registration_balance(&txn, registration.id, event.price_cents).await?;

        txn.commit().await?;

        if let Some(w) = &warning {
            log::warn!("Registration {}: {w}", registration.id);
        }
        log::info!(
            "Payment {} of {} cents recorded on registration {} by user {}",
            payment.id,
            amount_cents,
            registration.id,
            user.id
        );
        self.audit
            .record(
                Some(user.id),
                "record_payment",
                "payments",
                payment.id,
                None,
                snapshot(&payment),
            )
            .await;

        Ok(RecordPaymentResponse {
            payment: payment.into(),
            balance: after.to_response(registration.id),
            registration_status: registration.status,
            warning,
        })
    }

    /// Record a processor-confirmed payment; at most one row per `external_payment_id`.
    ///
    /// A replay fails with `DuplicateExternalPayment` and leaves everything untouched.
    pub async fn process_external_payment(
        &self,
        registration_id: i64,
        external_payment_id: &str,
        amount_cents: i64,
    ) -> AppResult<ExternalPaymentResponse> {
        let external_payment_id = external_payment_id.trim();
        if external_payment_id.is_empty() {
            return Err(AppError::ValidationError(
                "External payment id is required".into(),
            ));
        }
        if amount_cents <= 0 {
            return Err(AppError::InvalidAmount(
                "Payment amount must be greater than 0".into(),
            ));
        }

        let txn = self.pool.begin().await?;

        let registration = lock_registration(&txn, registration_id).await?;

        let seen = payments::Entity::find()
            .filter(payments::Column::ExternalPaymentId.eq(external_payment_id))
            .count(&txn)
            .await?;
        if seen > 0 {
            return Err(AppError::DuplicateExternalPayment(
                external_payment_id.to_string(),
            ));
        }

        let am = payments::ActiveModel {
            registration_id: Set(registration.id),
            amount_cents: Set(amount_cents),
            method: Set(PaymentMethod::Stripe),
            transaction_id: Set(None),
            external_payment_id: Set(Some(external_payment_id.to_string())),
            notes: Set(Some("Online card payment".to_string())),
            recorded_by: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let inserted = payments::Entity::insert(am)
            .on_conflict(
                OnConflict::column(payments::Column::ExternalPaymentId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;
        if inserted == 0 {
            return Err(AppError::DuplicateExternalPayment(
                external_payment_id.to_string(),
            ));
        }

        let payment = payments::Entity::find()
            .filter(payments::Column::ExternalPaymentId.eq(external_payment_id))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::InternalError("Payment vanished after insert".into()))?;

        let event = find_event(&txn, registration.event_id).await?;
        let registration =
            ledger::reconcile_registration(&txn, registration, event.price_cents).await?;

        txn.commit().await?;

        log::info!(
            "External payment {external_payment_id} ({amount_cents} cents) applied to registration {}",
            registration.id
        );
        self.audit
            .record(
                None,
                "external_payment",
                "payments",
                payment.id,
                None,
                snapshot(&payment),
            )
            .await;

        Ok(ExternalPaymentResponse {
            payment: payment.into(),
            registration_status: registration.status,
        })
    }

    /// Remove a manually entered payment and reconcile. Processor payments are refunded
    /// through the processor instead.
    pub async fn delete_payment(&self, user: &AuthUser, payment_id: i64) -> AppResult<BalanceResponse> {
        let txn = self.pool.begin().await?;

        let payment = payments::Entity::find_by_id(payment_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment".into()))?;
        if payment.is_external() || payment.method == PaymentMethod::Stripe {
            return Err(AppError::ImmutablePaymentDeletion);
        }

        let registration = lock_registration(&txn, payment.registration_id).await?;
        let event = find_event(&txn, registration.event_id).await?;

        let old = snapshot(&payment);
        payment.delete(&txn).await?;

        let registration =
            ledger::reconcile_registration(&txn, registration, event.price_cents).await?;
        let balance = ledger::registration_balance(&txn, registration.id, event.price_cents).await?;

        txn.commit().await?;

        log::info!("Payment {payment_id} deleted by user {}", user.id);
        self.audit
            .record(Some(user.id), "delete_payment", "payments", payment_id, old, None)
            .await;

        Ok(balance.to_response(registration.id))
    }

    /// Balance computed from the payment rows at read time
    pub async fn get_registration_balance(&self, registration_id: i64) -> AppResult<BalanceResponse> {
        let registration = registrations::Entity::find_by_id(registration_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Registration".into()))?;
        let event = find_event(&self.pool, registration.event_id).await?;
        let balance =
            ledger::registration_balance(&self.pool, registration.id, event.price_cents).await?;
        Ok(balance.to_response(registration.id))
    }

    pub async fn list_payments(
        &self,
        query: &PaymentQuery,
    ) -> AppResult<PaginatedResponse<PaymentResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut base_query = payments::Entity::find();
        if let Some(registration_id) = query.registration_id {
            base_query = base_query.filter(payments::Column::RegistrationId.eq(registration_id));
        }
        if let Some(event_id) = query.event_id {
            base_query = base_query
                .inner_join(registrations::Entity)
                .filter(registrations::Column::EventId.eq(event_id));
        }

        let total = base_query.clone().count(&self.pool).await?;
        let rows = base_query
            .order_by_desc(payments::Column::CreatedAt)
            .order_by_desc(payments::Column::Id)
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

    /// Recompute every registration status of an event from its payments.
    pub async fn reconcile_event(&self, event_id: i64) -> AppResult<ReconcileReport> {
        let event = find_event(&self.pool, event_id).await?;
        let registration_ids: Vec<i64> = registrations::Entity::find()
            .select_only()
            .column(registrations::Column::Id)
            .filter(registrations::Column::EventId.eq(event_id))
            .into_tuple()
            .all(&self.pool)
            .await?;

        let mut report = ReconcileReport::default();
        for registration_id in registration_ids {
            let txn = self.pool.begin().await?;
            let registration = lock_registration(&txn, registration_id).await?;
            let before = registration.status;
            let after = ledger::reconcile_registration(&txn, registration, event.price_cents).await?;
            txn.commit().await?;

            report.examined += 1;
            if after.status != before {
                report.corrected += 1;
                log::info!(
                    "Reconciled registration {registration_id}: {before} -> {}",
                    after.status
                );
            }
        }
        Ok(report)
    }

    pub async fn reconcile_all(&self) -> AppResult<ReconcileReport> {
        let event_ids: Vec<i64> = events::Entity::find()
            .select_only()
            .column(events::Column::Id)
            .into_tuple()
            .all(&self.pool)
            .await?;

        let mut total = ReconcileReport::default();
        for event_id in event_ids {
            let report = self.reconcile_event(event_id).await?;
            total.examined += report.examined;
            total.corrected += report.corrected;
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::{admin, insert_event, insert_member, leader, setup_db};
    use crate::entities::{EventStatus, RegistrationStatus};
    use crate::models::{AssignLeaderRequest, PaymentStatus};
    use crate::services::EventLeaderService;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    async fn registration_for(db: &DatabaseConnection, price_cents: i64) -> registrations::Model {
        let event = insert_event(db, price_cents, None, EventStatus::Open).await;
        let member = insert_member(db, &format!("{}@example.org", uuid::Uuid::new_v4())).await;
        let now = Utc::now();
        registrations::ActiveModel {
            member_id: Set(member.id),
            event_id: Set(event.id),
            status: Set(RegistrationStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    fn cash(registration_id: i64, amount: &str) -> RecordPaymentRequest {
        RecordPaymentRequest {
            registration_id,
            amount: Decimal::from_str(amount).unwrap(),
            method: PaymentMethod::Cash,
            transaction_id: None,
            notes: None,
        }
    }

    fn service(db: &DatabaseConnection) -> PaymentService {
        PaymentService::new(db.clone(), AuditService::new(db.clone()))
    }

    async fn status_of(db: &DatabaseConnection, id: i64) -> RegistrationStatus {
        registrations::Entity::find_by_id(id)
            .one(db)
            .await
            .unwrap()
            .unwrap()
            .status
    }

    #[tokio::test]
    async fn non_positive_amounts_write_nothing() {
        let db = setup_db().await;
        let svc = service(&db);
        let reg = registration_for(&db, 10_000).await;

        for amount in ["0", "-5.00", "0.001"] {
            assert!(matches!(
                svc.record_manual_payment(&admin(), cash(reg.id, amount)).await,
                Err(AppError::InvalidAmount(_))
            ));
        }
        assert_eq!(payments::Entity::find().count(&db).await.unwrap(), 0);
        assert_eq!(status_of(&db, reg.id).await, RegistrationStatus::Pending);
    }

    #[tokio::test]
    async fn forty_then_sixty_moves_pending_to_partial_to_paid() {
        let db = setup_db().await;
        let svc = service(&db);
        let reg = registration_for(&db, 10_000).await;

        let first = svc
            .record_manual_payment(&admin(), cash(reg.id, "40.00"))
            .await
            .unwrap();
        assert_eq!(first.registration_status, RegistrationStatus::Partial);
        assert_eq!(first.balance.balance_due.to_string(), "60.00");
        assert_eq!(first.payment.recorded_by, Some(1));
        assert!(first.warning.is_none());

        let second = svc
            .record_manual_payment(&admin(), cash(reg.id, "60.00"))
            .await
            .unwrap();
        assert_eq!(second.registration_status, RegistrationStatus::Paid);

        let balance = svc.get_registration_balance(reg.id).await.unwrap();
        assert_eq!(balance.total_paid.to_string(), "100.00");
        assert_eq!(balance.balance_due.to_string(), "0.00");
        assert_eq!(balance.payment_count, 2);
        assert_eq!(balance.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn overpayment_is_accepted_with_warning() {
        let db = setup_db().await;
        let svc = service(&db);
        let reg = registration_for(&db, 5_000).await;

        let result = svc
            .record_manual_payment(&admin(), cash(reg.id, "75.00"))
            .await
            .unwrap();
        assert!(result.warning.is_some());
        assert_eq!(result.balance.payment_status, PaymentStatus::Overpaid);
        assert_eq!(result.balance.balance_due.to_string(), "-25.00");
        assert_eq!(result.registration_status, RegistrationStatus::Paid);
    }

    #[tokio::test]
    async fn manual_stripe_method_is_rejected() {
        let db = setup_db().await;
        let svc = service(&db);
        let reg = registration_for(&db, 5_000).await;
        let mut request = cash(reg.id, "10.00");
        request.method = PaymentMethod::Stripe;

        assert!(matches!(
            svc.record_manual_payment(&admin(), request).await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            svc.record_manual_payment(&admin(), cash(424_242, "10.00")).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn replayed_external_payment_is_recorded_once() {
        let db = setup_db().await;
        let svc = service(&db);
        let reg = registration_for(&db, 10_000).await;

        let first = svc
            .process_external_payment(reg.id, "pi_123", 2_000)
            .await
            .unwrap();
        assert_eq!(first.registration_status, RegistrationStatus::Partial);
        assert_eq!(first.payment.recorded_by, None);

        let replay = svc.process_external_payment(reg.id, "pi_123", 2_000).await;
        assert!(matches!(replay, Err(AppError::DuplicateExternalPayment(id)) if id == "pi_123"));

        assert_eq!(payments::Entity::find().count(&db).await.unwrap(), 1);
        let balance = svc.get_registration_balance(reg.id).await.unwrap();
        assert_eq!(balance.total_paid.to_string(), "20.00");
        assert_eq!(status_of(&db, reg.id).await, RegistrationStatus::Partial);
    }

    #[tokio::test]
    async fn external_payments_cannot_be_deleted() {
        let db = setup_db().await;
        let svc = service(&db);
        let reg = registration_for(&db, 10_000).await;

        let external = svc
            .process_external_payment(reg.id, "pi_abc", 10_000)
            .await
            .unwrap();
        assert!(matches!(
            svc.delete_payment(&admin(), external.payment.id).await,
            Err(AppError::ImmutablePaymentDeletion)
        ));
        assert_eq!(payments::Entity::find().count(&db).await.unwrap(), 1);
        assert_eq!(status_of(&db, reg.id).await, RegistrationStatus::Paid);
    }

    #[tokio::test]
    async fn deleting_manual_payment_reconciles_back() {
        let db = setup_db().await;
        let svc = service(&db);
        let reg = registration_for(&db, 10_000).await;

        let paid = svc
            .record_manual_payment(&admin(), cash(reg.id, "100.00"))
            .await
            .unwrap();
        assert_eq!(paid.registration_status, RegistrationStatus::Paid);

        let balance = svc.delete_payment(&admin(), paid.payment.id).await.unwrap();
        assert_eq!(balance.payment_status, PaymentStatus::Unpaid);
        assert_eq!(status_of(&db, reg.id).await, RegistrationStatus::Pending);
        assert!(matches!(
            svc.delete_payment(&admin(), paid.payment.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn cancelled_registration_keeps_its_status() {
        let db = setup_db().await;
        let svc = service(&db);
        let reg = registration_for(&db, 10_000).await;
        let mut am: registrations::ActiveModel = reg.clone().into();
        am.status = Set(RegistrationStatus::Cancelled);
        am.update(&db).await.unwrap();

        let result = svc
            .record_manual_payment(&admin(), cash(reg.id, "100.00"))
            .await
            .unwrap();
        assert_eq!(result.registration_status, RegistrationStatus::Cancelled);
        assert_eq!(result.balance.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn leaders_need_payment_permission() {
        let db = setup_db().await;
        let svc = service(&db);
        let leaders = EventLeaderService::new(db.clone(), AuditService::new(db.clone()));
        let reg = registration_for(&db, 10_000).await;

        assert!(matches!(
            svc.record_manual_payment(&leader(3), cash(reg.id, "10.00")).await,
            Err(AppError::Forbidden)
        ));

        leaders
            .assign_leader(
                &admin(),
                reg.event_id,
                AssignLeaderRequest {
                    user_id: 3,
                    can_view: None,
                    can_add_registrations: None,
                    can_record_payments: Some(true),
                    can_view_payments: None,
                },
            )
            .await
            .unwrap();

        let result = svc
            .record_manual_payment(&leader(3), cash(reg.id, "10.00"))
            .await
            .unwrap();
        assert_eq!(result.payment.recorded_by, Some(3));
        assert_eq!(payments::Entity::find().count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn reconcile_corrects_drifted_statuses() {
        let db = setup_db().await;
        let svc = service(&db);
        let reg = registration_for(&db, 10_000).await;
        svc.record_manual_payment(&admin(), cash(reg.id, "40.00"))
            .await
            .unwrap();

        // simulate drift from an out-of-band edit
        let current = registrations::Entity::find_by_id(reg.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        let mut am: registrations::ActiveModel = current.into();
        am.status = Set(RegistrationStatus::Paid);
        am.update(&db).await.unwrap();

        let report = svc.reconcile_all().await.unwrap();
        assert_eq!(report.examined, 1);
        assert_eq!(report.corrected, 1);
        assert_eq!(status_of(&db, reg.id).await, RegistrationStatus::Partial);

        let again = svc.reconcile_event(reg.event_id).await.unwrap();
        assert_eq!(again.corrected, 0);

        let page = svc
            .list_payments(&PaymentQuery {
                event_id: Some(reg.event_id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].amount.to_string(), "40.00");
    }
}
