use crate::config::CapacityPolicy;
use crate::entities::{
    EventStatus, MemberStatus, PaymentMethod, RegistrationStatus, event_entity as events,
    member_entity as members, payment_entity as payments, registration_entity as registrations,
};
use crate::error::{AppError, AppResult};
use crate::middlewares::AuthUser;
use crate::models::{
    CreateRegistrationRequest, LeaderPermission, MemberResponse, PaginatedResponse,
    PaginationParams, PublicRegistrationRequest, PublicRegistrationResponse, RegistrationDetail,
    RegistrationQuery, RegistrationResponse, UpdateRegistrationRequest,
};
use crate::services::audit_service::{AuditService, snapshot};
use crate::services::event_leader_service::{ensure_event_permission, has_event_permission};
use crate::services::event_service::count_occupied;
use crate::services::ledger;
use crate::utils::{format_us_phone, normalize_email, optional_field, require_field};
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, IntoActiveModel, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use std::collections::HashMap;

/// Signup form after trimming and validation
#[derive(Debug, Clone)]
struct SignupForm {
    first_name: String,
    last_name: String,
    email: String,
    mobile_phone: String,
    emergency_contact_name: String,
    emergency_contact_phone: String,
    payment_method: Option<PaymentMethod>,
    notes: Option<String>,
}

impl SignupForm {
    fn parse(request: &PublicRegistrationRequest) -> AppResult<Self> {
        Ok(Self {
            first_name: require_field(&request.first_name, "First name is required")?,
            last_name: require_field(&request.last_name, "Last name is required")?,
            email: normalize_email(&request.email)?,
            mobile_phone: format_us_phone(&require_field(
                &request.mobile_phone,
                "Mobile phone is required",
            )?),
            emergency_contact_name: require_field(
                &request.emergency_contact_name,
                "Emergency contact name is required",
            )?,
            emergency_contact_phone: format_us_phone(&require_field(
                &request.emergency_contact_phone,
                "Emergency contact phone is required",
            )?),
            payment_method: request.payment_method,
            notes: optional_field(request.notes.as_deref()),
        })
    }
}

#[derive(Clone)]
pub struct RegistrationService {
    pool: DatabaseConnection,
    capacity_policy: CapacityPolicy,
    audit: AuditService,
}

impl RegistrationService {
    pub fn new(pool: DatabaseConnection, capacity_policy: CapacityPolicy, audit: AuditService) -> Self {
        Self {
            pool,
            capacity_policy,
            audit,
        }
    }

    /// Turn an anonymous signup into a member and a pending registration.
    ///
    /// Steps short-circuit in order: event missing, event not open, event full, already
    /// registered. The event row stays locked from the capacity count until commit, so
    /// signups for one event are serialized; unique indexes on `members.email` and
    /// `(member_id, event_id)` are the final guard against duplicates.
    pub async fn create_public_registration(
        &self,
        event_id: i64,
        request: PublicRegistrationRequest,
    ) -> AppResult<PublicRegistrationResponse> {
        let form = SignupForm::parse(&request)?;
        self.intake(event_id, form, None).await
    }

    /// Leader (or admin) adds someone to an event through the same intake rules.
    pub async fn create_leader_registration(
        &self,
        user: &AuthUser,
        event_id: i64,
        request: PublicRegistrationRequest,
    ) -> AppResult<PublicRegistrationResponse> {
        ensure_event_permission(&self.pool, user, event_id, LeaderPermission::AddRegistrations)
            .await?;
        let form = SignupForm::parse(&request)?;
        self.intake(event_id, form, Some(user.id)).await
    }

    async fn intake(
        &self,
        event_id: i64,
        form: SignupForm,
        actor: Option<i64>,
    ) -> AppResult<PublicRegistrationResponse> {
        let txn = self.pool.begin().await?;

        let event = events::Entity::find_by_id(event_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Event".into()))?;

        if event.status != EventStatus::Open {
            return Err(AppError::RegistrationClosed);
        }

        if event.price_cents > 0 && form.payment_method.is_none() {
            return Err(AppError::ValidationError(
                "Please select a payment method".into(),
            ));
        }

        if let Some(capacity) = event.capacity {
            let occupied = count_occupied(&txn, event.id, self.capacity_policy).await?;
            if occupied >= capacity.max(0) as u64 {
                log::info!("Event {} is full ({occupied}/{capacity})", event.id);
                return Err(AppError::EventFull);
            }
        }

        let member = resolve_member(&txn, &form).await?;

        let already = registrations::Entity::find()
            .filter(registrations::Column::MemberId.eq(member.id))
            .filter(registrations::Column::EventId.eq(event.id))
            .one(&txn)
            .await?;
        if already.is_some() {
            return Err(AppError::AlreadyRegistered);
        }

        let now = Utc::now();
        let am = registrations::ActiveModel {
            member_id: Set(member.id),
            event_id: Set(event.id),
            status: Set(RegistrationStatus::Pending),
            payment_method_preference: Set(form.payment_method),
            notes: Set(form.notes.clone()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let registration = insert_registration(&txn, am, member.id, event.id).await?;

        txn.commit().await?;

        log::info!(
            "Registration {} created for member {} on event {}",
            registration.id,
            member.id,
            event.id
        );
        self.audit
            .record(
                actor,
                "create_registration",
                "registrations",
                registration.id,
                None,
                snapshot(&registration),
            )
            .await;

        Ok(PublicRegistrationResponse {
            registration: registration.into(),
            member_id: member.id,
        })
    }

    pub async fn list_registrations(
        &self,
        query: &RegistrationQuery,
    ) -> AppResult<PaginatedResponse<RegistrationDetail>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut base_query = registrations::Entity::find();
        if let Some(event_id) = query.event_id {
            base_query = base_query.filter(registrations::Column::EventId.eq(event_id));
        }
        if let Some(member_id) = query.member_id {
            base_query = base_query.filter(registrations::Column::MemberId.eq(member_id));
        }
        if let Some(status) = query.status {
            base_query = base_query.filter(registrations::Column::Status.eq(status));
        }

        let total = base_query.clone().count(&self.pool).await?;
        let rows = base_query
            .order_by_desc(registrations::Column::CreatedAt)
            .order_by_desc(registrations::Column::Id)
            .limit(params.per_page)
            .offset(params.offset())
            .all(&self.pool)
            .await?;

        let items = self.details(rows, true).await?;
        Ok(PaginatedResponse::new(items, params, total))
    }

    /// Registrations of one event as seen from the leader portal.
    /// Balances are included only with payment visibility.
    pub async fn list_event_registrations(
        &self,
        user: &AuthUser,
        event_id: i64,
        page: Option<u32>,
        per_page: Option<u32>,
    ) -> AppResult<PaginatedResponse<RegistrationDetail>> {
        ensure_event_permission(&self.pool, user, event_id, LeaderPermission::View).await?;
        let with_balance =
            has_event_permission(&self.pool, user, event_id, LeaderPermission::ViewPayments)
                .await?;

        let params = PaginationParams::new(page, per_page);
        let base_query =
            registrations::Entity::find().filter(registrations::Column::EventId.eq(event_id));

        let total = base_query.clone().count(&self.pool).await?;
        let rows = base_query
            .order_by_asc(registrations::Column::CreatedAt)
            .order_by_asc(registrations::Column::Id)
            .limit(params.per_page)
            .offset(params.offset())
            .all(&self.pool)
            .await?;

        let items = self.details(rows, with_balance).await?;
        Ok(PaginatedResponse::new(items, params, total))
    }

    pub async fn get_registration(&self, registration_id: i64) -> AppResult<RegistrationDetail> {
        let registration = self.find_registration(registration_id).await?;
        let mut details = self.details(vec![registration], true).await?;
        details
            .pop()
            .ok_or_else(|| AppError::NotFound("Registration".into()))
    }

    /// Manual entry by an administrator; capacity is not enforced here.
    pub async fn create_registration(
        &self,
        user: &AuthUser,
        request: CreateRegistrationRequest,
    ) -> AppResult<RegistrationResponse> {
        members::Entity::find_by_id(request.member_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Member".into()))?;
        events::Entity::find_by_id(request.event_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Event".into()))?;

        let now = Utc::now();
        let am = registrations::ActiveModel {
            member_id: Set(request.member_id),
            event_id: Set(request.event_id),
            status: Set(request.status.unwrap_or(RegistrationStatus::Pending)),
            payment_method_preference: Set(request.payment_method_preference),
            notes: Set(optional_field(request.notes.as_deref())),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let registration =
            insert_registration(&self.pool, am, request.member_id, request.event_id).await?;

        self.audit
            .record(
                Some(user.id),
                "create_registration",
                "registrations",
                registration.id,
                None,
                snapshot(&registration),
            )
            .await;

        Ok(registration.into())
    }

    /// Approval, cancellation, waitlisting and notes
    pub async fn update_registration(
        &self,
        user: &AuthUser,
        registration_id: i64,
        request: UpdateRegistrationRequest,
    ) -> AppResult<RegistrationResponse> {
        let registration = self.find_registration(registration_id).await?;
        let old = snapshot(&registration);

        let mut am = registration.into_active_model();
        if let Some(status) = request.status {
            am.status = Set(status);
        }
        if let Some(notes) = request.notes {
            am.notes = Set(optional_field(Some(&notes)));
        }
        am.updated_at = Set(Utc::now());
        let updated = am.update(&self.pool).await?;

        self.audit
            .record(
                Some(user.id),
                "update_registration",
                "registrations",
                registration_id,
                old,
                snapshot(&updated),
            )
            .await;

        Ok(updated.into())
    }

    pub async fn delete_registration(&self, user: &AuthUser, registration_id: i64) -> AppResult<()> {
        let registration = self.find_registration(registration_id).await?;

        let payment_count = payments::Entity::find()
            .filter(payments::Column::RegistrationId.eq(registration_id))
            .count(&self.pool)
            .await?;
        if payment_count > 0 {
            return Err(AppError::ValidationError(
                "Cannot delete a registration with recorded payments".into(),
            ));
        }

        let old = snapshot(&registration);
        registration.delete(&self.pool).await?;

        self.audit
            .record(
                Some(user.id),
                "delete_registration",
                "registrations",
                registration_id,
                old,
                None,
            )
            .await;
        Ok(())
    }

    async fn find_registration(&self, registration_id: i64) -> AppResult<registrations::Model> {
        registrations::Entity::find_by_id(registration_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Registration".into()))
    }

    /// Attach member, event name and (optionally) balance with one query per table.
    async fn details(
        &self,
        rows: Vec<registrations::Model>,
        with_balance: bool,
    ) -> AppResult<Vec<RegistrationDetail>> {
        let member_ids: Vec<i64> = rows.iter().map(|r| r.member_id).collect();
        let event_ids: Vec<i64> = rows.iter().map(|r| r.event_id).collect();
        let registration_ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

        let member_map: HashMap<i64, members::Model> = members::Entity::find()
            .filter(members::Column::Id.is_in(member_ids))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();
        let event_map: HashMap<i64, events::Model> = events::Entity::find()
            .filter(events::Column::Id.is_in(event_ids))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|e| (e.id, e))
            .collect();

        let mut amounts: HashMap<i64, Vec<i64>> = HashMap::new();
        if with_balance {
            for (registration_id, amount) in
                ledger::load_amounts_for(&self.pool, &registration_ids).await?
            {
                amounts.entry(registration_id).or_default().push(amount);
            }
        }

        let details = rows
            .into_iter()
            .map(|registration| {
                let event = event_map.get(&registration.event_id);
                let balance = match (with_balance, event) {
                    (true, Some(event)) => Some(
                        ledger::compute_balance(
                            event.price_cents,
                            amounts.remove(&registration.id).unwrap_or_default(),
                        )
                        .to_response(registration.id),
                    ),
                    _ => None,
                };
                RegistrationDetail {
                    member: member_map
                        .get(&registration.member_id)
                        .cloned()
                        .map(MemberResponse::from),
                    event_name: event.map(|e| e.name.clone()).unwrap_or_default(),
                    balance,
                    registration: registration.into(),
                }
            })
            .collect();
        Ok(details)
    }
}

/// Reuse the member with this email (refreshing contact details) or create a visitor.
async fn resolve_member(txn: &DatabaseTransaction, form: &SignupForm) -> AppResult<members::Model> {
    let now = Utc::now();

    if let Some(existing) = find_member_by_email(txn, &form.email).await? {
        let mut am = existing.into_active_model();
        am.emergency_contact_name = Set(Some(form.emergency_contact_name.clone()));
        am.emergency_contact_phone = Set(Some(form.emergency_contact_phone.clone()));
        am.updated_at = Set(now);
        return Ok(am.update(txn).await?);
    }

    let am = members::ActiveModel {
        first_name: Set(form.first_name.clone()),
        last_name: Set(form.last_name.clone()),
        email: Set(Some(form.email.clone())),
        mobile_phone: Set(Some(form.mobile_phone.clone())),
        emergency_contact_name: Set(Some(form.emergency_contact_name.clone())),
        emergency_contact_phone: Set(Some(form.emergency_contact_phone.clone())),
        member_status: Set(MemberStatus::Visitor),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    // a concurrent signup with the same email may have inserted first
    members::Entity::insert(am)
        .on_conflict(
            OnConflict::column(members::Column::Email)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(txn)
        .await?;

    find_member_by_email(txn, &form.email)
        .await?
        .ok_or_else(|| AppError::InternalError("Member vanished after insert".into()))
}

async fn find_member_by_email<C>(conn: &C, email: &str) -> AppResult<Option<members::Model>>
where
    C: ConnectionTrait,
{
    Ok(members::Entity::find()
        .filter(members::Column::Email.eq(email))
        .one(conn)
        .await?)
}

/// Insert guarded by the `(member_id, event_id)` unique index; a conflict is `AlreadyRegistered`.
async fn insert_registration<C>(
    conn: &C,
    am: registrations::ActiveModel,
    member_id: i64,
    event_id: i64,
) -> AppResult<registrations::Model>
where
    C: ConnectionTrait,
{
    let inserted = registrations::Entity::insert(am)
        .on_conflict(
            OnConflict::columns([
                registrations::Column::MemberId,
                registrations::Column::EventId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    if inserted == 0 {
        return Err(AppError::AlreadyRegistered);
    }

    registrations::Entity::find()
        .filter(registrations::Column::MemberId.eq(member_id))
        .filter(registrations::Column::EventId.eq(event_id))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::InternalError("Registration vanished after insert".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::{admin, insert_event, insert_member, leader, setup_db};
    use crate::models::AssignLeaderRequest;
    use crate::services::EventLeaderService;

    fn service(db: &DatabaseConnection) -> RegistrationService {
        RegistrationService::new(db.clone(), CapacityPolicy::Reserved, AuditService::new(db.clone()))
    }

    fn signup(email: &str) -> PublicRegistrationRequest {
        PublicRegistrationRequest {
            first_name: "Lydia".into(),
            last_name: "Purple".into(),
            email: email.into(),
            mobile_phone: "(555) 010-2030".into(),
            emergency_contact_name: "Thyatira Contact".into(),
            emergency_contact_phone: "555-010-9999".into(),
            payment_method: Some(PaymentMethod::Cash),
            notes: None,
            turnstile_token: None,
        }
    }

    #[tokio::test]
    async fn signup_creates_visitor_and_pending_registration() {
        let db = setup_db().await;
        let event = insert_event(&db, 5_000, Some(10), EventStatus::Open).await;

        let result = service(&db)
            .create_public_registration(event.id, signup(" lydia@example.org "))
            .await
            .unwrap();

        assert_eq!(result.registration.status, RegistrationStatus::Pending);
        assert_eq!(
            result.registration.payment_method_preference,
            Some(PaymentMethod::Cash)
        );
        let member = members::Entity::find_by_id(result.member_id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(member.member_status, MemberStatus::Visitor);
        assert_eq!(member.email.as_deref(), Some("lydia@example.org"));
        assert_eq!(member.mobile_phone.as_deref(), Some("+15550102030"));
        assert_eq!(payments::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn existing_member_is_reused_and_contact_refreshed() {
        let db = setup_db().await;
        let event = insert_event(&db, 0, None, EventStatus::Open).await;
        let existing = insert_member(&db, "lydia@example.org").await;

        let mut request = signup("lydia@example.org");
        request.payment_method = None;
        let result = service(&db)
            .create_public_registration(event.id, request)
            .await
            .unwrap();

        assert_eq!(result.member_id, existing.id);
        let member = members::Entity::find_by_id(existing.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(member.member_status, MemberStatus::Member);
        assert_eq!(
            member.emergency_contact_name.as_deref(),
            Some("Thyatira Contact")
        );
        assert_eq!(members::Entity::find().count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn second_signup_with_same_email_is_rejected_without_writes() {
        let db = setup_db().await;
        let event = insert_event(&db, 5_000, None, EventStatus::Open).await;
        let svc = service(&db);

        svc.create_public_registration(event.id, signup("lydia@example.org"))
            .await
            .unwrap();
        let before = members::Entity::find().all(&db).await.unwrap();

        let mut again = signup("lydia@example.org");
        again.emergency_contact_name = "Someone Else".into();
        let err = svc
            .create_public_registration(event.id, again)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::AlreadyRegistered));
        assert_eq!(registrations::Entity::find().count(&db).await.unwrap(), 1);
        assert_eq!(members::Entity::find().all(&db).await.unwrap(), before);
    }

    // The single pooled SQLite connection serializes the two transactions, so this checks the
    // count-then-insert sequence end to end. SQLite drops `FOR UPDATE`; the event row lock
    // itself only takes effect on Postgres.
    #[tokio::test]
    async fn concurrent_signups_for_last_slot_admit_exactly_one() {
        let db = setup_db().await;
        let event = insert_event(&db, 5_000, Some(1), EventStatus::Open).await;
        let svc = service(&db);

        let (a, b) = tokio::join!(
            svc.create_public_registration(event.id, signup("first@example.org")),
            svc.create_public_registration(event.id, signup("second@example.org")),
        );

        let outcomes = [a, b];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            outcomes
                .iter()
                .filter(|r| matches!(r, Err(AppError::EventFull)))
                .count(),
            1
        );
        assert_eq!(registrations::Entity::find().count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn confirmed_only_policy_ignores_pending_registrations() {
        let db = setup_db().await;
        let event = insert_event(&db, 5_000, Some(1), EventStatus::Open).await;
        let svc = RegistrationService::new(
            db.clone(),
            CapacityPolicy::ConfirmedOnly,
            AuditService::new(db.clone()),
        );

        let first = svc
            .create_public_registration(event.id, signup("first@example.org"))
            .await
            .unwrap();
        svc.create_public_registration(event.id, signup("second@example.org"))
            .await
            .unwrap();

        svc.update_registration(
            &admin(),
            first.registration.id,
            UpdateRegistrationRequest {
                status: Some(RegistrationStatus::Confirmed),
                notes: None,
            },
        )
        .await
        .unwrap();

        assert!(matches!(
            svc.create_public_registration(event.id, signup("third@example.org"))
                .await,
            Err(AppError::EventFull)
        ));
    }

    #[tokio::test]
    async fn intake_failure_modes() {
        let db = setup_db().await;
        let svc = service(&db);
        let closed = insert_event(&db, 5_000, None, EventStatus::Closed).await;
        let open = insert_event(&db, 5_000, None, EventStatus::Open).await;

        assert!(matches!(
            svc.create_public_registration(9_999, signup("a@example.org")).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            svc.create_public_registration(closed.id, signup("a@example.org")).await,
            Err(AppError::RegistrationClosed)
        ));

        let mut no_method = signup("a@example.org");
        no_method.payment_method = None;
        assert!(matches!(
            svc.create_public_registration(open.id, no_method).await,
            Err(AppError::ValidationError(_))
        ));

        let mut bad_email = signup("not-an-email");
        bad_email.email = "not-an-email".into();
        assert!(matches!(
            svc.create_public_registration(open.id, bad_email).await,
            Err(AppError::ValidationError(_))
        ));

        let mut no_contact = signup("a@example.org");
        no_contact.emergency_contact_phone = "  ".into();
        assert!(matches!(
            svc.create_public_registration(open.id, no_contact).await,
            Err(AppError::ValidationError(_))
        ));

        assert_eq!(members::Entity::find().count(&db).await.unwrap(), 0);
        assert_eq!(registrations::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn admin_entry_rejects_duplicate_pair() {
        let db = setup_db().await;
        let svc = service(&db);
        let event = insert_event(&db, 5_000, Some(1), EventStatus::Draft).await;
        let member = insert_member(&db, "ruth@example.org").await;

        let request = || CreateRegistrationRequest {
            member_id: member.id,
            event_id: event.id,
            status: Some(RegistrationStatus::Confirmed),
            payment_method_preference: None,
            notes: Some("  ".into()),
        };

        let created = svc.create_registration(&admin(), request()).await.unwrap();
        assert_eq!(created.status, RegistrationStatus::Confirmed);
        assert_eq!(created.notes, None);

        assert!(matches!(
            svc.create_registration(&admin(), request()).await,
            Err(AppError::AlreadyRegistered)
        ));

        let detail = svc.get_registration(created.id).await.unwrap();
        assert_eq!(detail.event_name, "Youth Retreat");
        assert_eq!(
            detail.balance.map(|b| b.balance_due.to_string()),
            Some("50.00".to_string())
        );

        svc.delete_registration(&admin(), created.id).await.unwrap();
        assert_eq!(registrations::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn leader_view_hides_balances_without_payment_permission() {
        let db = setup_db().await;
        let audit = AuditService::new(db.clone());
        let svc = service(&db);
        let leaders = EventLeaderService::new(db.clone(), audit);
        let event = insert_event(&db, 5_000, None, EventStatus::Open).await;

        leaders
            .assign_leader(
                &admin(),
                event.id,
                AssignLeaderRequest {
                    user_id: 5,
                    can_view: Some(true),
                    can_add_registrations: Some(true),
                    can_record_payments: Some(false),
                    can_view_payments: Some(false),
                },
            )
            .await
            .unwrap();

        let lead = leader(5);
        svc.create_leader_registration(&lead, event.id, signup("walkin@example.org"))
            .await
            .unwrap();

        let page = svc
            .list_event_registrations(&lead, event.id, None, None)
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert!(page.items[0].balance.is_none());

        let page = svc
            .list_event_registrations(&admin(), event.id, None, None)
            .await
            .unwrap();
        assert!(page.items[0].balance.is_some());

        assert!(matches!(
            svc.list_event_registrations(&leader(6), event.id, None, None)
                .await,
            Err(AppError::Forbidden)
        ));
    }
}
