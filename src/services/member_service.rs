use crate::entities::{
    MemberStatus, member_entity as members, registration_entity as registrations,
};
use crate::error::{AppError, AppResult};
use crate::middlewares::AuthUser;
use crate::models::{
    CreateMemberRequest, MemberQuery, MemberResponse, PaginatedResponse, PaginationParams,
    UpdateMemberRequest,
};
use crate::services::audit_service::{AuditService, snapshot};
use crate::utils::{format_us_phone, normalize_email, optional_field, require_field};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, IntoActiveModel, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, SqlErr,
};

fn duplicate_email() -> AppError {
    AppError::ValidationError("A member with this email already exists".into())
}

/// The unique index on `members.email` is the final word when two writes race.
fn map_write_error(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => duplicate_email(),
        _ => e.into(),
    }
}

/// Blank clears the email; anything else must be a valid address.
fn member_email(email: Option<&str>) -> AppResult<Option<String>> {
    match optional_field(email) {
        Some(email) => Ok(Some(normalize_email(&email)?)),
        None => Ok(None),
    }
}

fn member_phone(phone: Option<&str>) -> Option<String> {
    optional_field(phone).map(|p| format_us_phone(&p))
}

async fn email_taken<C>(conn: &C, email: &str, except_id: Option<i64>) -> AppResult<bool>
where
    C: ConnectionTrait,
{
    let mut query = members::Entity::find().filter(members::Column::Email.eq(email));
    if let Some(id) = except_id {
        query = query.filter(members::Column::Id.ne(id));
    }
    Ok(query.count(conn).await? > 0)
}

#[derive(Clone)]
pub struct MemberService {
    pool: DatabaseConnection,
    audit: AuditService,
}

impl MemberService {
    pub fn new(pool: DatabaseConnection, audit: AuditService) -> Self {
        Self { pool, audit }
    }

    pub async fn list_members(
        &self,
        query: &MemberQuery,
    ) -> AppResult<PaginatedResponse<MemberResponse>> {
        let params = PaginationParams::new(query.page, query.per_page);

        let mut base_query = members::Entity::find();
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            base_query = base_query.filter(
                Condition::any()
                    .add(members::Column::FirstName.contains(search))
                    .add(members::Column::LastName.contains(search))
                    .add(members::Column::Email.contains(search)),
            );
        }
        if let Some(status) = query.status {
            base_query = base_query.filter(members::Column::MemberStatus.eq(status));
        }

        let total = base_query.clone().count(&self.pool).await?;
        let rows = base_query
            .order_by_asc(members::Column::LastName)
            .order_by_asc(members::Column::FirstName)
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

    pub async fn get_member(&self, member_id: i64) -> AppResult<MemberResponse> {
        self.find_member(member_id).await.map(Into::into)
    }

    pub async fn create_member(
        &self,
        user: &AuthUser,
        request: CreateMemberRequest,
    ) -> AppResult<MemberResponse> {
        let first_name = require_field(&request.first_name, "First name is required")?;
        let last_name = require_field(&request.last_name, "Last name is required")?;
        let email = member_email(request.email.as_deref())?;
        if let Some(email) = &email
            && email_taken(&self.pool, email, None).await?
        {
            return Err(duplicate_email());
        }

        let now = Utc::now();
        let member = members::ActiveModel {
            first_name: Set(first_name),
            last_name: Set(last_name),
            email: Set(email),
            mobile_phone: Set(member_phone(request.mobile_phone.as_deref())),
            emergency_contact_name: Set(optional_field(request.emergency_contact_name.as_deref())),
            emergency_contact_phone: Set(member_phone(request.emergency_contact_phone.as_deref())),
            member_status: Set(request.member_status.unwrap_or(MemberStatus::Visitor)),
            notes: Set(optional_field(request.notes.as_deref())),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await
        .map_err(map_write_error)?;

        log::info!("Member {} created by user {}", member.id, user.id);
        self.audit
            .record(Some(user.id), "create_member", "members", member.id, None, snapshot(&member))
            .await;

        Ok(member.into())
    }

    pub async fn update_member(
        &self,
        user: &AuthUser,
        member_id: i64,
        request: UpdateMemberRequest,
    ) -> AppResult<MemberResponse> {
        let member = self.find_member(member_id).await?;
        let old = snapshot(&member);
        let mut am = member.into_active_model();

        if let Some(first_name) = request.first_name {
            am.first_name = Set(require_field(&first_name, "First name is required")?);
        }
        if let Some(last_name) = request.last_name {
            am.last_name = Set(require_field(&last_name, "Last name is required")?);
        }
        if let Some(email) = request.email {
            let email = member_email(Some(&email))?;
            if let Some(email) = &email
                && email_taken(&self.pool, email, Some(member_id)).await?
            {
                return Err(duplicate_email());
            }
            am.email = Set(email);
        }
        if let Some(phone) = request.mobile_phone {
            am.mobile_phone = Set(member_phone(Some(&phone)));
        }
        if let Some(name) = request.emergency_contact_name {
            am.emergency_contact_name = Set(optional_field(Some(&name)));
        }
        if let Some(phone) = request.emergency_contact_phone {
            am.emergency_contact_phone = Set(member_phone(Some(&phone)));
        }
        if let Some(status) = request.member_status {
            am.member_status = Set(status);
        }
        if let Some(notes) = request.notes {
            am.notes = Set(optional_field(Some(&notes)));
        }
        am.updated_at = Set(Utc::now());

        let updated = am.update(&self.pool).await.map_err(map_write_error)?;
        self.audit
            .record(Some(user.id), "update_member", "members", member_id, old, snapshot(&updated))
            .await;

        Ok(updated.into())
    }

    /// Members with registrations are kept; mark them inactive instead.
    pub async fn delete_member(&self, user: &AuthUser, member_id: i64) -> AppResult<()> {
        let member = self.find_member(member_id).await?;

        let registration_count = registrations::Entity::find()
            .filter(registrations::Column::MemberId.eq(member_id))
            .count(&self.pool)
            .await?;
        if registration_count > 0 {
            return Err(AppError::ValidationError(
                "Cannot delete a member with registrations. Mark them inactive instead.".into(),
            ));
        }

        let old = snapshot(&member);
        member.delete(&self.pool).await?;
        log::info!("Member {member_id} deleted by user {}", user.id);
        self.audit
            .record(Some(user.id), "delete_member", "members", member_id, old, None)
            .await;
        Ok(())
    }

    async fn find_member(&self, member_id: i64) -> AppResult<members::Model> {
        members::Entity::find_by_id(member_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Member".into()))
    }
}
