use crate::middlewares::current_user;
use crate::models::*;
use crate::services::MemberService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/api/v1/admin/members",
    tag = "members",
    params(MemberQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Members by last name", body = MemberPage)
    )
)]
pub async fn list_members(
    member_service: web::Data<MemberService>,
    query: web::Query<MemberQuery>,
) -> Result<HttpResponse> {
    match member_service.list_members(&query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/members/{id}",
    tag = "members",
    params(("id" = i64, Path, description = "Member id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Member", body = MemberResponse),
        (status = 404, description = "Member not found", body = ErrorResponse)
    )
)]
pub async fn get_member(
    member_service: web::Data<MemberService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match member_service.get_member(path.into_inner()).await {
        Ok(member) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": member
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/members",
    tag = "members",
    request_body = CreateMemberRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Member created", body = MemberResponse),
        (status = 400, description = "Invalid member or email already in use", body = ErrorResponse)
    )
)]
pub async fn create_member(
    member_service: web::Data<MemberService>,
    req: HttpRequest,
    request: web::Json<CreateMemberRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(e.error_response()),
    };

    match member_service.create_member(&user, request.into_inner()).await {
        Ok(member) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": member
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/members/{id}",
    tag = "members",
    params(("id" = i64, Path, description = "Member id")),
    request_body = UpdateMemberRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Member updated", body = MemberResponse),
        (status = 400, description = "Invalid member or email already in use", body = ErrorResponse),
        (status = 404, description = "Member not found", body = ErrorResponse)
    )
)]
pub async fn update_member(
    member_service: web::Data<MemberService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<UpdateMemberRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(e.error_response()),
    };

    match member_service
        .update_member(&user, path.into_inner(), request.into_inner())
        .await
    {
        Ok(member) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": member
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/members/{id}",
    tag = "members",
    params(("id" = i64, Path, description = "Member id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Member deleted", body = DeletedResponse),
        (status = 400, description = "Member still has registrations", body = ErrorResponse),
        (status = 404, description = "Member not found", body = ErrorResponse)
    )
)]
pub async fn delete_member(
    member_service: web::Data<MemberService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(e.error_response()),
    };
    let id = path.into_inner();

    match member_service.delete_member(&user, id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": DeletedResponse { id, deleted: true }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_member_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/members", web::get().to(list_members))
        .route("/members", web::post().to(create_member))
        .route("/members/{id}", web::get().to(get_member))
        .route("/members/{id}", web::put().to(update_member))
        .route("/members/{id}", web::delete().to(delete_member));
}
