use crate::middlewares::current_user;
use crate::models::*;
use crate::services::{PaymentService, RegistrationService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/api/v1/admin/registrations",
    tag = "registrations",
    params(RegistrationQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Registrations with member and balance", body = RegistrationPage)
    )
)]
pub async fn list_registrations(
    registration_service: web::Data<RegistrationService>,
    query: web::Query<RegistrationQuery>,
) -> Result<HttpResponse> {
    match registration_service.list_registrations(&query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/registrations/{id}",
    tag = "registrations",
    params(("id" = i64, Path, description = "Registration id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Registration with member and balance", body = RegistrationDetail),
        (status = 404, description = "Registration not found", body = ErrorResponse)
    )
)]
pub async fn get_registration(
    registration_service: web::Data<RegistrationService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match registration_service.get_registration(path.into_inner()).await {
        Ok(detail) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": detail
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/registrations",
    tag = "registrations",
    request_body = CreateRegistrationRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Registration created", body = RegistrationResponse),
        (status = 404, description = "Member or event not found", body = ErrorResponse),
        (status = 409, description = "Member already registered", body = ErrorResponse)
    )
)]
pub async fn create_registration(
    registration_service: web::Data<RegistrationService>,
    req: HttpRequest,
    request: web::Json<CreateRegistrationRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(e.error_response()),
    };

    match registration_service
        .create_registration(&user, request.into_inner())
        .await
    {
        Ok(registration) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": registration
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/registrations/{id}",
    tag = "registrations",
    params(("id" = i64, Path, description = "Registration id")),
    request_body = UpdateRegistrationRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Registration updated", body = RegistrationResponse),
        (status = 404, description = "Registration not found", body = ErrorResponse)
    )
)]
pub async fn update_registration(
    registration_service: web::Data<RegistrationService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<UpdateRegistrationRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(e.error_response()),
    };

    match registration_service
        .update_registration(&user, path.into_inner(), request.into_inner())
        .await
    {
        Ok(registration) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": registration
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/registrations/{id}",
    tag = "registrations",
    params(("id" = i64, Path, description = "Registration id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Registration deleted", body = DeletedResponse),
        (status = 400, description = "Registration has payments", body = ErrorResponse),
        (status = 404, description = "Registration not found", body = ErrorResponse)
    )
)]
pub async fn delete_registration(
    registration_service: web::Data<RegistrationService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(e.error_response()),
    };
    let id = path.into_inner();

    match registration_service.delete_registration(&user, id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": DeletedResponse { id, deleted: true }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/registrations/{id}/balance",
    tag = "registrations",
    params(("id" = i64, Path, description = "Registration id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Balance computed from payments", body = BalanceResponse),
        (status = 404, description = "Registration not found", body = ErrorResponse)
    )
)]
pub async fn get_registration_balance(
    payment_service: web::Data<PaymentService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match payment_service
        .get_registration_balance(path.into_inner())
        .await
    {
        Ok(balance) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": balance
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_registration_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/registrations", web::get().to(list_registrations))
        .route("/registrations", web::post().to(create_registration))
        .route("/registrations/{id}", web::get().to(get_registration))
        .route("/registrations/{id}", web::put().to(update_registration))
        .route("/registrations/{id}", web::delete().to(delete_registration))
        .route(
            "/registrations/{id}/balance",
            web::get().to(get_registration_balance),
        );
}
