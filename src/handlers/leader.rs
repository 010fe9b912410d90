use crate::middlewares::current_user;
use crate::models::*;
use crate::services::{EventLeaderService, PaymentService, RegistrationService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaderPageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[utoipa::path(
    get,
    path = "/api/v1/leader/events",
    tag = "leader",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Events the caller leads", body = [EventResponse])
    )
)]
pub async fn my_events(
    leader_service: web::Data<EventLeaderService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(e.error_response()),
    };

    match leader_service.list_my_events(&user).await {
        Ok(events) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": events
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/leader/dashboard",
    tag = "leader",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Counts across the events the caller leads", body = LeaderDashboardStats)
    )
)]
pub async fn dashboard(
    leader_service: web::Data<EventLeaderService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(e.error_response()),
    };

    match leader_service.dashboard_stats(&user).await {
        Ok(stats) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": stats
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/leader/events/{id}/registrations",
    tag = "leader",
    params(("id" = i64, Path, description = "Event id"), LeaderPageQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Registrations; balances only with payment visibility", body = RegistrationPage),
        (status = 403, description = "Not a leader of this event", body = ErrorResponse)
    )
)]
pub async fn event_registrations(
    registration_service: web::Data<RegistrationService>,
    req: HttpRequest,
    path: web::Path<i64>,
    query: web::Query<LeaderPageQuery>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(e.error_response()),
    };

    match registration_service
        .list_event_registrations(&user, path.into_inner(), query.page, query.per_page)
        .await
    {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/leader/events/{id}/registrations",
    tag = "leader",
    params(("id" = i64, Path, description = "Event id")),
    request_body = PublicRegistrationRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Registered through the signup rules", body = PublicRegistrationResponse),
        (status = 403, description = "Missing add-registrations permission", body = ErrorResponse),
        (status = 409, description = "Closed, full or already registered", body = ErrorResponse)
    )
)]
pub async fn add_registration(
    registration_service: web::Data<RegistrationService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<PublicRegistrationRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(e.error_response()),
    };

    match registration_service
        .create_leader_registration(&user, path.into_inner(), request.into_inner())
        .await
    {
        Ok(result) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": result
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/leader/payments",
    tag = "leader",
    request_body = RecordPaymentRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Payment recorded", body = RecordPaymentResponse),
        (status = 403, description = "Missing record-payments permission", body = ErrorResponse)
    )
)]
pub async fn record_payment(
    payment_service: web::Data<PaymentService>,
    req: HttpRequest,
    request: web::Json<RecordPaymentRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(e.error_response()),
    };

    match payment_service
        .record_manual_payment(&user, request.into_inner())
        .await
    {
        Ok(result) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": result
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn leader_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/leader")
            .route("/dashboard", web::get().to(dashboard))
            .route("/events", web::get().to(my_events))
            .route(
                "/events/{id}/registrations",
                web::get().to(event_registrations),
            )
            .route(
                "/events/{id}/registrations",
                web::post().to(add_registration),
            )
            .route("/payments", web::post().to(record_payment)),
    );
}
