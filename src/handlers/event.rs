use crate::middlewares::current_user;
use crate::models::*;
use crate::services::{EventLeaderService, EventService, PaymentService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/api/v1/admin/events",
    tag = "events",
    params(EventQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Events, newest first", body = EventPage),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse)
    )
)]
pub async fn list_events(
    event_service: web::Data<EventService>,
    query: web::Query<EventQuery>,
) -> Result<HttpResponse> {
    match event_service.list_events(&query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/events/{id}",
    tag = "events",
    params(("id" = i64, Path, description = "Event id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Event with registration and revenue stats", body = EventDetailResponse),
        (status = 404, description = "Event not found", body = ErrorResponse)
    )
)]
pub async fn get_event(
    event_service: web::Data<EventService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match event_service.get_event(path.into_inner()).await {
        Ok(detail) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": detail
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/events",
    tag = "events",
    request_body = CreateEventRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 400, description = "Invalid event", body = ErrorResponse)
    )
)]
pub async fn create_event(
    event_service: web::Data<EventService>,
    req: HttpRequest,
    request: web::Json<CreateEventRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(e.error_response()),
    };

    match event_service.create_event(&user, request.into_inner()).await {
        Ok(event) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": event
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/events/{id}",
    tag = "events",
    params(("id" = i64, Path, description = "Event id")),
    request_body = UpdateEventRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Event updated", body = EventResponse),
        (status = 400, description = "Invalid event", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse)
    )
)]
pub async fn update_event(
    event_service: web::Data<EventService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<UpdateEventRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(e.error_response()),
    };

    match event_service
        .update_event(&user, path.into_inner(), request.into_inner())
        .await
    {
        Ok(event) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": event
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/events/{id}",
    tag = "events",
    params(("id" = i64, Path, description = "Event id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Event deleted", body = DeletedResponse),
        (status = 400, description = "Event still has registrations", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse)
    )
)]
pub async fn delete_event(
    event_service: web::Data<EventService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(e.error_response()),
    };
    let id = path.into_inner();

    match event_service.delete_event(&user, id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": DeletedResponse { id, deleted: true }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/events/{id}/reconcile",
    tag = "events",
    params(("id" = i64, Path, description = "Event id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Registration statuses recomputed from payments", body = ReconcileReport),
        (status = 404, description = "Event not found", body = ErrorResponse)
    )
)]
pub async fn reconcile_event(
    payment_service: web::Data<PaymentService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match payment_service.reconcile_event(path.into_inner()).await {
        Ok(report) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": report
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/events/{id}/leaders",
    tag = "events",
    params(("id" = i64, Path, description = "Event id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Leaders assigned to the event", body = [EventLeaderResponse])
    )
)]
pub async fn list_leaders(
    leader_service: web::Data<EventLeaderService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match leader_service.list_leaders(path.into_inner()).await {
        Ok(leaders) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": leaders
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/events/{id}/leaders",
    tag = "events",
    params(("id" = i64, Path, description = "Event id")),
    request_body = AssignLeaderRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Leader assigned or permissions replaced", body = EventLeaderResponse),
        (status = 404, description = "Event not found", body = ErrorResponse)
    )
)]
pub async fn assign_leader(
    leader_service: web::Data<EventLeaderService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<AssignLeaderRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(e.error_response()),
    };

    match leader_service
        .assign_leader(&user, path.into_inner(), request.into_inner())
        .await
    {
        Ok(leader) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": leader
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/events/{id}/leaders/{user_id}",
    tag = "events",
    params(
        ("id" = i64, Path, description = "Event id"),
        ("user_id" = i64, Path, description = "Leader user id")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Leader removed"),
        (status = 404, description = "Assignment not found", body = ErrorResponse)
    )
)]
pub async fn remove_leader(
    leader_service: web::Data<EventLeaderService>,
    req: HttpRequest,
    path: web::Path<(i64, i64)>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(e.error_response()),
    };
    let (event_id, user_id) = path.into_inner();

    match leader_service.remove_leader(&user, event_id, user_id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": { "event_id": event_id, "user_id": user_id, "removed": true }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_event_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/events", web::get().to(list_events))
        .route("/events", web::post().to(create_event))
        .route("/events/{id}", web::get().to(get_event))
        .route("/events/{id}", web::put().to(update_event))
        .route("/events/{id}", web::delete().to(delete_event))
        .route("/events/{id}/reconcile", web::post().to(reconcile_event))
        .route("/events/{id}/leaders", web::get().to(list_leaders))
        .route("/events/{id}/leaders", web::post().to(assign_leader))
        .route(
            "/events/{id}/leaders/{user_id}",
            web::delete().to(remove_leader),
        );
}
