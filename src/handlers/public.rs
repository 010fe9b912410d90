use crate::external::TurnstileService;
use crate::models::*;
use crate::services::{EventService, RegistrationService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/api/v1/public/events/{slug}",
    tag = "public",
    params(("slug" = String, Path, description = "Public signup slug")),
    responses(
        (status = 200, description = "Open event for the signup page", body = PublicEventResponse),
        (status = 404, description = "Event not found or not open", body = ErrorResponse)
    )
)]
pub async fn get_public_event(
    event_service: web::Data<EventService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match event_service.get_public_event(&path.into_inner()).await {
        Ok(event) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": event
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/public/events/{event_id}/registrations",
    tag = "public",
    params(("event_id" = i64, Path, description = "Event id")),
    request_body = PublicRegistrationRequest,
    responses(
        (status = 201, description = "Registered", body = PublicRegistrationResponse),
        (status = 400, description = "Form validation failed", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 409, description = "Closed, full or already registered", body = ErrorResponse)
    )
)]
pub async fn create_public_registration(
    registration_service: web::Data<RegistrationService>,
    turnstile: web::Data<TurnstileService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<PublicRegistrationRequest>,
) -> Result<HttpResponse> {
    let request = request.into_inner();

    if turnstile.is_enabled() {
        let remote_ip = req
            .connection_info()
            .realip_remote_addr()
            .map(str::to_string);
        if let Err(e) = turnstile
            .verify_token(request.turnstile_token.as_deref(), remote_ip.as_deref())
            .await
        {
            return Ok(e.error_response());
        }
    }

    match registration_service
        .create_public_registration(path.into_inner(), request)
        .await
    {
        Ok(result) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": result
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn public_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/public")
            .route("/events/{slug}", web::get().to(get_public_event))
            .route(
                "/events/{event_id}/registrations",
                web::post().to(create_public_registration),
            ),
    );
}
