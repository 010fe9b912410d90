use crate::error::AppError;
use crate::external::StripeService;
use crate::services::PaymentService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use log::{error, info, warn};
use serde_json::json;
use std::collections::HashMap;
use stripe::{Currency, EventObject, EventType, PaymentIntent};

/// Processor payment-confirmation channel.
///
/// Duplicates and permanently bad deliveries are acknowledged with 200 so the processor
/// stops retrying; transient failures return 5xx so it tries again.
pub async fn stripe_webhook(
    req: HttpRequest,
    body: web::Bytes,
    stripe_service: web::Data<StripeService>,
    payment_service: web::Data<PaymentService>,
) -> Result<HttpResponse> {
    let signature = match req.headers().get("stripe-signature") {
        Some(sig) => sig.to_str().unwrap_or(""),
        None => {
            warn!("Missing Stripe-Signature header");
            return Ok(HttpResponse::BadRequest().json(json!({
                "error": "Missing Stripe-Signature header"
            })));
        }
    };

    let Ok(payload) = std::str::from_utf8(&body) else {
        error!("Invalid UTF-8 in webhook payload");
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "Invalid payload encoding"
        })));
    };

    let event = match stripe_service.construct_event(payload, signature) {
        Ok(event) => event,
        Err(AppError::ConfigError(msg)) => {
            error!("Stripe webhook received but not configured: {msg}");
            return Ok(HttpResponse::ServiceUnavailable().finish());
        }
        Err(_) => {
            return Ok(HttpResponse::Unauthorized().json(json!({
                "error": "Invalid signature"
            })));
        }
    };

    info!("Received Stripe webhook event: {} ({})", event.type_, event.id);

    match (event.type_, event.data.object) {
        (EventType::PaymentIntentSucceeded, EventObject::PaymentIntent(intent)) => {
            Ok(handle_payment_intent_succeeded(&payment_service, intent).await)
        }
        (event_type, _) => {
            info!("Ignoring Stripe event type {event_type}");
            Ok(HttpResponse::Ok().json(json!({ "received": true })))
        }
    }
}

async fn handle_payment_intent_succeeded(
    payment_service: &PaymentService,
    intent: PaymentIntent,
) -> HttpResponse {
    let intent_id = intent.id.as_str().to_string();

    let Some(registration_id) = registration_id_from_metadata(&intent.metadata) else {
        warn!("PaymentIntent {intent_id} has no registration_id metadata; ignoring");
        return HttpResponse::Ok().json(json!({ "received": true }));
    };
    if intent.currency != Currency::USD {
        error!(
            "PaymentIntent {intent_id} for registration {registration_id} is in {}; ignoring",
            intent.currency
        );
        return HttpResponse::Ok().json(json!({ "received": true }));
    }

    match payment_service
        .process_external_payment(registration_id, &intent_id, intent.amount_received)
        .await
    {
        Ok(result) => {
            info!(
                "PaymentIntent {intent_id} recorded as payment {} (registration now {})",
                result.payment.id, result.registration_status
            );
            HttpResponse::Ok().json(json!({ "received": true }))
        }
        Err(AppError::DuplicateExternalPayment(id)) => {
            info!("PaymentIntent {id} already recorded; acknowledging replay");
            HttpResponse::Ok().json(json!({ "received": true, "duplicate": true }))
        }
        Err(e) if should_retry(&e) => {
            error!("PaymentIntent {intent_id} failed transiently: {e}");
            e.error_response()
        }
        Err(e) => {
            error!("PaymentIntent {intent_id} could not be applied: {e}");
            HttpResponse::Ok().json(json!({ "received": true, "error": e.code() }))
        }
    }
}

pub fn registration_id_from_metadata(metadata: &HashMap<String, String>) -> Option<i64> {
    metadata
        .get("registration_id")
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
}

/// Failures worth a redelivery from the processor
fn should_retry(e: &AppError) -> bool {
    matches!(
        e,
        AppError::Unavailable(_) | AppError::DatabaseError(_) | AppError::InternalError(_)
    )
}

pub fn webhook_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/webhook").route("/stripe", web::post().to(stripe_webhook)));
}
