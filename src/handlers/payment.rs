use crate::middlewares::current_user;
use crate::models::*;
use crate::services::PaymentService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/api/v1/admin/payments",
    tag = "payments",
    params(PaymentQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Payments, newest first", body = PaymentPage)
    )
)]
pub async fn list_payments(
    payment_service: web::Data<PaymentService>,
    query: web::Query<PaymentQuery>,
) -> Result<HttpResponse> {
    match payment_service.list_payments(&query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/payments",
    tag = "payments",
    request_body = RecordPaymentRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Payment recorded; warning set on overpayment", body = RecordPaymentResponse),
        (status = 400, description = "Invalid amount or method", body = ErrorResponse),
        (status = 404, description = "Registration not found", body = ErrorResponse)
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

#[utoipa::path(
    delete,
    path = "/api/v1/admin/payments/{id}",
    tag = "payments",
    params(("id" = i64, Path, description = "Payment id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Payment deleted; returns the new balance", body = BalanceResponse),
        (status = 403, description = "Card payments cannot be deleted", body = ErrorResponse),
        (status = 404, description = "Payment not found", body = ErrorResponse)
    )
)]
pub async fn delete_payment(
    payment_service: web::Data<PaymentService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(e.error_response()),
    };

    match payment_service.delete_payment(&user, path.into_inner()).await {
        Ok(balance) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": balance
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/payments/reconcile",
    tag = "payments",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All registration statuses recomputed", body = ReconcileReport)
    )
)]
pub async fn reconcile_all(payment_service: web::Data<PaymentService>) -> Result<HttpResponse> {
    match payment_service.reconcile_all().await {
        Ok(report) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": report
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_payment_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/payments", web::get().to(list_payments))
        .route("/payments", web::post().to(record_payment))
        .route("/payments/reconcile", web::post().to(reconcile_all))
        .route("/payments/{id}", web::delete().to(delete_payment));
}
