use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{EventStatus, MemberStatus, PaymentMethod, RegistrationStatus};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::public::get_public_event,
        handlers::public::create_public_registration,
        handlers::event::list_events,
        handlers::event::get_event,
        handlers::event::create_event,
        handlers::event::update_event,
        handlers::event::delete_event,
        handlers::event::reconcile_event,
        handlers::event::list_leaders,
        handlers::event::assign_leader,
        handlers::event::remove_leader,
        handlers::member::list_members,
        handlers::member::get_member,
        handlers::member::create_member,
        handlers::member::update_member,
        handlers::member::delete_member,
        handlers::registration::list_registrations,
        handlers::registration::get_registration,
        handlers::registration::create_registration,
        handlers::registration::update_registration,
        handlers::registration::delete_registration,
        handlers::registration::get_registration_balance,
        handlers::payment::list_payments,
        handlers::payment::record_payment,
        handlers::payment::delete_payment,
        handlers::payment::reconcile_all,
        handlers::leader::dashboard,
        handlers::leader::my_events,
        handlers::leader::event_registrations,
        handlers::leader::add_registration,
        handlers::leader::record_payment,
    ),
    components(
        schemas(
            ErrorBody,
            ErrorResponse,
            DeletedResponse,
            EventStatus,
            MemberStatus,
            PaymentMethod,
            RegistrationStatus,
            PaymentStatus,
            CreateEventRequest,
            UpdateEventRequest,
            EventResponse,
            EventStats,
            EventDetailResponse,
            PublicEventResponse,
            MemberResponse,
            CreateMemberRequest,
            UpdateMemberRequest,
            PublicRegistrationRequest,
            PublicRegistrationResponse,
            RegistrationResponse,
            RegistrationDetail,
            CreateRegistrationRequest,
            UpdateRegistrationRequest,
            RecordPaymentRequest,
            RecordPaymentResponse,
            PaymentResponse,
            BalanceResponse,
            ReconcileReport,
            AssignLeaderRequest,
            EventLeaderResponse,
            LeaderDashboardStats,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "public", description = "Public event signup"),
        (name = "events", description = "Event administration"),
        (name = "members", description = "Member directory"),
        (name = "registrations", description = "Registration administration"),
        (name = "payments", description = "Payment ledger"),
        (name = "leader", description = "Event leader portal"),
    ),
    info(
        title = "Church Admin Backend API",
        version = "1.0.0",
        description = "Event registration and payment ledger API"
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
