pub mod event;
pub mod leader;
pub mod member;
pub mod payment;
pub mod public;
pub mod registration;
pub mod webhook;

use actix_web::web;

pub use leader::leader_config;
pub use public::public_config;
pub use webhook::webhook_config;

/// Admin-only routes; the auth middleware enforces the role for the whole `/admin` prefix.
pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .configure(event::admin_event_routes)
            .configure(member::admin_member_routes)
            .configure(registration::admin_registration_routes)
            .configure(payment::admin_payment_routes),
    );
}
