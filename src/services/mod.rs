pub mod audit_service;
pub mod event_leader_service;
pub mod event_service;
pub mod ledger;
pub mod member_service;
pub mod payment_service;
pub mod registration_service;

pub use audit_service::AuditService;
pub use event_leader_service::EventLeaderService;
pub use event_service::EventService;
pub use member_service::MemberService;
pub use payment_service::PaymentService;
pub use registration_service::RegistrationService;
