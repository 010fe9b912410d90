pub mod audit_logs;
pub mod event_leaders;
pub mod events;
pub mod members;
pub mod payments;
pub mod registrations;

pub use audit_logs as audit_log_entity;
pub use event_leaders as event_leader_entity;
pub use events as event_entity;
pub use members as member_entity;
pub use payments as payment_entity;
pub use registrations as registration_entity;

pub use events::EventStatus;
pub use members::MemberStatus;
pub use payments::PaymentMethod;
pub use registrations::RegistrationStatus;
