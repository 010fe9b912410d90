pub mod contact;
pub mod jwt;
pub mod money;

pub use contact::*;
pub use jwt::*;
pub use money::{payment_cents, to_cents, to_decimal};
