pub mod common;
pub mod event;
pub mod leader;
pub mod member;
pub mod pagination;
pub mod payment;
pub mod registration;

pub use common::*;
pub use event::*;
pub use leader::*;
pub use member::*;
pub use pagination::*;
pub use payment::*;
pub use registration::*;
