pub mod stripe;
pub mod turnstile;

pub use self::stripe::StripeService;
pub use self::turnstile::TurnstileService;
