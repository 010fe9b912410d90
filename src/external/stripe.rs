use crate::config::StripeConfig;
use crate::error::{AppError, AppResult};
use stripe::{Event, Webhook};

/// Verifies webhook deliveries from the card processor.
#[derive(Clone)]
pub struct StripeService {
    config: StripeConfig,
}

impl StripeService {
    pub fn new(config: StripeConfig) -> Self {
        Self { config }
    }

    pub fn is_enabled(&self) -> bool {
        !self.config.webhook_secret.is_empty()
    }

    /// Check the `Stripe-Signature` header against the signing secret and parse the event.
    pub fn construct_event(&self, payload: &str, signature: &str) -> AppResult<Event> {
        if !self.is_enabled() {
            return Err(AppError::ConfigError(
                "Stripe webhook secret is not configured".into(),
            ));
        }
        if signature.is_empty() {
            return Err(AppError::NotAuthenticated);
        }
        Webhook::construct_event(payload, signature, &self.config.webhook_secret).map_err(|e| {
            log::warn!("Stripe webhook rejected: {e}");
            AppError::NotAuthenticated
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unsigned_and_unconfigured_deliveries() {
        let unconfigured = StripeService::new(StripeConfig::default());
        assert!(matches!(
            unconfigured.construct_event("{}", "t=1,v1=abc"),
            Err(AppError::ConfigError(_))
        ));

        let service = StripeService::new(StripeConfig {
            webhook_secret: "whsec_test".into(),
        });
        assert!(matches!(
            service.construct_event("{}", ""),
            Err(AppError::NotAuthenticated)
        ));
        assert!(matches!(
            service.construct_event("{}", "t=1,v1=deadbeef"),
            Err(AppError::NotAuthenticated)
        ));
    }
}
