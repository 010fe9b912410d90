use crate::config::TurnstileConfig;
use crate::error::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const VERIFY_ENDPOINT: &str = "https://challenges.cloudflare.com/turnstile/v0/siteverify";

#[derive(Clone)]
pub struct TurnstileService {
    http: Client,
    cfg: TurnstileConfig,
}

impl TurnstileService {
    pub fn new(cfg: TurnstileConfig) -> AppResult<Self> {
        let http = Client::builder()
            .user_agent("church-admin-backend/turnstile")
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::ConfigError(format!("Turnstile HTTP client: {e}")))?;
        Ok(Self { http, cfg })
    }

    pub fn is_enabled(&self) -> bool {
        !self.cfg.secret_key.is_empty()
    }

    /// Verify the challenge token submitted with the signup form.
    /// Hostname and action are compared only when configured.
    pub async fn verify_token(&self, token: Option<&str>, remote_ip: Option<&str>) -> AppResult<()> {
        let token = token.map(str::trim).unwrap_or_default();
        if token.is_empty() {
            return Err(AppError::ValidationError(
                "Please complete the verification challenge".into(),
            ));
        }
        if token.len() > 2048 {
            return Err(AppError::ValidationError(
                "Verification token is invalid".into(),
            ));
        }

        let mut req_body = serde_json::json!({
            "secret": self.cfg.secret_key,
            "response": token,
        });

        if let Some(ip) = remote_ip {
            req_body["remoteip"] = serde_json::json!(ip);
        }

        let resp = self
            .http
            .post(VERIFY_ENDPOINT)
            .json(&req_body)
            .send()
            .await?;

        let status = resp.status();
        let body: VerifyResponse = resp.json().await?;

        if !status.is_success() || !body.success {
            let errs = body.error_codes.unwrap_or_default().join(",");
            log::warn!("Turnstile verification failed: HTTP {}: {errs}", status.as_u16());
            return Err(AppError::ValidationError(
                "Verification failed, please try again".into(),
            ));
        }

        if let Some(expected) = &self.cfg.expected_hostname
            && body.hostname.as_ref().is_some_and(|host| host != expected)
        {
            return Err(AppError::ValidationError(
                "Verification failed, please try again".into(),
            ));
        }
        if let Some(expected) = &self.cfg.expected_action
            && body.action.as_ref().is_some_and(|action| action != expected)
        {
            return Err(AppError::ValidationError(
                "Verification failed, please try again".into(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize)]
struct VerifyResponse {
    success: bool,
    #[serde(default)]
    hostname: Option<String>,
    #[serde(rename = "error-codes")]
    #[serde(default)]
    error_codes: Option<Vec<String>>,
    #[serde(default)]
    action: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_without_secret() {
        let service = TurnstileService::new(TurnstileConfig::default()).unwrap();
        assert!(!service.is_enabled());
    }

    #[tokio::test]
    async fn missing_token_is_rejected_before_any_request() {
        let service = TurnstileService::new(TurnstileConfig {
            secret_key: "0x4AAA".into(),
            expected_hostname: None,
            expected_action: None,
        })
        .unwrap();
        assert!(matches!(
            service.verify_token(None, None).await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            service.verify_token(Some("   "), None).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn parses_siteverify_response() {
        let body: VerifyResponse = serde_json::from_str(
            r#"{"success":false,"error-codes":["invalid-input-response"],"hostname":null}"#,
        )
        .unwrap();
        assert!(!body.success);
        assert_eq!(
            body.error_codes.unwrap_or_default(),
            vec!["invalid-input-response".to_string()]
        );
    }
}
