use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use sea_orm::DbErr;
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(DbErr),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Event is not accepting registrations")]
    RegistrationClosed,

    #[error("Event is at full capacity")]
    EventFull,

    #[error("Already registered for this event")]
    AlreadyRegistered,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Processor payments cannot be deleted")]
    ImmutablePaymentDeletion,

    #[error("Payment already processed: {0}")]
    DuplicateExternalPayment(String),

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err {
            // pool exhausted or closed: the caller may retry
            DbErr::ConnectionAcquire(e) => AppError::Unavailable(e.to_string()),
            other => AppError::DatabaseError(other),
        }
    }
}

impl AppError {
    /// Stable machine-readable code for the structured result
    pub fn code(&self) -> &'static str {
        match self {
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::Unavailable(_) => "UNAVAILABLE",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::NotAuthenticated | AppError::JwtError(_) => "NOT_AUTHENTICATED",
            AppError::Forbidden => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::RegistrationClosed => "REGISTRATION_CLOSED",
            AppError::EventFull => "EVENT_FULL",
            AppError::AlreadyRegistered => "ALREADY_REGISTERED",
            AppError::InvalidAmount(_) => "INVALID_AMOUNT",
            AppError::ImmutablePaymentDeletion => "IMMUTABLE_PAYMENT_DELETION",
            AppError::DuplicateExternalPayment(_) => "DUPLICATE_EXTERNAL_PAYMENT",
            AppError::ExternalApiError(_) => "EXTERNAL_API_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }

    /// Plain-language message safe to show to the public signup form
    pub fn public_message(&self) -> String {
        match self {
            AppError::ValidationError(msg) | AppError::InvalidAmount(msg) => msg.clone(),
            AppError::NotFound(what) => format!("{what} not found"),
            AppError::NotAuthenticated | AppError::JwtError(_) => {
                "Please sign in to continue".to_string()
            }
            AppError::Forbidden => "You do not have permission to do that".to_string(),
            AppError::RegistrationClosed => "Event is not accepting registrations".to_string(),
            AppError::EventFull => "Event is at full capacity".to_string(),
            AppError::AlreadyRegistered => {
                "You are already registered for this event".to_string()
            }
            AppError::ImmutablePaymentDeletion => {
                "Cannot delete card payments. Refund through the payment processor instead."
                    .to_string()
            }
            AppError::DuplicateExternalPayment(_) => "Payment already processed".to_string(),
            AppError::Unavailable(_) => {
                "The service is busy right now, please try again".to_string()
            }
            AppError::ExternalApiError(_) | AppError::ReqwestError(_) => {
                "Could not verify your submission, please try again".to_string()
            }
            AppError::DatabaseError(_) => "Database error".to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidAmount(_) => StatusCode::BAD_REQUEST,
            AppError::NotAuthenticated | AppError::JwtError(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden | AppError::ImmutablePaymentDeletion => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::RegistrationClosed
            | AppError::EventFull
            | AppError::AlreadyRegistered
            | AppError::DuplicateExternalPayment(_) => StatusCode::CONFLICT,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::ExternalApiError(_) | AppError::ReqwestError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::ValidationError(msg) | AppError::InvalidAmount(msg) => {
                log::warn!("Validation error: {msg}");
            }
            AppError::NotAuthenticated | AppError::JwtError(_) => {
                log::warn!("Authentication error: {self}");
            }
            AppError::Forbidden => log::warn!("Forbidden access"),
            AppError::DatabaseError(err) => log::error!("Database error: {err}"),
            AppError::Unavailable(msg) => log::error!("Unavailable: {msg}"),
            AppError::ExternalApiError(msg) => log::error!("External API error: {msg}"),
            AppError::NotFound(_)
            | AppError::RegistrationClosed
            | AppError::EventFull
            | AppError::AlreadyRegistered
            | AppError::ImmutablePaymentDeletion
            | AppError::DuplicateExternalPayment(_) => log::info!("Rejected: {self}"),
            _ => log::error!("Internal error: {self}"),
        }

        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": {
                "code": self.code(),
                "message": self.public_message()
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_codes_and_statuses() {
        assert_eq!(AppError::EventFull.code(), "EVENT_FULL");
        assert_eq!(AppError::EventFull.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::ImmutablePaymentDeletion.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::InvalidAmount("Payment amount must be greater than 0".into()).code(),
            "INVALID_AMOUNT"
        );
        assert_eq!(
            AppError::NotAuthenticated.status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn database_errors_are_not_leaked() {
        let err = AppError::from(DbErr::Custom("relation \"payments\" does not exist".into()));
        assert_eq!(err.code(), "DATABASE_ERROR");
        assert_eq!(err.public_message(), "Database error");
    }

    #[test]
    fn public_messages_are_plain_language() {
        assert_eq!(
            AppError::AlreadyRegistered.public_message(),
            "You are already registered for this event"
        );
        assert_eq!(
            AppError::NotFound("Event".into()).public_message(),
            "Event not found"
        );
    }
}
