use crate::error::{AppError, AppResult};
use regex::Regex;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Trimmed email, checked against the signup form's format rule
pub fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AppError::ValidationError("Email is required".to_string()));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(AppError::ValidationError(
            "Please enter a valid email".to_string(),
        ));
    }
    Ok(email.to_string())
}

/// Format a US phone number as +1XXXXXXXXXX; other inputs are kept as typed
pub fn format_us_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() == 11 && digits.starts_with('1') {
        format!("+{digits}")
    } else if digits.len() == 10 {
        format!("+1{digits}")
    } else {
        phone.trim().to_string()
    }
}

/// Required free-text field, trimmed
pub fn require_field(value: &str, message: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::ValidationError(message.to_string()));
    }
    Ok(value.to_string())
}

/// Optional free-text field; blank becomes None
pub fn optional_field(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(
            normalize_email("  ruth@example.org ").unwrap(),
            "ruth@example.org"
        );
        assert!(normalize_email("").is_err());
        assert!(normalize_email("ruth@example").is_err());
        assert!(normalize_email("ruth example@x.org").is_err());
    }

    #[test]
    fn test_format_us_phone() {
        assert_eq!(format_us_phone("2345678901"), "+12345678901");
        assert_eq!(format_us_phone("12345678901"), "+12345678901");
        assert_eq!(format_us_phone("(234) 567-8901"), "+12345678901");
        assert_eq!(format_us_phone(" +44 20 7946 0958"), "+44 20 7946 0958");
    }

    #[test]
    fn test_optional_field() {
        assert_eq!(optional_field(Some("  ")), None);
        assert_eq!(optional_field(Some(" note ")), Some("note".to_string()));
        assert_eq!(optional_field(None), None);
    }
}
