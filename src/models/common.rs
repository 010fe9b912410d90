use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error half of the structured result returned by every endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Stable code such as `EVENT_FULL` or `INVALID_AMOUNT`
    pub code: String,
    /// Plain-language description
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorBody,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeletedResponse {
    pub id: i64,
    pub deleted: bool,
}
