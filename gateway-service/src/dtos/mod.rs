pub mod auth;
pub mod checkout;
pub mod debt;

use serde::{Deserialize, Serialize};

/// Error body for rejections produced by the gateway itself.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
