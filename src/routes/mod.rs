/**
 * Routes Module
 * API route handlers
 */
pub mod contact;
pub mod health;
pub mod posts;
pub mod sitemap;

use serde::Serialize;

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
        }
    }
}

/// Success response (for delete and similar acknowledgements)
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}
