//! API request and response types

use crate::store::SessionView;
use serde::{Deserialize, Serialize};

/// User input: either free text or an option key, never both
#[derive(Debug, Deserialize)]
pub struct InputRequest {
    #[serde(default)]
    pub text: Option<String>,
    /// Option key as advertised in the view, e.g. `audit_quality`
    #[serde(default)]
    pub option: Option<String>,
}

/// Response to session creation
#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub view: SessionView,
}

/// Response for accepted input
#[derive(Debug, Serialize)]
pub struct InputResponse {
    pub queued: bool,
}

/// Service health and configuration summary
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub model: String,
    pub sessions: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_credentials: Vec<&'static str>,
}

/// Switch the service ONLINE or OFFLINE
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

/// Generic success response
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
