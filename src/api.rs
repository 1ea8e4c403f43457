//! HTTP API for the site assistant
//!
//! Session lifecycle, user input and the SSE stream the chat widget renders.

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::runtime::SessionManager;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Also owns the ONLINE/OFFLINE switch
    pub sessions: Arc<SessionManager>,
    /// Generative model answering free-text questions
    pub model: String,
    pub missing_credentials: Vec<&'static str>,
}

impl AppState {
    pub fn new(
        sessions: Arc<SessionManager>,
        model: impl Into<String>,
        missing_credentials: Vec<&'static str>,
    ) -> Self {
        Self {
            sessions,
            model: model.into(),
            missing_credentials,
        }
    }
}
