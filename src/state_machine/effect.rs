//! Effects produced by state transitions

use crate::providers::{ChatRequest, SearchQuery};
use crate::store::OutboundMessage;

/// Backend call to perform
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderCall {
    CheckReachability { url: String },
    Audit { url: String },
    Search { query: SearchQuery },
    Generate { request: ChatRequest },
}

impl ProviderCall {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderCall::CheckReachability { .. } => "reachability",
            ProviderCall::Audit { .. } => "audit",
            ProviderCall::Search { .. } => "search",
            ProviderCall::Generate { .. } => "generate",
        }
    }
}

/// Effects to be executed after state transition, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Append a permanent message to the log
    Append(OutboundMessage),

    /// Call a backend; its outcome comes back as an event.
    ///
    /// `transient` is shown before the call and retracted once it settles,
    /// whatever the outcome.
    Request {
        call: ProviderCall,
        transient: Option<OutboundMessage>,
    },
}

impl Effect {
    pub fn append(message: OutboundMessage) -> Self {
        Effect::Append(message)
    }

    pub fn request(call: ProviderCall) -> Self {
        Effect::Request {
            call,
            transient: None,
        }
    }

    pub fn request_with_notice(call: ProviderCall, notice: OutboundMessage) -> Self {
        Effect::Request {
            call,
            transient: Some(notice),
        }
    }
}
