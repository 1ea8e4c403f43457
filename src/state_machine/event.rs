//! Events that can occur in a conversation

use super::state::MenuOption;
use crate::providers::{AuditReport, ChatReply, ProviderError, SearchHit};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // Session events
    SessionStarted,

    // User events
    UserText {
        text: String,
    },
    OptionSelected {
        option: MenuOption,
    },

    // Provider events
    ReachabilityChecked {
        url: String,
        reachable: bool,
    },
    AuditCompleted {
        report: AuditReport,
    },
    SearchCompleted {
        hits: Vec<SearchHit>,
    },
    ReplyGenerated {
        reply: ChatReply,
    },
    ProviderFailed {
        error: ProviderError,
    },
}

impl Event {
    /// Events that originate from the user rather than a backend
    pub fn is_user_input(&self) -> bool {
        matches!(self, Event::UserText { .. } | Event::OptionSelected { .. })
    }
}
