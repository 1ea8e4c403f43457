//! Request and response types shared by the provider adapters

use serde::{Deserialize, Serialize};

// ============================================================================
// Generative provider
// ============================================================================

/// Role of a turn in a chat completion request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// One role-tagged turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Ordered list of turns sent to the generative backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub turns: Vec<ChatTurn>,
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(turns: Vec<ChatTurn>) -> Self {
        Self {
            turns,
            max_tokens: None,
        }
    }
}

/// Single text reply from the generative backend
#[derive(Debug, Clone, Default)]
pub struct ChatReply {
    pub text: String,
    pub usage: Usage,
}

/// Token usage reported by the generative backend
#[derive(Debug, Clone, Copy, Default)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

// ============================================================================
// Search-ranking provider
// ============================================================================

/// Results per search page
pub const RESULTS_PER_PAGE: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    /// 1-based result page
    pub page: u32,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>, page: u32) -> Self {
        Self {
            query: query.into(),
            page,
        }
    }

    /// Zero-based index of the first result on this page
    pub fn offset(&self) -> u32 {
        self.page.saturating_sub(1) * RESULTS_PER_PAGE
    }
}

/// One organic search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub position: u32,
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}

// ============================================================================
// Audit provider
// ============================================================================

/// Category scores (0-100) and the worst findings of a quality audit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub overall: u8,
    pub performance: u8,
    pub seo: u8,
    pub best_practices: u8,
    pub accessibility: u8,
    pub issues: Vec<AuditIssue>,
}

impl AuditReport {
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditIssue {
    pub title: String,
    pub description: String,
    pub score: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_value: Option<String>,
    /// Remediation hints (code snippets or offending resource URLs)
    #[serde(default)]
    pub remediation: Vec<String>,
}
