//! Conversation state types

use crate::providers::SearchQuery;
use serde::{Deserialize, Serialize};

// ============================================================================
// Choices
// ============================================================================

/// Selectable choices offered in options messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuOption {
    AuditQuality,
    SeoPerformance,
    BrandAiSearch,
    /// Only offered after a first-page search miss
    NextPage,
}

impl MenuOption {
    /// The main menu, in classification order
    pub const MENU: [MenuOption; 3] = [
        MenuOption::AuditQuality,
        MenuOption::SeoPerformance,
        MenuOption::BrandAiSearch,
    ];

    pub fn key(self) -> &'static str {
        match self {
            MenuOption::AuditQuality => "audit_quality",
            MenuOption::SeoPerformance => "seo_performance",
            MenuOption::BrandAiSearch => "brand_ai_search",
            MenuOption::NextPage => "next_page",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MenuOption::AuditQuality => "Audit Kualitas Website",
            MenuOption::SeoPerformance => "Performance SEO Web Saya",
            MenuOption::BrandAiSearch => "Performance Brand di AI Search",
            MenuOption::NextPage => "Lihat page berikutnya",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        [
            MenuOption::AuditQuality,
            MenuOption::SeoPerformance,
            MenuOption::BrandAiSearch,
            MenuOption::NextPage,
        ]
        .into_iter()
        .find(|o| o.key() == key)
    }
}

/// Which follow-up answer the orchestrator expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitingFor {
    #[default]
    None,
    SeoKeyword,
    BrandQuery,
}

/// Keyword and page of the most recent ranking lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchContext {
    pub query: String,
    /// 1-based page to fetch next
    pub page_number: u32,
}

impl SearchContext {
    pub fn to_query(&self) -> SearchQuery {
        SearchQuery::new(self.query.clone(), self.page_number)
    }
}

/// Backend call currently in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    Reachability,
    Audit,
    Search,
    /// Brand AI-search generation
    Brand,
    /// Generic generative answer to unclassified input
    Fallback,
}

// ============================================================================
// Phase
// ============================================================================

/// Where the dialogue is
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Phase {
    /// Session created, greeting not yet sent
    #[default]
    Starting,

    /// Service disabled; every input is rejected
    Offline,

    /// No subject URL yet; free text is a URL candidate
    AwaitingUrl,

    /// Subject URL set, main menu offered
    Menu,

    AwaitingSeoKeyword,

    AwaitingBrandQuery,

    /// First search page missed; "next page" offered
    AwaitingNextPage,

    /// A backend call is in flight
    Requesting {
        call: CallKind,
        /// Phase to return to if the call fails
        resume: Box<Phase>,
    },
}

impl Phase {
    pub fn requesting(call: CallKind, resume: Phase) -> Self {
        Phase::Requesting {
            call,
            resume: Box::new(resume),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Starting => "starting",
            Phase::Offline => "offline",
            Phase::AwaitingUrl => "awaiting_url",
            Phase::Menu => "menu",
            Phase::AwaitingSeoKeyword => "awaiting_seo_keyword",
            Phase::AwaitingBrandQuery => "awaiting_brand_query",
            Phase::AwaitingNextPage => "awaiting_next_page",
            Phase::Requesting { .. } => "requesting",
        }
    }
}

// ============================================================================
// Conversation state
// ============================================================================

/// Everything the orchestrator reads and writes for one session
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConvState {
    pub phase: Phase,
    /// Set once, on the first reachable URL
    pub subject_url: Option<String>,
    pub search: Option<SearchContext>,
    /// Unclassified inputs routed to the generative fallback
    pub error_count: u32,
}

impl ConvState {
    pub fn with_phase(&self, phase: Phase) -> Self {
        Self {
            phase,
            ..self.clone()
        }
    }

    pub fn waiting_for(&self) -> WaitingFor {
        match &self.phase {
            Phase::AwaitingSeoKeyword => WaitingFor::SeoKeyword,
            Phase::AwaitingBrandQuery => WaitingFor::BrandQuery,
            _ => WaitingFor::None,
        }
    }

    /// Options the orchestrator accepts right now
    pub fn offered_options(&self) -> &'static [MenuOption] {
        match self.phase {
            Phase::Menu => &MenuOption::MENU,
            Phase::AwaitingNextPage => &[MenuOption::NextPage],
            _ => &[],
        }
    }

    /// A backend call is in flight
    pub fn is_busy(&self) -> bool {
        matches!(self.phase, Phase::Requesting { .. })
    }
}

/// Per-session configuration (immutable)
#[derive(Debug, Clone)]
pub struct ConvContext {
    pub session_id: String,
    pub online: bool,
    /// Link behind the contact call-to-action
    pub contact_url: String,
}

impl ConvContext {
    pub fn new(session_id: impl Into<String>, online: bool, contact_url: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            online,
            contact_url: contact_url.into(),
        }
    }
}
