//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::providers::{
    AuditReport, ChatReply, ChatRequest, ProviderError, SearchHit, SearchQuery,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Performance/quality audit backend
#[async_trait]
pub trait AuditProvider: Send + Sync {
    /// Audit an absolute URL
    async fn audit(&self, url: &str) -> Result<AuditReport, ProviderError>;
}

/// Search-ranking backend
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Organic results for one page, in ranking order. Empty means "not found".
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, ProviderError>;
}

/// Generative text backend
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Complete an ordered list of role-tagged turns into one reply
    async fn complete(&self, request: &ChatRequest) -> Result<ChatReply, ProviderError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Best-effort URL reachability check
#[async_trait]
pub trait ReachabilityChecker: Send + Sync {
    async fn is_reachable(&self, url: &str) -> bool;
}

/// The set of backends a conversation runtime calls into
#[derive(Clone)]
pub struct Providers {
    pub audit: Arc<dyn AuditProvider>,
    pub search: Arc<dyn SearchProvider>,
    pub chat: Arc<dyn ChatProvider>,
    pub reachability: Arc<dyn ReachabilityChecker>,
}

impl Providers {
    pub fn new(
        audit: Arc<dyn AuditProvider>,
        search: Arc<dyn SearchProvider>,
        chat: Arc<dyn ChatProvider>,
        reachability: Arc<dyn ReachabilityChecker>,
    ) -> Self {
        Self {
            audit,
            search,
            chat,
            reachability,
        }
    }
}
