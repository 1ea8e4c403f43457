//! External analysis and generation backends
//!
//! Each adapter implements one of the provider traits in `runtime::traits`
//! against a concrete HTTP API.

mod error;
mod openai;
mod pagespeed;
mod reachability;
mod serper;
mod types;

pub use error::{ProviderError, ProviderErrorKind};
pub use openai::OpenAIChat;
pub use pagespeed::PageSpeedClient;
pub use reachability::HeadChecker;
pub use serper::SerperClient;
pub use types::*;

use crate::runtime::{AuditProvider, ChatProvider, ReachabilityChecker, SearchProvider};
use async_trait::async_trait;
use std::time::Instant;

/// Logging wrapper for providers
pub struct LoggingProvider<T> {
    inner: T,
    provider: &'static str,
}

impl<T> LoggingProvider<T> {
    pub fn new(provider: &'static str, inner: T) -> Self {
        Self { inner, provider }
    }
}

fn log_outcome<R>(provider: &str, start: Instant, result: &Result<R, ProviderError>) {
    let duration = start.elapsed();
    match result {
        Ok(_) => {
            tracing::info!(
                provider = %provider,
                duration_ms = %duration.as_millis(),
                "Provider request completed"
            );
        }
        Err(e) => {
            tracing::error!(
                provider = %provider,
                duration_ms = %duration.as_millis(),
                error = %e.message,
                kind = ?e.kind,
                "Provider request failed"
            );
        }
    }
}

#[async_trait]
impl<T: AuditProvider> AuditProvider for LoggingProvider<T> {
    async fn audit(&self, url: &str) -> Result<AuditReport, ProviderError> {
        let start = Instant::now();
        let result = self.inner.audit(url).await;
        if let Ok(report) = &result {
            tracing::debug!(url = %url, overall = report.overall, issues = report.issues.len(), "Audit report");
        }
        log_outcome(self.provider, start, &result);
        result
    }
}

#[async_trait]
impl<T: SearchProvider> SearchProvider for LoggingProvider<T> {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, ProviderError> {
        let start = Instant::now();
        let result = self.inner.search(query).await;
        if let Ok(hits) = &result {
            tracing::debug!(page = query.page, hits = hits.len(), "Search results");
        }
        log_outcome(self.provider, start, &result);
        result
    }
}

#[async_trait]
impl<T: ChatProvider> ChatProvider for LoggingProvider<T> {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatReply, ProviderError> {
        let start = Instant::now();
        let result = self.inner.complete(request).await;
        if let Ok(reply) = &result {
            tracing::debug!(
                model = %self.inner.model_id(),
                input_tokens = reply.usage.input_tokens,
                output_tokens = reply.usage.output_tokens,
                "Chat usage"
            );
        }
        log_outcome(self.provider, start, &result);
        result
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}

#[async_trait]
impl<T: ReachabilityChecker> ReachabilityChecker for LoggingProvider<T> {
    async fn is_reachable(&self, url: &str) -> bool {
        let start = Instant::now();
        let reachable = self.inner.is_reachable(url).await;
        tracing::info!(
            provider = %self.provider,
            url = %url,
            reachable,
            duration_ms = %start.elapsed().as_millis(),
            "Reachability check"
        );
        reachable
    }
}
