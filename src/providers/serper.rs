//! Serper (Google search) ranking adapter

use super::{ProviderError, SearchHit, SearchQuery, RESULTS_PER_PAGE};
use crate::config::SearchConfig;
use crate::runtime::SearchProvider;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

pub struct SerperClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    gl: String,
    hl: String,
}

impl SerperClient {
    pub fn new(config: &SearchConfig) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(SEARCH_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            gl: config.gl.clone(),
            hl: config.hl.clone(),
        })
    }

    fn translate_request<'a>(&'a self, query: &'a SearchQuery) -> SerperRequest<'a> {
        SerperRequest {
            q: &query.query,
            gl: &self.gl,
            hl: &self.hl,
            num: RESULTS_PER_PAGE,
            page: query.page.max(1),
        }
    }
}

#[async_trait]
impl SearchProvider for SerperClient {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::auth("SERPER_API_KEY is not configured"))?;

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", api_key)
            .json(&self.translate_request(query))
            .send()
            .await?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(ProviderError::from_status(status, &body));
        }

        let parsed: SerperResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::decode(format!("Failed to parse search response: {e}")))?;
        Ok(normalize_results(parsed, query))
    }
}

/// Keep one page of organic results, filling in positions the backend omitted
fn normalize_results(resp: SerperResponse, query: &SearchQuery) -> Vec<SearchHit> {
    let first_position = query.offset() + 1;
    resp.organic
        .into_iter()
        .take(RESULTS_PER_PAGE as usize)
        .zip(first_position..)
        .map(|(item, fallback)| SearchHit {
            position: item.position.unwrap_or(fallback),
            title: item.title,
            link: item.link,
            snippet: item.snippet,
        })
        .collect()
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    gl: &'a str,
    hl: &'a str,
    num: u32,
    /// 1-based result page
    page: u32,
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperOrganic>,
}

#[derive(Debug, Deserialize)]
struct SerperOrganic {
    #[serde(default)]
    title: String,
    link: String,
    #[serde(default)]
    snippet: String,
    position: Option<u32>,
}
