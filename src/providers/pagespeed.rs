//! PageSpeed Insights audit adapter

use super::{AuditIssue, AuditReport, ProviderError};
use crate::config::PageSpeedConfig;
use crate::runtime::AuditProvider;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Lighthouse runs take up to two minutes on slow sites
const AUDIT_TIMEOUT: Duration = Duration::from_secs(150);
/// Findings kept per report
pub const MAX_ISSUES: usize = 5;
/// Remediation hints kept per finding
pub const MAX_REMEDIATION_ITEMS: usize = 3;
/// Audits scoring at or above this are not reported as issues
const ISSUE_SCORE_CEILING: f64 = 0.9;

const CATEGORIES: [&str; 4] = ["performance", "seo", "best-practices", "accessibility"];

pub struct PageSpeedClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    locale: String,
}

impl PageSpeedClient {
    pub fn new(config: &PageSpeedConfig) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(AUDIT_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            locale: config.locale.clone(),
        })
    }

    fn query_params<'a>(&'a self, url: &'a str) -> Vec<(&'static str, &'a str)> {
        let mut params = vec![("url", url), ("strategy", "desktop")];
        params.extend(CATEGORIES.iter().map(|c| ("category", *c)));
        params.push(("locale", self.locale.as_str()));
        if let Some(key) = &self.api_key {
            params.push(("key", key.as_str()));
        }
        params
    }
}

#[async_trait]
impl AuditProvider for PageSpeedClient {
    async fn audit(&self, url: &str) -> Result<AuditReport, ProviderError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&self.query_params(url))
            .send()
            .await?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
                .unwrap_or(body);
            return Err(ProviderError::from_status(status, &message));
        }

        let data: Value = serde_json::from_str(&body)
            .map_err(|e| ProviderError::decode(format!("Failed to parse audit response: {e}")))?;
        parse_report(&data)
    }
}

/// Reduce a `runPagespeed` response to scores and the worst findings
pub fn parse_report(data: &Value) -> Result<AuditReport, ProviderError> {
    let lighthouse = data
        .get("lighthouseResult")
        .filter(|v| v.is_object())
        .ok_or_else(|| ProviderError::decode("Audit response has no lighthouseResult"))?;

    let categories = &lighthouse["categories"];
    let score_of = |name: &str| categories[name]["score"].as_f64().map_or(0, to_percent);

    let performance = score_of("performance");
    let seo = score_of("seo");
    let best_practices = score_of("best-practices");
    let accessibility = score_of("accessibility");

    let sum = u16::from(performance) + u16::from(seo) + u16::from(best_practices) + u16::from(accessibility);
    let overall = u8::try_from((sum + 2) / 4).unwrap_or(100);

    let issues = lighthouse["audits"]
        .as_object()
        .map(|audits| {
            audits
                .values()
                .filter_map(parse_issue)
                .take(MAX_ISSUES)
                .collect()
        })
        .unwrap_or_default();

    Ok(AuditReport {
        overall,
        performance,
        seo,
        best_practices,
        accessibility,
        issues,
    })
}

fn parse_issue(audit: &Value) -> Option<AuditIssue> {
    let score = audit["score"].as_f64()?;
    if score <= 0.0 || score >= ISSUE_SCORE_CEILING {
        return None;
    }

    let remediation = audit["details"]["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(remediation_hint)
                .take(MAX_REMEDIATION_ITEMS)
                .collect()
        })
        .unwrap_or_default();

    Some(AuditIssue {
        title: audit["title"].as_str().unwrap_or_default().to_string(),
        description: audit["description"].as_str().unwrap_or_default().to_string(),
        score: to_percent(score),
        display_value: audit["displayValue"].as_str().map(str::to_string),
        remediation,
    })
}

/// A details item is either a bare string or an object carrying a snippet or URL
fn remediation_hint(item: &Value) -> Option<String> {
    non_empty(item)
        .or_else(|| non_empty(&item["snippet"]))
        .or_else(|| non_empty(&item["url"]))
        .map(str::to_string)
}

fn non_empty(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|t| !t.is_empty())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped to 0..=100
fn to_percent(score: f64) -> u8 {
    (score * 100.0).round().clamp(0.0, 100.0) as u8
}
