//! Process configuration read from the environment

use std::time::Duration;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_IDLE_TTL_SECS: u64 = 30 * 60;
const DEFAULT_CONTACT_URL: &str =
    "https://wa.me/628551162506?text=Halo,%20saya%20perlu%20bantuan%20untuk%20memperbaiki%20website%20saya";

/// Whether the assistant accepts conversations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceStatus {
    #[default]
    Online,
    Offline,
}

impl ServiceStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ONLINE" => Some(Self::Online),
            "OFFLINE" => Some(Self::Offline),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Online => "ONLINE",
            Self::Offline => "OFFLINE",
        }
    }

    pub fn is_online(self) -> bool {
        self == Self::Online
    }
}

/// PageSpeed Insights settings
#[derive(Debug, Clone)]
pub struct PageSpeedConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub locale: String,
}

/// Search-ranking backend settings
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    /// Country code
    pub gl: String,
    /// Interface language
    pub hl: String,
}

/// Generative backend settings
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub api_key: Option<String>,
    /// OpenAI-compatible gateway base URL
    pub gateway: Option<String>,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub status: ServiceStatus,
    pub pagespeed: PageSpeedConfig,
    pub search: SearchConfig,
    pub chat: ChatConfig,
    /// Link behind the contact call-to-action
    pub contact_url: String,
    pub session_idle_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let status = match get("SITE_ASSISTANT_STATUS") {
            Some(raw) => ServiceStatus::parse(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "Unrecognized SITE_ASSISTANT_STATUS, assuming ONLINE");
                ServiceStatus::Online
            }),
            None => ServiceStatus::Online,
        };

        Self {
            port: get("SITE_ASSISTANT_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            status,
            pagespeed: PageSpeedConfig {
                api_key: get("PAGESPEED_API_KEY"),
                endpoint: or(
                    "PAGESPEED_ENDPOINT",
                    "https://www.googleapis.com/pagespeedonline/v5/runPagespeed",
                ),
                locale: or("PAGESPEED_LOCALE", "id"),
            },
            search: SearchConfig {
                api_key: get("SERPER_API_KEY"),
                endpoint: or("SEARCH_ENDPOINT", "https://google.serper.dev/search"),
                gl: or("SEARCH_GL", "id"),
                hl: or("SEARCH_HL", "id"),
            },
            chat: ChatConfig {
                api_key: get("OPENAI_API_KEY"),
                gateway: get("LLM_GATEWAY"),
                model: or("DEFAULT_MODEL", "gpt-4.1-mini"),
            },
            contact_url: or("CONTACT_URL", DEFAULT_CONTACT_URL),
            session_idle_ttl: Duration::from_secs(
                get("SESSION_IDLE_TTL_SECS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_IDLE_TTL_SECS),
            ),
        }
    }

    /// Names of backend credentials that are not configured
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.pagespeed.api_key.is_none() {
            missing.push("PAGESPEED_API_KEY");
        }
        if self.search.api_key.is_none() {
            missing.push("SERPER_API_KEY");
        }
        if self.chat.api_key.is_none() && self.chat.gateway.is_none() {
            missing.push("OPENAI_API_KEY");
        }
        missing
    }
}
