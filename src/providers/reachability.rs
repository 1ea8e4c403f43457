//! Server-side URL reachability check

use super::ProviderError;
use crate::runtime::ReachabilityChecker;
use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::Client;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;
use url::Host;

const CHECK_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_REDIRECTS: usize = 5;

/// Sends a `HEAD` request; any HTTP response counts as reachable.
///
/// A 4xx/5xx still proves the host resolves and answers, which is all the
/// subject-URL check needs. Only public addresses are ever contacted, and
/// redirects are followed only while they stay public.
pub struct HeadChecker {
    client: Client,
}

impl HeadChecker {
    pub fn new() -> Result<Self, ProviderError> {
        let redirects = Policy::custom(|attempt| {
            if attempt.previous().len() >= MAX_REDIRECTS {
                attempt.error("too many redirects")
            } else if check_target(attempt.url().as_str()).is_none() {
                // The redirect itself is an answer; never follow it inward
                attempt.stop()
            } else {
                attempt.follow()
            }
        });
        let client = Client::builder()
            .timeout(CHECK_TIMEOUT)
            .redirect(redirects)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ReachabilityChecker for HeadChecker {
    async fn is_reachable(&self, url: &str) -> bool {
        let Some(parsed) = check_target(url) else {
            tracing::debug!(url = %url, "Reachability target rejected");
            return false;
        };
        if let Some(Host::Domain(domain)) = parsed.host() {
            let port = parsed.port_or_known_default().unwrap_or(443);
            if !resolves_publicly(domain, port).await {
                tracing::debug!(url = %url, "Host does not resolve to a public address");
                return false;
            }
        }
        match self.client.head(parsed).send().await {
            Ok(response) => {
                tracing::debug!(url = %url, status = %response.status(), "Reachability check answered");
                true
            }
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "Reachability check failed");
                false
            }
        }
    }
}

/// Absolute http(s) URLs with a dotted public host name or a public IP literal
fn check_target(url: &str) -> Option<url::Url> {
    let parsed = url::Url::parse(url).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let allowed = match parsed.host()? {
        Host::Domain(domain) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            domain.contains('.') && domain != "localhost" && !domain.ends_with(".localhost")
        }
        Host::Ipv4(ip) => is_public_ip(IpAddr::V4(ip)),
        Host::Ipv6(ip) => is_public_ip(IpAddr::V6(ip)),
    };
    allowed.then_some(parsed)
}

/// Every resolved address must be public
async fn resolves_publicly(domain: &str, port: u16) -> bool {
    match tokio::net::lookup_host((domain, port)).await {
        Ok(addrs) => {
            let addrs: Vec<_> = addrs.collect();
            !addrs.is_empty() && addrs.iter().all(|addr| is_public_ip(addr.ip()))
        }
        Err(_) => false,
    }
}

fn is_public_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_public_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_public_v4(v4),
            None => is_public_v6(v6),
        },
    }
}

fn is_public_v4(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    // 100.64.0.0/10 carrier-grade NAT
    let shared = a == 100 && (b & 0xc0) == 64;
    !(ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.is_documentation()
        || shared
        || a == 0)
}

fn is_public_v6(ip: Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    let unique_local = (first & 0xfe00) == 0xfc00;
    let link_local = (first & 0xffc0) == 0xfe80;
    !(ip.is_loopback() || ip.is_unspecified() || unique_local || link_local)
}
