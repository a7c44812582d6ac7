//! Per-host robots.txt cache.
//!
//! Rulesets are fetched lazily on the first query for a host and kept for the
//! life of the cache. A host whose ruleset cannot be fetched or parsed is
//! marked unavailable and every URL on it is allowed (fail-open).

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use reqwest::Method;
use texting_robots::Robot;
use url::Url;

use crate::transport::{BodyMode, HttpTransport, TransportRequest};

/// Cached crawl directives for one host.
#[derive(Clone)]
pub enum HostPolicy {
    Rules(Arc<Robot>),
    /// Robots.txt answered with a 4xx other than 401/403.
    AllowAll,
    /// Robots.txt answered 401 or 403.
    DisallowAll,
    /// Ruleset could not be fetched or parsed.
    Unavailable,
}

impl HostPolicy {
    pub fn allows(&self, url: &Url) -> bool {
        match self {
            Self::Rules(robot) => robot.allowed(url.as_str()),
            Self::AllowAll | Self::Unavailable => true,
            Self::DisallowAll => false,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }
}

impl std::fmt::Debug for HostPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rules(_) => f.write_str("Rules"),
            Self::AllowAll => f.write_str("AllowAll"),
            Self::DisallowAll => f.write_str("DisallowAll"),
            Self::Unavailable => f.write_str("Unavailable"),
        }
    }
}

pub struct CrawlPolicyCache {
    transport: Arc<dyn HttpTransport>,
    user_agent: String,
    timeout: Duration,
    hosts: RwLock<HashMap<String, HostPolicy>>,
}

impl CrawlPolicyCache {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        user_agent: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            user_agent: user_agent.into(),
            timeout,
            hosts: RwLock::new(HashMap::new()),
        }
    }

    /// Whether the crawl policy of `url`'s host permits fetching it.
    pub async fn allowed(&self, url: &Url) -> bool {
        let Some(key) = host_key(url) else {
            // Opaque origins (data:, file:) have no robots.txt to honour.
            return true;
        };

        if let Some(policy) = self.cached(&key) {
            return policy.allows(url);
        }

        // Concurrent misses for one host may both fetch; last write wins.
        let policy = self.load(url, &key).await;
        let allowed = policy.allows(url);
        self.hosts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, policy);
        allowed
    }

    /// Cached policy for `url`'s host, without fetching.
    pub fn policy_for(&self, url: &Url) -> Option<HostPolicy> {
        self.cached(&host_key(url)?)
    }

    pub fn cached_hosts(&self) -> usize {
        self.hosts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn cached(&self, key: &str) -> Option<HostPolicy> {
        self.hosts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    async fn load(&self, url: &Url, key: &str) -> HostPolicy {
        let robots_url = match url.join("/robots.txt") {
            Ok(u) => u,
            Err(e) => {
                tracing::warn!(host = key, error = %e, "Could not build robots.txt URL");
                return HostPolicy::Unavailable;
            }
        };

        let request = TransportRequest {
            method: Method::GET,
            url: robots_url.clone(),
            headers: vec![("User-Agent".to_string(), self.user_agent.clone())],
            body: None,
            timeout: self.timeout,
            body_mode: BodyMode::Buffered,
        };

        let response =
            match tokio::time::timeout(self.timeout, self.transport.send(request)).await {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => {
                    tracing::warn!(url = %robots_url, error = %e, "Could not load robots.txt");
                    return HostPolicy::Unavailable;
                }
                Err(_) => {
                    tracing::warn!(url = %robots_url, "Timed out loading robots.txt");
                    return HostPolicy::Unavailable;
                }
            };

        match response.status {
            200..=299 => match Robot::new(product_token(&self.user_agent), &response.body) {
                Ok(robot) => {
                    tracing::debug!(url = %robots_url, "Loaded robots.txt");
                    HostPolicy::Rules(Arc::new(robot))
                }
                Err(e) => {
                    tracing::warn!(url = %robots_url, error = %e, "Malformed robots.txt");
                    HostPolicy::Unavailable
                }
            },
            401 | 403 => {
                tracing::debug!(url = %robots_url, status = response.status, "robots.txt access denied, disallowing host");
                HostPolicy::DisallowAll
            }
            400..=499 => HostPolicy::AllowAll,
            status => {
                tracing::warn!(url = %robots_url, status, "Could not load robots.txt");
                HostPolicy::Unavailable
            }
        }
    }
}

/// Robots groups are matched on the product token (`BylineBot` in
/// `BylineBot/1.0 (+https://...)`).
fn product_token(user_agent: &str) -> &str {
    user_agent
        .split(|c: char| c == '/' || c.is_whitespace())
        .next()
        .filter(|t| !t.is_empty())
        .unwrap_or(user_agent)
}

/// Cache key: scheme + authority.
fn host_key(url: &Url) -> Option<String> {
    let origin = url.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}
