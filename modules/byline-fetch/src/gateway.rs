//! The fetch gateway: robots check, rate-limit wait, HTTP call, classified
//! retry with backoff, statistics.

use std::sync::Arc;
use std::time::Duration;

use byline_common::ScraperConfig;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::Method;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::crawl_policy::CrawlPolicyCache;
use crate::error::{FetchError, FetchResult};
use crate::rate_limiter::RateLimiter;
use crate::stats::ScraperStats;
use crate::transport::{BodyMode, HttpTransport, ReqwestTransport, TransportRequest};

/// HTTP statuses worth another attempt.
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

const DEFAULT_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

/// Exponential backoff between attempts, clamped to `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub min: Duration,
    pub max: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            min: Duration::from_secs(4),
            max: Duration::from_secs(10),
        }
    }
}

impl BackoffPolicy {
    /// Wait after the `attempt`-th failed attempt (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let raw = 2u32
            .checked_pow(exponent)
            .and_then(|factor| self.base.checked_mul(factor))
            .unwrap_or(self.max);
        raw.clamp(self.min, self.max.max(self.min))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub user_agent: String,
    pub request_timeout: Duration,
    /// Total attempts per fetch, including the first.
    pub max_attempts: u32,
    pub backoff: BackoffPolicy,
    pub rate_limit_calls: usize,
    pub rate_limit_period: Duration,
    pub adaptive_rate_limit: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig::from(&ScraperConfig::default())
    }
}

impl From<&ScraperConfig> for GatewayConfig {
    fn from(config: &ScraperConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            request_timeout: config.request_timeout,
            max_attempts: config.max_retries.max(1),
            backoff: BackoffPolicy::default(),
            rate_limit_calls: config.rate_limit_calls,
            rate_limit_period: config.rate_limit_period,
            adaptive_rate_limit: config.adaptive_rate_limit,
        }
    }
}

/// Per-request knobs supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
    pub timeout: Option<Duration>,
    pub body_mode: BodyMode,
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn skip_body(mut self) -> Self {
        self.body_mode = BodyMode::Skip;
        self
    }
}

#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub url: Url,
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Attempts it took to get this response.
    pub attempts: u32,
}

impl FetchResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Result of a single attempt.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Success(FetchResponse),
    RetryableFailure {
        status: Option<u16>,
        reason: String,
    },
    FatalFailure {
        status: Option<u16>,
        reason: String,
    },
    PolicyBlocked,
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

pub struct FetchGateway {
    config: GatewayConfig,
    transport: Arc<dyn HttpTransport>,
    limiter: RateLimiter,
    policy: CrawlPolicyCache,
    stats: ScraperStats,
    cancel: CancellationToken,
}

impl FetchGateway {
    pub fn new(config: GatewayConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let limiter = RateLimiter::new(config.rate_limit_calls, config.rate_limit_period);
        let policy = CrawlPolicyCache::new(
            transport.clone(),
            config.user_agent.clone(),
            config.request_timeout,
        );
        tracing::info!(
            transport = transport.name(),
            max_calls = config.rate_limit_calls,
            period_secs = config.rate_limit_period.as_secs(),
            max_attempts = config.max_attempts,
            "Initialized fetch gateway"
        );
        Self {
            config,
            transport,
            limiter,
            policy,
            stats: ScraperStats::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Gateway over a plain reqwest client.
    pub fn from_config(config: &ScraperConfig) -> Self {
        Self::new(
            GatewayConfig::from(config),
            Arc::new(ReqwestTransport::default()),
        )
    }

    /// Abort pending waits when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn policy(&self) -> &CrawlPolicyCache {
        &self.policy
    }

    pub fn stats(&self) -> &ScraperStats {
        &self.stats
    }

    pub async fn get(&self, url: &str) -> FetchResult<FetchResponse> {
        self.fetch(url, Method::GET, FetchOptions::default()).await
    }

    pub async fn fetch(
        &self,
        url: &str,
        method: Method,
        options: FetchOptions,
    ) -> FetchResult<FetchResponse> {
        self.fetch_inner(url, method, options, None).await
    }

    /// Like [`FetchGateway::fetch`], also aborting when `token` fires.
    pub async fn fetch_with_cancel(
        &self,
        url: &str,
        method: Method,
        options: FetchOptions,
        token: &CancellationToken,
    ) -> FetchResult<FetchResponse> {
        self.fetch_inner(url, method, options, Some(token)).await
    }

    /// One attempt with no retries. Cancellation is reported as a fatal
    /// failure.
    pub async fn attempt(&self, url: &str, method: Method, options: &FetchOptions) -> FetchOutcome {
        let parsed = match Url::parse(url) {
            Ok(u) => u,
            Err(e) => {
                return FetchOutcome::FatalFailure {
                    status: None,
                    reason: format!("invalid URL: {e}"),
                }
            }
        };
        match self.wait(self.policy.allowed(&parsed), &parsed, None).await {
            Ok(true) => {}
            Ok(false) => return FetchOutcome::PolicyBlocked,
            Err(e) => {
                return FetchOutcome::FatalFailure {
                    status: None,
                    reason: e.to_string(),
                }
            }
        }
        match self.send_once(&parsed, &method, options, 1, None).await {
            Ok(outcome) => outcome,
            Err(e) => FetchOutcome::FatalFailure {
                status: None,
                reason: e.to_string(),
            },
        }
    }

    async fn fetch_inner(
        &self,
        url: &str,
        method: Method,
        options: FetchOptions,
        token: Option<&CancellationToken>,
    ) -> FetchResult<FetchResponse> {
        let parsed = Url::parse(url).map_err(|_| FetchError::InvalidUrl {
            url: url.to_string(),
        })?;

        // An interrupted robots.txt load leaves the host uncached.
        if !self.wait(self.policy.allowed(&parsed), &parsed, token).await? {
            tracing::warn!(url = %parsed, "URL blocked by robots.txt");
            return Err(FetchError::PolicyBlocked {
                url: parsed.to_string(),
            });
        }

        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self
                .send_once(&parsed, &method, &options, attempt, token)
                .await?
            {
                FetchOutcome::Success(response) => return Ok(response),
                FetchOutcome::FatalFailure { status, reason } => {
                    tracing::error!(url = %parsed, ?status, reason = %reason, "Fetch failed");
                    return Err(FetchError::Fatal {
                        url: parsed.to_string(),
                        status,
                        reason,
                    });
                }
                FetchOutcome::RetryableFailure { status, reason } => {
                    if attempt >= max_attempts {
                        tracing::error!(
                            url = %parsed,
                            attempts = attempt,
                            ?status,
                            reason = %reason,
                            "Fetch failed after retries"
                        );
                        return Err(FetchError::RetriesExhausted {
                            url: parsed.to_string(),
                            attempts: attempt,
                            status,
                            reason,
                        });
                    }

                    let backoff = self.config.backoff.delay_for(attempt);
                    tracing::warn!(
                        url = %parsed,
                        attempt,
                        backoff_secs = backoff.as_secs(),
                        reason = %reason,
                        "Retryable fetch failure, retrying after backoff"
                    );
                    self.wait(tokio::time::sleep(backoff), &parsed, token)
                        .await?;
                    attempt += 1;
                }
                FetchOutcome::PolicyBlocked => {
                    return Err(FetchError::PolicyBlocked {
                        url: parsed.to_string(),
                    })
                }
            }
        }
    }

    /// Rate-limit wait, request, classification and statistics for one
    /// attempt. Only cancellation is returned as an error.
    async fn send_once(
        &self,
        url: &Url,
        method: &Method,
        options: &FetchOptions,
        attempt: u32,
        token: Option<&CancellationToken>,
    ) -> FetchResult<FetchOutcome> {
        self.wait(self.limiter.acquire(), url, token).await?;

        let timeout = options.timeout.unwrap_or(self.config.request_timeout);
        let request = TransportRequest {
            method: method.clone(),
            url: url.clone(),
            headers: self.request_headers(options),
            body: options.body.clone(),
            timeout,
            body_mode: options.body_mode,
        };

        self.stats.record_attempt();
        let result = match self
            .wait(
                tokio::time::timeout(timeout, self.transport.send(request)),
                url,
                token,
            )
            .await
        {
            Ok(result) => result,
            Err(e) => {
                // Cancelled in flight: still an attempt, and not a success.
                self.stats.record_failure();
                return Err(e);
            }
        };

        let outcome = match result {
            Err(_) => FetchOutcome::RetryableFailure {
                status: None,
                reason: format!("timed out after {}s", timeout.as_secs_f64()),
            },
            Ok(Err(e)) => FetchOutcome::RetryableFailure {
                status: None,
                reason: e.to_string(),
            },
            Ok(Ok(response)) => classify(url, response.status, response.headers, response.body, attempt),
        };

        match &outcome {
            FetchOutcome::Success(_) => {
                self.stats.record_success();
                if self.config.adaptive_rate_limit {
                    self.limiter.throttle_up();
                }
                tracing::debug!(url = %url, attempt, "Successfully fetched");
            }
            FetchOutcome::RetryableFailure { status, .. } => {
                self.stats.record_failure();
                if self.config.adaptive_rate_limit && *status == Some(429) {
                    self.limiter.throttle_down();
                }
            }
            FetchOutcome::FatalFailure { .. } | FetchOutcome::PolicyBlocked => {
                self.stats.record_failure();
            }
        }

        Ok(outcome)
    }

    /// Run `fut` unless the gateway token or the per-call token fires first.
    async fn wait<F: std::future::Future>(
        &self,
        fut: F,
        url: &Url,
        token: Option<&CancellationToken>,
    ) -> FetchResult<F::Output> {
        let cancelled = async {
            match token {
                Some(token) => tokio::select! {
                    _ = self.cancel.cancelled() => {}
                    _ = token.cancelled() => {}
                },
                None => self.cancel.cancelled().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => {
                tracing::warn!(url = %url, "Fetch cancelled");
                Err(FetchError::Cancelled { url: url.to_string() })
            }
            output = fut => Ok(output),
        }
    }

    /// Default headers, overridden by any caller header of the same name.
    fn request_headers(&self, options: &FetchOptions) -> Vec<(String, String)> {
        let defaults = [
            ("User-Agent", self.config.user_agent.as_str()),
            ("Accept", DEFAULT_ACCEPT),
            ("Accept-Language", DEFAULT_ACCEPT_LANGUAGE),
        ];

        let mut headers: Vec<(String, String)> = defaults
            .into_iter()
            .filter(|(name, _)| {
                !options
                    .headers
                    .iter()
                    .any(|(custom, _)| custom.eq_ignore_ascii_case(name))
            })
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        headers.extend(options.headers.iter().cloned());
        headers
    }
}

fn classify(url: &Url, status: u16, headers: HeaderMap, body: Bytes, attempt: u32) -> FetchOutcome {
    if (200..300).contains(&status) {
        FetchOutcome::Success(FetchResponse {
            url: url.clone(),
            status,
            headers,
            body,
            attempts: attempt,
        })
    } else if is_retryable_status(status) {
        FetchOutcome::RetryableFailure {
            status: Some(status),
            reason: format!("HTTP {status}"),
        }
    } else {
        FetchOutcome::FatalFailure {
            status: Some(status),
            reason: format!("HTTP {status}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_schedule() {
        let backoff = BackoffPolicy::default();
        assert_eq!(backoff.delay_for(1), Duration::from_secs(4));
        assert_eq!(backoff.delay_for(2), Duration::from_secs(4));
        assert_eq!(backoff.delay_for(3), Duration::from_secs(4));
        assert_eq!(backoff.delay_for(4), Duration::from_secs(8));
        assert_eq!(backoff.delay_for(5), Duration::from_secs(10));
        assert_eq!(backoff.delay_for(40), Duration::from_secs(10));
    }

    #[test]
    fn test_backoff_is_non_decreasing() {
        let backoff = BackoffPolicy {
            base: Duration::from_millis(300),
            min: Duration::from_secs(1),
            max: Duration::from_secs(30),
        };
        let delays: Vec<_> = (1..12).map(|n| backoff.delay_for(n)).collect();
        assert!(delays.windows(2).all(|w| w[0] <= w[1]), "{delays:?}");
    }

    #[test]
    fn test_classify_statuses() {
        let url = Url::parse("https://tim.blog/").unwrap();
        let outcome = |status| classify(&url, status, HeaderMap::new(), Bytes::new(), 1);

        assert!(outcome(200).is_success());
        assert!(outcome(204).is_success());
        for status in [429, 500, 502, 503, 504] {
            assert!(matches!(
                outcome(status),
                FetchOutcome::RetryableFailure { status: Some(s), .. } if s == status
            ));
        }
        for status in [301, 400, 401, 403, 404, 410, 501] {
            assert!(matches!(
                outcome(status),
                FetchOutcome::FatalFailure { status: Some(s), .. } if s == status
            ));
        }
    }

    #[test]
    fn test_gateway_config_from_scraper_config() {
        let scraper = ScraperConfig {
            max_retries: 5,
            rate_limit_calls: 2,
            ..ScraperConfig::default()
        };
        let config = GatewayConfig::from(&scraper);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.rate_limit_calls, 2);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.backoff, BackoffPolicy::default());
    }

    #[test]
    fn test_fetch_options_builder() {
        let options = FetchOptions::new()
            .header("Authorization", "Bearer abc")
            .timeout(Duration::from_secs(3))
            .skip_body();
        assert_eq!(options.headers.len(), 1);
        assert_eq!(options.timeout, Some(Duration::from_secs(3)));
        assert_eq!(options.body_mode, BodyMode::Skip);
    }
}
