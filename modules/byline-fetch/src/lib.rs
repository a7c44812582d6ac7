pub mod crawl_policy;
pub mod error;
pub mod gateway;
pub mod rate_limiter;
pub mod stats;
pub mod transport;

pub use crawl_policy::{CrawlPolicyCache, HostPolicy};
pub use error::{FetchError, FetchResult, TransportError};
pub use gateway::{
    is_retryable_status, BackoffPolicy, FetchGateway, FetchOptions, FetchOutcome, FetchResponse,
    GatewayConfig, RETRYABLE_STATUSES,
};
pub use rate_limiter::RateLimiter;
pub use reqwest::Method;
pub use stats::{ScraperStats, StatsSnapshot};
pub use tokio_util::sync::CancellationToken;
pub use transport::{BodyMode, HttpTransport, ReqwestTransport, TransportRequest, TransportResponse};
