//! Scripted transport for gateway tests.
//!
//! Page requests are answered from a queue of steps, in order; once the
//! queue is drained every page answers 200. Robots.txt requests are answered
//! separately and never touch the queue.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use byline_fetch::{
    FetchGateway, GatewayConfig, HttpTransport, TransportError, TransportRequest,
    TransportResponse,
};
use bytes::Bytes;
use reqwest::header::HeaderMap;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub enum Step {
    Status(u16),
    Body(u16, &'static str),
    Fail(TransportError),
    /// Sleep this long before answering 200.
    Hang(Duration),
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub request: TransportRequest,
    pub at: Instant,
}

pub struct ScriptedTransport {
    robots: Step,
    steps: Mutex<VecDeque<Step>>,
    recorded: Mutex<Vec<Recorded>>,
}

impl ScriptedTransport {
    /// No robots.txt on any host (404, everything allowed).
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
        Self::with_robots(Step::Status(404), steps)
    }

    pub fn with_robots(robots: Step, steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
        Arc::new(Self {
            robots,
            steps: Mutex::new(steps.into_iter().collect()),
            recorded: Mutex::new(Vec::new()),
        })
    }

    /// Page requests seen so far, robots.txt excluded.
    pub fn pages(&self) -> Vec<Recorded> {
        self.recorded
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.request.url.path() != "/robots.txt")
            .cloned()
            .collect()
    }

    pub fn robots_requests(&self) -> usize {
        self.recorded
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.request.url.path() == "/robots.txt")
            .count()
    }

    async fn answer(step: Step) -> Result<TransportResponse, TransportError> {
        let (status, body) = match step {
            Step::Status(status) => (status, ""),
            Step::Body(status, body) => (status, body),
            Step::Fail(err) => return Err(err),
            Step::Hang(delay) => {
                tokio::time::sleep(delay).await;
                (200, "")
            }
        };
        Ok(TransportResponse {
            status,
            headers: HeaderMap::new(),
            body: Bytes::from_static(body.as_bytes()),
        })
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let is_robots = request.url.path() == "/robots.txt";
        self.recorded.lock().unwrap().push(Recorded {
            request,
            at: Instant::now(),
        });

        let step = if is_robots {
            self.robots.clone()
        } else {
            self.steps
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Step::Status(200))
        };
        Self::answer(step).await
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub fn test_config() -> GatewayConfig {
    GatewayConfig {
        user_agent: "BylineBot/1.0".to_string(),
        request_timeout: Duration::from_secs(30),
        max_attempts: 3,
        rate_limit_calls: 10,
        rate_limit_period: Duration::from_secs(60),
        adaptive_rate_limit: false,
        ..GatewayConfig::default()
    }
}

/// Set `RUST_LOG=byline_fetch=debug` to see gateway logs while testing.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn gateway(config: GatewayConfig, transport: &Arc<ScriptedTransport>) -> FetchGateway {
    init_tracing();
    FetchGateway::new(config, transport.clone())
}

/// Gaps between consecutive page requests.
pub fn gaps(recorded: &[Recorded]) -> Vec<Duration> {
    recorded
        .windows(2)
        .map(|w| w[1].at.duration_since(w[0].at))
        .collect()
}
