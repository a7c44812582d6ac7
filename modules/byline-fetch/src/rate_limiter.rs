//! Sliding-window rate limiter shared by every fetch on one gateway.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

/// Bounds outbound requests to `max_calls` within any trailing `period`.
///
/// The timestamp window is the only mutable state and sits behind a single
/// mutex that is never held across an await.
#[derive(Debug)]
pub struct RateLimiter {
    max_calls: usize,
    min_calls: usize,
    period: Duration,
    state: Mutex<WindowState>,
}

#[derive(Debug)]
struct WindowState {
    timestamps: VecDeque<Instant>,
    /// Effective capacity; equals `max_calls` unless throttled down.
    capacity: usize,
    consecutive_rate_limits: u32,
}

impl WindowState {
    fn evict(&mut self, now: Instant, period: Duration) {
        while let Some(oldest) = self.timestamps.front() {
            if now.duration_since(*oldest) >= period {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }
}

impl RateLimiter {
    pub fn new(max_calls: usize, period: Duration) -> Self {
        let max_calls = max_calls.max(1);
        Self {
            max_calls,
            min_calls: 1,
            period,
            state: Mutex::new(WindowState {
                timestamps: VecDeque::with_capacity(max_calls),
                capacity: max_calls,
                consecutive_rate_limits: 0,
            }),
        }
    }

    /// Floor for [`RateLimiter::throttle_down`].
    pub fn with_min_calls(mut self, min_calls: usize) -> Self {
        self.min_calls = min_calls.clamp(1, self.max_calls);
        self
    }

    pub fn max_calls(&self) -> usize {
        self.max_calls
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Current effective capacity per period.
    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    /// Number of request timestamps currently held in the window.
    pub fn recorded(&self) -> usize {
        self.lock().timestamps.len()
    }

    /// Wait until one more request fits in the window, then record it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.lock();
                let now = Instant::now();
                state.evict(now, self.period);

                if state.timestamps.len() < state.capacity {
                    state.timestamps.push_back(now);
                    return;
                }

                // Invariant: the window is non-empty whenever it is full.
                match state.timestamps.front() {
                    Some(oldest) => self.period.saturating_sub(now.duration_since(*oldest)),
                    None => Duration::ZERO,
                }
            };

            tracing::debug!(
                wait_ms = wait.as_millis() as u64,
                "Rate limit reached, sleeping"
            );
            tokio::time::sleep(wait).await;
        }
    }

    /// Record a request if a slot is free right now; never waits.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.lock();
        let now = Instant::now();
        state.evict(now, self.period);
        if state.timestamps.len() < state.capacity {
            state.timestamps.push_back(now);
            true
        } else {
            false
        }
    }

    /// Halve the effective capacity after the remote side pushed back.
    pub fn throttle_down(&self) {
        let mut state = self.lock();
        state.consecutive_rate_limits += 1;
        if state.capacity > self.min_calls {
            let old = state.capacity;
            state.capacity = (state.capacity / 2).max(self.min_calls);
            tracing::warn!(
                from = old,
                to = state.capacity,
                period_secs = self.period.as_secs(),
                "Rate limit hit, throttling down"
            );
        }
    }

    /// Recover capacity after a success. Outstanding rate-limit hits are paid
    /// off one per success before capacity grows again.
    pub fn throttle_up(&self) {
        let mut state = self.lock();
        if state.consecutive_rate_limits > 0 {
            state.consecutive_rate_limits -= 1;
        } else if state.capacity < self.max_calls {
            let old = state.capacity;
            let grown = (state.capacity * 3 / 2).max(state.capacity + 1);
            state.capacity = grown.min(self.max_calls);
            tracing::info!(from = old, to = state.capacity, "Throttling up");
        }
    }

    fn lock(&self) -> MutexGuard<'_, WindowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
