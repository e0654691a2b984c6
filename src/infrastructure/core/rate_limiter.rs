use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{self, Instant};
use tracing::info;

/// Sliding-window limiter for outbound API calls.
///
/// At most `max_calls` acquisitions succeed within any `window`; further
/// callers sleep until the oldest call leaves the window.
pub struct RateLimiter {
    max_calls: usize,
    window: Duration,
    recent_calls: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn per_minute(max_calls: usize) -> Self {
        Self::with_window(max_calls, Duration::from_secs(60))
    }

    pub fn with_window(max_calls: usize, window: Duration) -> Self {
        Self {
            max_calls: max_calls.max(1),
            window,
            recent_calls: Mutex::new(VecDeque::with_capacity(max_calls)),
        }
    }

    /// Waits for a free slot and records the call.
    pub async fn acquire(&self) {
        let mut calls = self.recent_calls.lock().await;
        loop {
            let now = Instant::now();
            while calls
                .front()
                .is_some_and(|&t| now.duration_since(t) >= self.window)
            {
                calls.pop_front();
            }

            if calls.len() < self.max_calls {
                calls.push_back(now);
                return;
            }

            if let Some(&oldest) = calls.front() {
                let wait = self.window.saturating_sub(now.duration_since(oldest));
                info!(
                    "RateLimiter: limit of {} calls reached, waiting {:.1}s",
                    self.max_calls,
                    wait.as_secs_f64()
                );
                // Lock stays held so waiters are served in order
                time::sleep(wait).await;
            }
        }
    }

    /// Calls recorded in the current window.
    pub async fn in_flight(&self) -> usize {
        let now = Instant::now();
        let calls = self.recent_calls.lock().await;
        calls
            .iter()
            .filter(|&&t| now.duration_since(t) < self.window)
            .count()
    }
}
