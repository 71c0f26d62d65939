//! Sliding-window limiter for outbound LLM API calls

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub struct RateLimiter {
    state: Mutex<Window>,
}

struct Window {
    /// Timestamps of requests inside the current window
    request_times: VecDeque<Instant>,
    max_requests: usize,
    window: Duration,
}

impl Window {
    fn check_and_record(&mut self, now: Instant) -> Duration {
        // Drop timestamps that fell out of the window
        while let Some(&front) = self.request_times.front() {
            if now.duration_since(front) >= self.window {
                self.request_times.pop_front();
            } else {
                break;
            }
        }

        if self.request_times.len() >= self.max_requests {
            if let Some(&oldest) = self.request_times.front() {
                return self.window - now.duration_since(oldest);
            }
        }

        self.request_times.push_back(now);
        Duration::ZERO
    }
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            state: Mutex::new(Window {
                request_times: VecDeque::new(),
                max_requests: max_requests.max(1),
                window,
            }),
        }
    }

    pub fn per_minute(max_requests: usize) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }

    /// How long the caller must wait before a slot frees up; zero means the request was recorded
    fn check_and_record(&self) -> Duration {
        match self.state.lock() {
            Ok(mut window) => window.check_and_record(Instant::now()),
            Err(poisoned) => poisoned.into_inner().check_and_record(Instant::now()),
        }
    }

    /// Wait until a request slot is available, then claim it
    pub async fn acquire(&self) {
        loop {
            let wait = self.check_and_record();
            if wait.is_zero() {
                return;
            }
            tracing::debug!("LLM API rate limit: waiting {}ms", wait.as_millis());
            tokio::time::sleep(wait).await;
        }
    }
}
