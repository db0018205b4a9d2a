use std::collections::HashMap;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token-bucket rate limiter keyed by host, shared by all workers. Every
/// worker calls `acquire` before fetching, so concurrent workers never exceed
/// the per-host ceiling; with one worker this degenerates to a minimum
/// inter-request delay.
pub struct HostRateLimiter {
    requests_per_second: f64,
    burst: f64,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl HostRateLimiter {
    pub fn new(requests_per_second: f64) -> Self {
        Self::with_burst(requests_per_second, 1.0)
    }

    pub fn with_burst(requests_per_second: f64, burst: f64) -> Self {
        Self {
            requests_per_second: requests_per_second.max(0.001),
            burst: burst.max(1.0),
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Waits until a token is available for `host`, then consumes it.
    pub async fn acquire(&self, host: &str) {
        loop {
            let wait = {
                let mut buckets = self.buckets.lock().await;
                let now = Instant::now();
                let bucket = buckets.entry(host.to_string()).or_insert(Bucket {
                    tokens: self.burst,
                    last_refill: now,
                });

                let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
                bucket.tokens =
                    (bucket.tokens + elapsed * self.requests_per_second).min(self.burst);
                bucket.last_refill = now;

                if bucket.tokens >= 1.0 {
                    bucket.tokens -= 1.0;
                    return;
                }
                Duration::from_secs_f64((1.0 - bucket.tokens) / self.requests_per_second)
            };
            tokio::time::sleep(wait).await;
        }
    }
}
