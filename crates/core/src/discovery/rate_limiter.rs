//! Token bucket rate limiter for discovery providers.
//!
//! Upstream video databases enforce per-key request budgets; providers wrap
//! their outgoing calls in one of these so a large batch run degrades into
//! RateLimited skips instead of upstream bans.

use tokio::time::{Duration, Instant};

use super::DiscoveryError;

/// Token bucket for a single provider.
///
/// Tokens refill at a constant rate and one is consumed per request. The
/// bucket starts full, so bursts up to the per-minute budget go through
/// immediately.
pub struct TokenBucket {
    /// Max tokens (= requests per minute).
    capacity: f32,
    /// Current available tokens.
    tokens: f32,
    /// Tokens added per second.
    refill_rate: f32,
    /// Last refill time.
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(requests_per_minute: u32) -> Self {
        let capacity = requests_per_minute as f32;
        Self {
            capacity,
            tokens: capacity,
            refill_rate: capacity / 60.0,
            last_refill: Instant::now(),
        }
    }

    /// Try to acquire a token.
    ///
    /// Returns `Err(wait_duration)` if rate limited, with the duration
    /// until a token becomes available.
    pub fn try_acquire(&mut self) -> Result<(), Duration> {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let tokens_needed = 1.0 - self.tokens;
            let wait_secs = tokens_needed / self.refill_rate;
            Err(Duration::from_secs_f32(wait_secs))
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f32();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_refill = now;
    }
}

/// Async-friendly wrapper around a provider's token bucket.
pub struct ProviderRateLimiter {
    bucket: tokio::sync::Mutex<TokenBucket>,
}

impl ProviderRateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            bucket: tokio::sync::Mutex::new(TokenBucket::new(requests_per_minute)),
        }
    }

    /// Acquire a token or report the provider as rate limited.
    pub async fn acquire(&self) -> Result<(), DiscoveryError> {
        let mut bucket = self.bucket.lock().await;
        bucket.try_acquire().map_err(|_| DiscoveryError::RateLimited)
    }
}
