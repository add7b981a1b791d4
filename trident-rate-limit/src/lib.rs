//! Token-bucket rate limiting for Trident nozzles.
//!
//! Every nozzle instance owns one [`RateLimiter`] keyed by its own identity.
//! Unlike a web-facing rate limiter that rejects over-limit callers, a
//! nozzle's limiter blocks: a spray worker has nowhere else to send the
//! request, so `acquire` sleeps until a token is available instead of
//! returning a bool.

use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

/// Refill tokens based on elapsed time and try to consume one.
/// Returns `true` if a token was consumed, `false` if rate-limited.
#[inline]
fn refill_and_try_consume(
    tokens: &mut f64,
    last_refill: &mut Instant,
    max_tokens: f64,
    window: Duration,
) -> bool {
    let now = Instant::now();
    let elapsed = now.duration_since(*last_refill);
    let refill = (elapsed.as_secs_f64() / window.as_secs_f64()) * max_tokens;
    *tokens = (*tokens + refill).min(max_tokens);
    *last_refill = now;

    if *tokens >= 1.0 {
        *tokens -= 1.0;
        true
    } else {
        false
    }
}

/// How long until the bucket would have at least one token, given it
/// currently holds `tokens` out of `max_tokens`, refilling over `window`.
fn wait_for_next_token(tokens: f64, max_tokens: f64, window: Duration) -> Duration {
    let deficit = 1.0 - tokens.max(0.0);
    let window_per_token = window.as_secs_f64() / max_tokens;
    Duration::from_secs_f64(deficit * window_per_token)
}

/// A token-bucket rate limiter keyed by an arbitrary type.
///
/// Each key gets its own independent bucket. Tokens refill at a constant
/// rate of `max` per `window`, up to a burst capacity of `max`.
#[derive(Clone)]
pub struct RateLimiter<K> {
    buckets: Arc<DashMap<K, TokenBucket>>,
    max_tokens: f64,
    window: Duration,
}

impl<K: Eq + Hash + Clone> RateLimiter<K> {
    /// Create a rate limiter that allows `max` requests per `window`.
    pub fn new(max: u64, window: Duration) -> Self {
        Self {
            buckets: Arc::new(DashMap::new()),
            max_tokens: max as f64,
            window,
        }
    }

    /// A limiter matching spec defaults for a nozzle: burst 1, rate 3/s.
    pub fn nozzle_default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }

    /// Try to consume one token for the given key without blocking.
    ///
    /// Returns `true` if the request is allowed, `false` if rate-limited.
    pub fn try_acquire(&self, key: &K) -> bool {
        let mut entry = self.buckets.entry(key.clone()).or_insert_with(|| TokenBucket {
            tokens: self.max_tokens,
            last_refill: Instant::now(),
        });

        let bucket = entry.value_mut();
        refill_and_try_consume(&mut bucket.tokens, &mut bucket.last_refill, self.max_tokens, self.window)
    }

    /// Consume one token for the given key, sleeping as long as necessary.
    ///
    /// Unlike [`try_acquire`](Self::try_acquire), this never reports
    /// rate-limiting back to the caller — a nozzle has no one to return a
    /// 429 to, so it waits out its own limiter instead.
    pub async fn acquire(&self, key: &K) {
        loop {
            let wait = {
                let mut entry = self.buckets.entry(key.clone()).or_insert_with(|| TokenBucket {
                    tokens: self.max_tokens,
                    last_refill: Instant::now(),
                });
                let bucket = entry.value_mut();
                if refill_and_try_consume(&mut bucket.tokens, &mut bucket.last_refill, self.max_tokens, self.window) {
                    return;
                }
                wait_for_next_token(bucket.tokens, self.max_tokens, self.window)
            };
            tokio::time::sleep(wait).await;
        }
    }
}
