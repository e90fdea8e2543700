//! Per-client token-bucket rate limiting.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dashmap::DashMap;

use crate::config::schema::RateLimitConfig;
use crate::http::response::ErrorBody;
use crate::observability::metrics;

/// Buckets idle this long are dropped during a sweep.
const IDLE_EVICTION: Duration = Duration::from_secs(300);
/// Sweep once the table grows past this many clients.
const SWEEP_THRESHOLD: usize = 10_000;

/// A simple token bucket rate limiter.
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_update: now,
        }
    }

    fn try_acquire(&mut self, capacity: f64, refill_rate: f64, now: Instant) -> bool {
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        // Refill tokens
        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Shared limiter state, keyed by client IP.
#[derive(Debug)]
pub struct RateLimiter {
    buckets: DashMap<IpAddr, TokenBucket>,
    rps: f64,
    burst: f64,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            buckets: DashMap::new(),
            rps: f64::from(config.requests_per_second),
            burst: f64::from(config.burst_size),
        }
    }

    pub fn check(&self, client: IpAddr) -> bool {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: IpAddr, now: Instant) -> bool {
        if self.buckets.len() > SWEEP_THRESHOLD {
            self.buckets
                .retain(|_, b| now.duration_since(b.last_update) < IDLE_EVICTION);
        }
        let mut bucket = self
            .buckets
            .entry(client)
            .or_insert_with(|| TokenBucket::new(self.burst, now));
        bucket.try_acquire(self.burst, self.rps, now)
    }
}

/// Middleware answering 429 once a client's bucket is empty. Requests
/// without connection info (in-process tests) pass through.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    match client {
        Some(ip) if !limiter.check(ip) => {
            tracing::warn!(client = %ip, "Rate limit exceeded");
            metrics::record_rate_limited();
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(ErrorBody {
                    error: "rate limit exceeded",
                }),
            )
                .into_response()
        }
        _ => next.run(request).await,
    }
}
