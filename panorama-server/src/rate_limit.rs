//! Fixed-window rate limiting for the image proxy.
//!
//! Each client IP gets `limit` requests per window. The map is advisory and
//! process-local: it is lost on restart and not shared between instances.
//! Expired windows are swept on every 64th check so the map cannot grow
//! without bound.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use axum::extract::ConnectInfo;
use axum::http::{Extensions, HeaderMap};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Sweep expired windows once every this many checks.
const SWEEP_EVERY: u64 = 64;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Per-IP fixed-window counter.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    limit: u32,
    window: Duration,
    windows: DashMap<IpAddr, Window>,
    checks: AtomicU64,
}

impl FixedWindowLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: DashMap::new(),
            checks: AtomicU64::new(0),
        }
    }

    /// Count one request from `ip`.
    ///
    /// Returns `Err(retry_after)` once the client has used up its window.
    pub fn check(&self, ip: IpAddr) -> Result<(), Duration> {
        self.check_at(ip, Instant::now())
    }

    fn check_at(&self, ip: IpAddr, now: Instant) -> Result<(), Duration> {
        if self.checks.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            self.sweep(now);
        }

        let outcome = match self.windows.entry(ip) {
            Entry::Vacant(vacant) => {
                vacant.insert(Window {
                    started: now,
                    count: 1,
                });
                Ok(())
            }
            Entry::Occupied(mut occupied) => {
                let window = occupied.get_mut();
                let elapsed = now.saturating_duration_since(window.started);
                if elapsed >= self.window {
                    *window = Window {
                        started: now,
                        count: 1,
                    };
                    Ok(())
                } else if window.count < self.limit {
                    window.count += 1;
                    Ok(())
                } else {
                    Err(self.window - elapsed)
                }
            }
        };

        if let Err(retry_after) = outcome {
            tracing::debug!(ip = %ip, retry_after_ms = retry_after.as_millis() as u64, "Image rate limit hit");
        }
        outcome
    }

    /// Drop windows that have ended.
    pub fn sweep(&self, now: Instant) {
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.started) < self.window);
        let evicted = before.saturating_sub(self.windows.len());
        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.windows.len(), "Swept rate limit windows");
        }
    }

    /// Number of tracked clients.
    pub fn tracked(&self) -> usize {
        self.windows.len()
    }
}

/// Whole seconds a client should wait, rounded up and never zero.
pub fn retry_after_secs(retry_after: Duration) -> u64 {
    let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
    secs.max(1)
}

static CONNECT_INFO_WARNED: AtomicBool = AtomicBool::new(false);

/// Resolve the client address for rate limiting.
///
/// Forwarding headers (`CF-Connecting-IP`, then the first `X-Forwarded-For`
/// hop) are only honoured when `trust_proxy_headers` is set. Without
/// connection info every client shares the unspecified address.
pub fn client_ip(headers: &HeaderMap, extensions: &Extensions, trust_proxy_headers: bool) -> IpAddr {
    if trust_proxy_headers {
        let forwarded = headers
            .get("cf-connecting-ip")
            .and_then(|v| v.to_str().ok())
            .or_else(|| {
                headers
                    .get("x-forwarded-for")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.split(',').next())
            })
            .and_then(|s| s.trim().parse::<IpAddr>().ok());
        if let Some(ip) = forwarded {
            return ip;
        }
    }

    match extensions.get::<ConnectInfo<SocketAddr>>() {
        Some(ConnectInfo(addr)) => addr.ip(),
        None => {
            if !CONNECT_INFO_WARNED.swap(true, Ordering::Relaxed) {
                tracing::warn!(
                    "ConnectInfo not available; all image requests share one rate limit bucket"
                );
            }
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[test]
    fn test_allows_up_to_limit_then_rejects() {
        let limiter = FixedWindowLimiter::new(3, Duration::from_secs(60));
        let now = Instant::now();
        for _ in 0..3 {
            assert!(limiter.check_at(ip(1), now).is_ok());
        }
        let retry = limiter
            .check_at(ip(1), now + Duration::from_secs(10))
            .unwrap_err();
        assert_eq!(retry, Duration::from_secs(50));
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();
        assert!(limiter.check_at(ip(1), now).is_ok());
        assert!(limiter.check_at(ip(1), now).is_err());
        assert!(limiter.check_at(ip(2), now).is_ok());
    }

    #[test]
    fn test_window_resets() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();
        assert!(limiter.check_at(ip(1), now).is_ok());
        assert!(limiter.check_at(ip(1), now + Duration::from_secs(59)).is_err());
        assert!(limiter.check_at(ip(1), now + Duration::from_secs(60)).is_ok());
    }

    #[test]
    fn test_sampled_sweep_bounds_map() {
        let limiter = FixedWindowLimiter::new(10, Duration::from_secs(1));
        let start = Instant::now();
        for i in 0..63u8 {
            let _ = limiter.check_at(ip(i), start);
        }
        assert_eq!(limiter.tracked(), 63);

        // 64th check happens after every earlier window ended
        let _ = limiter.check_at(ip(200), start + Duration::from_secs(5));
        assert_eq!(limiter.tracked(), 1);
    }

    #[test]
    fn test_retry_after_secs_rounds_up() {
        assert_eq!(retry_after_secs(Duration::from_millis(1500)), 2);
        assert_eq!(retry_after_secs(Duration::from_secs(3)), 3);
        assert_eq!(retry_after_secs(Duration::ZERO), 1);
    }

    #[test]
    fn test_client_ip_ignores_headers_unless_trusted() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9, 10.0.0.1"));

        let mut extensions = Extensions::new();
        extensions.insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4000))));

        assert_eq!(
            client_ip(&headers, &extensions, false),
            "192.0.2.1".parse::<IpAddr>().unwrap()
        );
        assert_eq!(
            client_ip(&headers, &extensions, true),
            "203.0.113.9".parse::<IpAddr>().unwrap()
        );

        headers.insert("cf-connecting-ip", HeaderValue::from_static("198.51.100.7"));
        assert_eq!(
            client_ip(&headers, &extensions, true),
            "198.51.100.7".parse::<IpAddr>().unwrap()
        );
    }
}
