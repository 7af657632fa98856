use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::state::SharedState;

/// Failed logins allowed per window before the login is locked out.
pub const MAX_LOGIN_FAILURES: u32 = 5;
pub const LOGIN_WINDOW: Duration = Duration::from_secs(15 * 60);
const CLEANUP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Per-login brute force limiter, keyed on the lowercased username or email.
pub struct LoginRateLimiter {
    /// login -> (failed_count, window_start)
    entries: DashMap<String, (u32, Instant)>,
    max_failures: u32,
    window: Duration,
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new(MAX_LOGIN_FAILURES, LOGIN_WINDOW)
    }
}

impl LoginRateLimiter {
    pub fn new(max_failures: u32, window: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            max_failures,
            window,
        }
    }

    /// Ok while the login may still try; otherwise the seconds until it may.
    /// Does not count the attempt; call `record_failure` on a bad password.
    pub fn check(&self, login: &str) -> Result<(), u64> {
        let now = Instant::now();

        let Some(entry) = self.entries.get(&login.to_lowercase()) else {
            return Ok(());
        };
        let (count, start) = entry.value();

        if now.duration_since(*start) > self.window {
            return Ok(());
        }

        if *count >= self.max_failures {
            let elapsed = now.duration_since(*start).as_secs();
            return Err(self.window.as_secs().saturating_sub(elapsed));
        }

        Ok(())
    }

    pub fn record_failure(&self, login: &str) {
        let now = Instant::now();

        let mut entry = self.entries.entry(login.to_lowercase()).or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > self.window {
            *count = 1;
            *start = now;
        } else {
            *count += 1;
        }
    }

    /// Forget a login after it authenticates successfully.
    pub fn reset(&self, login: &str) {
        self.entries.remove(&login.to_lowercase());
    }

    pub fn cleanup(&self) {
        let now = Instant::now();
        let window = self.window;
        self.entries.retain(|_, (_, start)| now.duration_since(*start) < window);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Background task: prune stale limiter entries and expired refresh tokens.
pub fn spawn_cleanup(state: SharedState) -> tokio::task::JoinHandle<()> {
    let state = Arc::clone(&state);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            state.login_limiter.cleanup();
            if !state.login_limiter.is_empty() {
                tracing::debug!(tracked = state.login_limiter.len(), "Login limiter pruned");
            }
            match crate::db::refresh_tokens::purge_expired(&state.pool).await {
                Ok(0) => {}
                Ok(n) => tracing::debug!("Removed {n} expired refresh tokens"),
                Err(e) => tracing::warn!("Refresh token cleanup failed: {e}"),
            }
        }
    })
}
