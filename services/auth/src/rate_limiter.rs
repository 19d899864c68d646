//! Per-email throttle for password logins

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;

/// Entries are swept once the table grows past this many emails
const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Attempts allowed inside one window
    pub max_attempts: u32,
    pub window: Duration,
    /// How long an email stays locked after exhausting its window
    pub ban: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::from_secs(5 * 60),
            ban: Duration::from_secs(15 * 60),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum LoginState {
    Counting { attempts: u32, since: Instant },
    Banned { until: Instant },
}

/// Shared in-memory attempt counter keyed by normalized email
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    state: Arc<Mutex<HashMap<String, LoginState>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Count a login attempt for `email`.
    ///
    /// Returns the time left on the ban when the attempt must be refused.
    pub async fn check(&self, email: &str) -> Result<(), Duration> {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        if state.len() > PRUNE_THRESHOLD {
            self.prune(&mut state, now);
        }

        let next = match state.get(email).copied() {
            Some(LoginState::Banned { until }) if now < until => return Err(until - now),
            Some(LoginState::Counting { attempts, since })
                if now.duration_since(since) < self.config.window =>
            {
                if attempts >= self.config.max_attempts {
                    warn!(
                        "Locking logins for {} for {}s",
                        email,
                        self.config.ban.as_secs()
                    );
                    state.insert(
                        email.to_string(),
                        LoginState::Banned {
                            until: now + self.config.ban,
                        },
                    );
                    return Err(self.config.ban);
                }
                LoginState::Counting {
                    attempts: attempts + 1,
                    since,
                }
            }
            // no entry, an elapsed window, or an expired ban
            _ => LoginState::Counting {
                attempts: 1,
                since: now,
            },
        };

        state.insert(email.to_string(), next);
        Ok(())
    }

    /// Forget `email` after a successful login
    pub async fn reset(&self, email: &str) {
        self.state.lock().await.remove(email);
    }

    fn prune(&self, state: &mut HashMap<String, LoginState>, now: Instant) {
        let window = self.config.window;
        state.retain(|_, entry| match *entry {
            LoginState::Banned { until } => now < until,
            LoginState::Counting { since, .. } => now.duration_since(since) < window,
        });
    }
}
