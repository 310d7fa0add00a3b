//! Landing engine tuning and environment-based loading.

use std::time::Duration;

use crate::ledger::{Commitment, RecordOptions, SendOptions, SimulateOptions, StatusOptions};

/// Tuning for one [`crate::TxLander`].
#[derive(Debug, Clone, PartialEq)]
pub struct LandingConfig {
    /// Delay between background re-submissions.
    pub resend_interval: Duration,
    /// Delay between signature status polls.
    pub status_poll_interval: Duration,
    /// Commitment that counts as confirmed.
    pub confirm_commitment: Commitment,
    /// Options for every `sendTransaction`.
    pub send_options: SendOptions,
    /// Options for status polls.
    pub status_options: StatusOptions,
    /// Options for finalized record lookups.
    pub record_options: RecordOptions,
    /// Record fetch retry policy.
    pub record_retry: RecordRetryPolicy,
    /// Simulate before the first broadcast when true.
    pub simulate_before_send: bool,
    /// Options for the optional simulation.
    pub simulate_options: SimulateOptions,
}

impl Default for LandingConfig {
    fn default() -> Self {
        Self {
            resend_interval: Duration::from_millis(2_000),
            status_poll_interval: Duration::from_millis(2_000),
            confirm_commitment: Commitment::Confirmed,
            send_options: SendOptions::default(),
            status_options: StatusOptions::default(),
            record_options: RecordOptions::default(),
            record_retry: RecordRetryPolicy::default(),
            simulate_before_send: false,
            simulate_options: SimulateOptions::default(),
        }
    }
}

impl LandingConfig {
    /// Returns this config with bounded minimums.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            resend_interval: self.resend_interval.max(Duration::from_millis(1)),
            status_poll_interval: self.status_poll_interval.max(Duration::from_millis(1)),
            record_retry: self.record_retry.normalized(),
            ..self
        }
    }

    /// Loads defaults overridden by `TX_LANDER_*` environment variables.
    ///
    /// Absent or unparsable values keep their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads defaults overridden by values returned from `lookup`.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let read_ms = |name: &str, default: Duration| {
            lookup(name)
                .and_then(|value| value.trim().parse::<u64>().ok())
                .filter(|value| *value > 0)
                .map_or(default, Duration::from_millis)
        };
        let read_bool = |name: &str, default: bool| {
            lookup(name)
                .map(|value| matches!(value.trim(), "1" | "true" | "TRUE" | "yes" | "YES"))
                .unwrap_or(default)
        };

        let record_retry = RecordRetryPolicy {
            max_attempts: lookup("TX_LANDER_RECORD_FETCH_ATTEMPTS")
                .and_then(|value| value.trim().parse::<u32>().ok())
                .filter(|value| *value > 0)
                .unwrap_or(defaults.record_retry.max_attempts),
            min_backoff: read_ms(
                "TX_LANDER_RECORD_FETCH_MIN_BACKOFF_MS",
                defaults.record_retry.min_backoff,
            ),
            max_backoff: read_ms(
                "TX_LANDER_RECORD_FETCH_MAX_BACKOFF_MS",
                defaults.record_retry.max_backoff,
            ),
            factor: defaults.record_retry.factor,
        };

        Self {
            resend_interval: read_ms("TX_LANDER_RESEND_INTERVAL_MS", defaults.resend_interval),
            status_poll_interval: read_ms(
                "TX_LANDER_STATUS_POLL_INTERVAL_MS",
                defaults.status_poll_interval,
            ),
            send_options: SendOptions {
                skip_preflight: read_bool(
                    "TX_LANDER_SKIP_PREFLIGHT",
                    defaults.send_options.skip_preflight,
                ),
                ..defaults.send_options
            },
            record_retry,
            simulate_before_send: read_bool(
                "TX_LANDER_SIMULATE_BEFORE_SEND",
                defaults.simulate_before_send,
            ),
            ..Self::default()
        }
        .normalized()
    }

    /// Sets the resend cadence.
    #[must_use]
    pub fn with_resend_interval(mut self, interval: Duration) -> Self {
        self.resend_interval = interval;
        self.normalized()
    }

    /// Sets the status poll cadence.
    #[must_use]
    pub fn with_status_poll_interval(mut self, interval: Duration) -> Self {
        self.status_poll_interval = interval;
        self.normalized()
    }

    /// Sets the record fetch retry policy.
    #[must_use]
    pub fn with_record_retry(mut self, policy: RecordRetryPolicy) -> Self {
        self.record_retry = policy;
        self.normalized()
    }

    /// Enables or disables preflight simulation before the first broadcast.
    #[must_use]
    pub const fn with_simulation(mut self, enabled: bool) -> Self {
        self.simulate_before_send = enabled;
        self
    }

    /// Sets `sendTransaction` options.
    #[must_use]
    pub fn with_send_options(mut self, options: SendOptions) -> Self {
        self.send_options = options;
        self
    }
}

/// Bounded backoff used while a confirmed record is not yet visible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordRetryPolicy {
    /// Total fetch attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; also the floor of every delay.
    pub min_backoff: Duration,
    /// Ceiling of every delay.
    pub max_backoff: Duration,
    /// Growth factor between consecutive delays.
    pub factor: f64,
}

impl Default for RecordRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            min_backoff: Duration::from_millis(1_000),
            max_backoff: Duration::from_millis(8_000),
            factor: 2.0,
        }
    }
}

impl RecordRetryPolicy {
    /// Returns this policy with bounded minimums.
    #[must_use]
    pub fn normalized(self) -> Self {
        let min_backoff = self.min_backoff.max(Duration::from_millis(1));
        Self {
            max_attempts: self.max_attempts.max(1),
            min_backoff,
            max_backoff: self.max_backoff.max(min_backoff),
            factor: if self.factor.is_finite() && self.factor >= 1.0 {
                self.factor
            } else {
                1.0
            },
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let policy = self.normalized();
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let scaled = policy.min_backoff.as_secs_f64() * policy.factor.powi(exponent);
        let capped = scaled.min(policy.max_backoff.as_secs_f64());
        Duration::try_from_secs_f64(capped)
            .unwrap_or(policy.max_backoff)
            .clamp(policy.min_backoff, policy.max_backoff)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_match_landing_cadence() {
        let config = LandingConfig::default();
        assert_eq!(config.resend_interval, Duration::from_millis(2_000));
        assert_eq!(config.status_poll_interval, Duration::from_millis(2_000));
        assert_eq!(config.confirm_commitment, Commitment::Confirmed);
        assert!(config.send_options.skip_preflight);
        assert!(!config.status_options.search_transaction_history);
        assert_eq!(config.record_options.commitment, Commitment::Confirmed);
        assert_eq!(config.record_options.max_supported_transaction_version, Some(0));
        assert_eq!(config.record_retry.max_attempts, 5);
        assert!(!config.simulate_before_send);
    }

    #[test]
    fn backoff_grows_and_stays_within_bounds() {
        let policy = RecordRetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_millis(1_000));
        assert_eq!(policy.delay_after(2), Duration::from_millis(2_000));
        assert_eq!(policy.delay_after(3), Duration::from_millis(4_000));
        assert_eq!(policy.delay_after(4), Duration::from_millis(8_000));
        assert_eq!(policy.delay_after(9), Duration::from_millis(8_000));
    }

    #[test]
    fn degenerate_policy_is_normalized() {
        let policy = RecordRetryPolicy {
            max_attempts: 0,
            min_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            factor: f64::NAN,
        }
        .normalized();
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.min_backoff, Duration::from_millis(1));
        assert_eq!(policy.max_backoff, Duration::from_millis(1));
        assert!((policy.factor - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn lookup_overrides_defaults_and_ignores_garbage() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("TX_LANDER_RESEND_INTERVAL_MS", "500"),
            ("TX_LANDER_STATUS_POLL_INTERVAL_MS", "not-a-number"),
            ("TX_LANDER_RECORD_FETCH_ATTEMPTS", "7"),
            ("TX_LANDER_SIMULATE_BEFORE_SEND", "true"),
            ("TX_LANDER_SKIP_PREFLIGHT", "no"),
        ]);
        let config =
            LandingConfig::from_lookup(|name| env.get(name).map(|value| (*value).to_owned()));
        assert_eq!(config.resend_interval, Duration::from_millis(500));
        assert_eq!(config.status_poll_interval, Duration::from_millis(2_000));
        assert_eq!(config.record_retry.max_attempts, 7);
        assert!(config.simulate_before_send);
        assert!(!config.send_options.skip_preflight);
    }
}
