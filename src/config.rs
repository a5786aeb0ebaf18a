//! Runtime configuration.
//!
//! Defaults suit a small deployment; every option can be overridden with a
//! `TASKCAST_*` environment variable. Unparseable values fall back to the
//! default with a warning rather than aborting startup.

use std::time::Duration;

use serde::Serialize;

/// Default HTTP listen port.
pub const DEFAULT_PORT: u16 = 13240;

/// Effective runtime configuration.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Mutating requests permitted per client identity per window.
    pub max_requests: u32,

    /// Fixed rate-limit window length in seconds.
    pub window_secs: u64,

    /// Capacity of each subscriber session's private signal channel.
    /// A publish finding the buffer full is dropped for that subscriber.
    pub subscriber_send_buffer: usize,

    /// HTTP listen port.
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window_secs: 60,
            subscriber_send_buffer: 8,
            port: DEFAULT_PORT,
        }
    }
}

impl Config {
    /// Loads configuration from the environment.
    ///
    /// Recognized variables: `TASKCAST_MAX_REQUESTS`, `TASKCAST_WINDOW_SECS`,
    /// `TASKCAST_SEND_BUFFER`, `TASKCAST_PORT`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_requests: env_parse("TASKCAST_MAX_REQUESTS", defaults.max_requests),
            // A zero-length window would make every request open a fresh
            // window; clamp to one second.
            window_secs: env_parse("TASKCAST_WINDOW_SECS", defaults.window_secs).max(1),
            subscriber_send_buffer: env_parse("TASKCAST_SEND_BUFFER", defaults.subscriber_send_buffer)
                .max(1),
            port: env_parse("TASKCAST_PORT", defaults.port),
        }
    }

    /// Rate-limit window as a [`Duration`].
    pub fn window_length(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Reads and parses one environment variable, falling back to `default`.
fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(value) => match value.trim().parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                tracing::warn!(key, %value, "Unparseable value, using default");
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.max_requests, 60);
        assert_eq!(config.window_secs, 60);
        assert_eq!(config.subscriber_send_buffer, 8);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.window_length(), Duration::from_secs(60));
    }

    #[test]
    fn test_env_parse_reads_set_variable() {
        std::env::set_var("TASKCAST_TEST_MAX", "120");
        assert_eq!(env_parse("TASKCAST_TEST_MAX", 60u32), 120);
        std::env::remove_var("TASKCAST_TEST_MAX");
    }

    #[test]
    fn test_env_parse_falls_back_on_garbage() {
        std::env::set_var("TASKCAST_TEST_GARBAGE", "not-a-number");
        assert_eq!(env_parse("TASKCAST_TEST_GARBAGE", 60u32), 60);
        std::env::remove_var("TASKCAST_TEST_GARBAGE");
    }

    #[test]
    fn test_env_parse_unset_uses_default() {
        assert_eq!(env_parse("TASKCAST_TEST_UNSET", 8usize), 8);
    }

    #[test]
    fn test_config_serializes_for_api() {
        let json = serde_json::to_string(&Config::default()).unwrap();

        assert!(json.contains("max_requests"));
        assert!(json.contains("subscriber_send_buffer"));
    }
}
