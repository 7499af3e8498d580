use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::network::{MonitorConfig, DEFAULT_MAX_BODY_BYTES};
use crate::recording::{RearmPolicy, DEFAULT_HISTORY_LIMIT};

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub host: String,
    /// Completed sessions kept for lookup and export
    pub history_limit: usize,
    pub max_body_bytes: usize,
    /// Unset keeps in-flight requests until a terminal event arrives
    pub inflight_ttl_ms: Option<u64>,
    pub rearm_first_delay_ms: u64,
    pub rearm_second_delay_ms: u64,
    /// How long a re-arm attempt waits for the page to report itself armed
    pub rearm_ack_timeout_ms: u64,
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: parse_var("PORT").unwrap_or(defaults.port),
            host: env::var("HOST").unwrap_or(defaults.host),
            history_limit: parse_var("HISTORY_LIMIT").unwrap_or(defaults.history_limit),
            max_body_bytes: parse_var("MAX_BODY_BYTES").unwrap_or(defaults.max_body_bytes),
            inflight_ttl_ms: parse_var("INFLIGHT_TTL_MS").filter(|ttl| *ttl > 0),
            rearm_first_delay_ms: parse_var("REARM_FIRST_DELAY_MS")
                .unwrap_or(defaults.rearm_first_delay_ms),
            rearm_second_delay_ms: parse_var("REARM_SECOND_DELAY_MS")
                .unwrap_or(defaults.rearm_second_delay_ms),
            rearm_ack_timeout_ms: parse_var("REARM_ACK_TIMEOUT_MS")
                .unwrap_or(defaults.rearm_ack_timeout_ms),
        }
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            max_body_bytes: self.max_body_bytes,
            inflight_ttl_ms: self.inflight_ttl_ms,
            ..MonitorConfig::default()
        }
    }

    pub fn rearm_policy(&self) -> RearmPolicy {
        RearmPolicy {
            retry_delays: vec![
                Duration::from_millis(self.rearm_first_delay_ms),
                Duration::from_millis(self.rearm_second_delay_ms),
            ],
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8765,
            host: "127.0.0.1".to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            inflight_ttl_ms: None,
            rearm_first_delay_ms: 500,
            rearm_second_delay_ms: 1500,
            rearm_ack_timeout_ms: 1000,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid {}={:?}", name, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_policy_defaults() {
        let config = Config::default();
        assert_eq!(
            config.rearm_policy().retry_delays,
            RearmPolicy::default().retry_delays
        );
        assert_eq!(config.monitor_config().inflight_ttl_ms, None);
        assert_eq!(config.history_limit, DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        env::set_var("SCRIPTSMITH_TEST_PORT", "not-a-port");
        assert_eq!(parse_var::<u16>("SCRIPTSMITH_TEST_PORT"), None);
        env::set_var("SCRIPTSMITH_TEST_PORT", " 9000 ");
        assert_eq!(parse_var::<u16>("SCRIPTSMITH_TEST_PORT"), Some(9000));
        env::remove_var("SCRIPTSMITH_TEST_PORT");
    }
}
