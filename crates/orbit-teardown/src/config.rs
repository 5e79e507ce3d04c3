//! Configuration for a teardown run

use crate::wait::WaitConfig;
use orbit_common::defaults::{
    default_page_size, default_poll_initial_delay_ms, default_poll_max_delay_ms,
    default_wait_timeout_secs,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for one teardown run
///
/// Every field has a default, so an empty document deserializes to the
/// reference behavior: pages of 20, a 5 minute timeout on every wait, and
/// one concurrent worker per server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TeardownConfig {
    /// Page size used when listing each resource kind
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Timeout applied to every individual wait
    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,
    /// First delay between state polls
    #[serde(default = "default_poll_initial_delay_ms")]
    pub poll_initial_delay_ms: u64,
    /// Cap on the delay between state polls
    #[serde(default = "default_poll_max_delay_ms")]
    pub poll_max_delay_ms: u64,
    /// Upper bound on concurrent server workers (unbounded when unset)
    #[serde(default)]
    pub max_concurrent_servers: Option<usize>,
    /// List everything and report what would be deleted, deleting nothing
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for TeardownConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            wait_timeout_secs: default_wait_timeout_secs(),
            poll_initial_delay_ms: default_poll_initial_delay_ms(),
            poll_max_delay_ms: default_poll_max_delay_ms(),
            max_concurrent_servers: None,
            dry_run: false,
        }
    }
}

impl TeardownConfig {
    /// Page size, never zero
    pub fn page_size(&self) -> u32 {
        self.page_size.max(1)
    }

    /// Concurrency bound for the server stage, never zero
    pub fn max_concurrent_servers(&self) -> Option<usize> {
        self.max_concurrent_servers.map(|n| n.max(1))
    }

    /// The single wait configuration threaded through every wait
    pub fn wait_config(&self) -> WaitConfig {
        WaitConfig {
            initial_delay: Duration::from_millis(self.poll_initial_delay_ms),
            max_delay: Duration::from_millis(self.poll_max_delay_ms.max(self.poll_initial_delay_ms)),
            timeout: Duration::from_secs(self.wait_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: TeardownConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, TeardownConfig::default());
        assert_eq!(config.page_size(), 20);
        assert_eq!(config.wait_config().timeout, Duration::from_secs(300));
        assert_eq!(config.max_concurrent_servers(), None);
        assert!(!config.dry_run);
    }

    #[test]
    fn test_overrides() {
        let config: TeardownConfig = serde_json::from_str(
            r#"{"page-size": 50, "wait-timeout-secs": 60, "max-concurrent-servers": 4, "dry-run": true}"#,
        )
        .unwrap();
        assert_eq!(config.page_size(), 50);
        assert_eq!(config.wait_config().timeout, Duration::from_secs(60));
        assert_eq!(config.max_concurrent_servers(), Some(4));
        assert!(config.dry_run);
    }

    #[test]
    fn test_zero_values_are_clamped() {
        let config = TeardownConfig {
            page_size: 0,
            max_concurrent_servers: Some(0),
            ..Default::default()
        };
        assert_eq!(config.page_size(), 1);
        assert_eq!(config.max_concurrent_servers(), Some(1));
    }

    #[test]
    fn test_max_delay_never_below_initial_delay() {
        let config = TeardownConfig {
            poll_initial_delay_ms: 5_000,
            poll_max_delay_ms: 1_000,
            ..Default::default()
        };
        let wait = config.wait_config();
        assert_eq!(wait.initial_delay, Duration::from_secs(5));
        assert_eq!(wait.max_delay, Duration::from_secs(5));
    }
}
