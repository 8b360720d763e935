/*!
 * Pool Configuration
 *
 * Serializable construction parameters with environment overrides
 */

use super::capacity::{recommended_capacity, WorkloadProfile};
use super::hash::HashAlgorithm;
use super::lock::{DEFAULT_POLL_INTERVAL, MAX_POLL_INTERVAL, MIN_POLL_INTERVAL};
use crate::core::errors::{PoolError, PoolResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const ENV_CAPACITY: &str = "MUTEX_POOL_CAPACITY";
pub const ENV_HASH: &str = "MUTEX_POOL_HASH";
pub const ENV_POLL_INTERVAL_US: &str = "MUTEX_POOL_POLL_INTERVAL_US";

/// Mutex pool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of locks; fixed for the pool's lifetime
    pub capacity: usize,
    /// Content hash applied to every fingerprint before sharding
    pub hash: HashAlgorithm,
    /// How often cancellable acquires re-check their token
    pub poll_interval_us: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::for_workload(WorkloadProfile::default())
    }
}

impl PoolConfig {
    /// Configuration sized for the current machine and `profile`
    pub fn for_workload(profile: WorkloadProfile) -> Self {
        Self::with_capacity(recommended_capacity(profile))
    }

    /// Fixed capacity, default hash and poll interval
    pub const fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            hash: HashAlgorithm::AHash,
            poll_interval_us: DEFAULT_POLL_INTERVAL.as_micros() as u64,
        }
    }

    /// Configuration for few, rarely contended keys
    pub fn low_contention() -> Self {
        Self::for_workload(WorkloadProfile::LowContention)
    }

    /// Configuration for many threads over many keys
    pub fn high_contention() -> Self {
        Self::for_workload(WorkloadProfile::HighContention)
    }

    pub fn hash(mut self, hash: HashAlgorithm) -> Self {
        self.hash = hash;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_us = u64::try_from(interval.as_micros()).unwrap_or(u64::MAX);
        self
    }

    pub fn poll_interval_duration(&self) -> Duration {
        Duration::from_micros(self.poll_interval_us)
    }

    /// Parse a JSON document; missing fields keep their defaults
    pub fn from_json(json: &str) -> PoolResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `MUTEX_POOL_*` environment variables
    pub fn from_env() -> PoolResult<Self> {
        Self::default().with_env_overrides()
    }

    /// Apply `MUTEX_POOL_*` environment variables on top of `self`
    pub fn with_env_overrides(mut self) -> PoolResult<Self> {
        if let Ok(value) = std::env::var(ENV_CAPACITY) {
            self.capacity = value
                .trim()
                .parse()
                .map_err(|e| PoolError::Config(format!("{ENV_CAPACITY}={value}: {e}")))?;
        }
        if let Ok(value) = std::env::var(ENV_HASH) {
            self.hash = value.parse()?;
        }
        if let Ok(value) = std::env::var(ENV_POLL_INTERVAL_US) {
            self.poll_interval_us = value
                .trim()
                .parse()
                .map_err(|e| PoolError::Config(format!("{ENV_POLL_INTERVAL_US}={value}: {e}")))?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> PoolResult<()> {
        if self.capacity == 0 {
            return Err(PoolError::InvalidCapacity(self.capacity));
        }
        let interval = self.poll_interval_duration();
        if !(MIN_POLL_INTERVAL..=MAX_POLL_INTERVAL).contains(&interval) {
            return Err(PoolError::Config(format!(
                "poll_interval_us={} outside {}..={}",
                self.poll_interval_us,
                MIN_POLL_INTERVAL.as_micros(),
                MAX_POLL_INTERVAL.as_micros()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;

    fn clear_env() {
        std::env::remove_var(ENV_CAPACITY);
        std::env::remove_var(ENV_HASH);
        std::env::remove_var(ENV_POLL_INTERVAL_US);
    }

    #[test]
    fn test_default_is_valid() {
        let config = PoolConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.hash, HashAlgorithm::AHash);
        assert_eq!(config.poll_interval_duration(), DEFAULT_POLL_INTERVAL);
    }

    #[test]
    fn test_builder() {
        let config = PoolConfig::with_capacity(3)
            .hash(HashAlgorithm::Md5)
            .poll_interval(Duration::from_micros(250));
        assert_eq!(
            config,
            PoolConfig {
                capacity: 3,
                hash: HashAlgorithm::Md5,
                poll_interval_us: 250,
            }
        );
    }

    #[test]
    fn test_from_json_partial() {
        let config = PoolConfig::from_json(r#"{"capacity": 10, "hash": "sha256"}"#).unwrap();
        assert_eq!(config.capacity, 10);
        assert_eq!(config.hash, HashAlgorithm::Sha256);
        assert_eq!(config.poll_interval_us, 1000);
    }

    #[test]
    fn test_from_json_rejects_zero_capacity() {
        assert_eq!(
            PoolConfig::from_json(r#"{"capacity": 0}"#),
            Err(PoolError::InvalidCapacity(0))
        );
    }

    #[test]
    fn test_from_json_rejects_unknown_hash() {
        assert!(matches!(
            PoolConfig::from_json(r#"{"hash": "whirlpool"}"#),
            Err(PoolError::Config(_))
        ));
    }

    #[test]
    fn test_from_json_rejects_huge_poll_interval() {
        assert!(matches!(
            PoolConfig::from_json(r#"{"capacity": 1, "poll_interval_us": 3600000000}"#),
            Err(PoolError::Config(_))
        ));
    }

    #[test]
    fn test_from_json_rejects_zero_poll_interval() {
        assert!(matches!(
            PoolConfig::from_json(r#"{"capacity": 1, "poll_interval_us": 0}"#),
            Err(PoolError::Config(_))
        ));
    }

    #[test]
    fn test_poll_interval_bounds_accepted() {
        assert!(PoolConfig::with_capacity(1)
            .poll_interval(MAX_POLL_INTERVAL)
            .validate()
            .is_ok());
        assert!(PoolConfig::with_capacity(1)
            .poll_interval(MIN_POLL_INTERVAL)
            .validate()
            .is_ok());
        assert!(PoolConfig::with_capacity(1)
            .poll_interval(Duration::MAX)
            .validate()
            .is_err());
    }

    #[test]
    #[serial]
    fn test_env_huge_poll_interval() {
        clear_env();
        std::env::set_var(ENV_POLL_INTERVAL_US, "3600000000");
        let result = PoolConfig::from_env();
        clear_env();

        assert!(matches!(result, Err(PoolError::Config(_))));
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        std::env::set_var(ENV_CAPACITY, "17");
        std::env::set_var(ENV_HASH, "crc32");
        std::env::set_var(ENV_POLL_INTERVAL_US, "50");

        let config = PoolConfig::from_env().unwrap();
        clear_env();

        assert_eq!(config.capacity, 17);
        assert_eq!(config.hash, HashAlgorithm::Crc32);
        assert_eq!(config.poll_interval_us, 50);
    }

    #[test]
    #[serial]
    fn test_env_invalid_capacity() {
        clear_env();
        std::env::set_var(ENV_CAPACITY, "lots");
        let result = PoolConfig::from_env();
        clear_env();

        assert!(matches!(result, Err(PoolError::Config(_))));
    }

    #[test]
    #[serial]
    fn test_env_zero_capacity() {
        clear_env();
        std::env::set_var(ENV_CAPACITY, "0");
        let result = PoolConfig::from_env();
        clear_env();

        assert_eq!(result, Err(PoolError::InvalidCapacity(0)));
    }

    #[test]
    #[serial]
    fn test_env_absent_keeps_base() {
        clear_env();
        let base = PoolConfig::with_capacity(5).hash(HashAlgorithm::Sha1);
        assert_eq!(base.clone().with_env_overrides().unwrap(), base);
    }
}
