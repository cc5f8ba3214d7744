//! Gateway configuration
//!
//! Timing and identity settings with sensible defaults.

use std::time::Duration;

use crate::constants::{
    DEFAULT_HANDSHAKE_RETRY_MS, DEFAULT_ORIGIN_CODE, DEFAULT_READ_TIMEOUT,
    DEFAULT_SCHEDULE_QUIET_SECS,
};
use crate::error::{Error, Result};

/// Main configuration for a culw gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Two hex digits identifying this controller in outbound FHT commands
    pub origin_code: String,

    /// Wait for the version reply before the request is re-sent
    pub handshake_retry: Duration,

    /// Quiet period after the last program fragment before the weekly
    /// program of a thermostat is emitted
    pub schedule_quiet_period: Duration,

    /// Report every warning flag on each 0x44 frame instead of changes only
    pub report_unchanged_warnings: bool,

    /// Read poll interval when no deadline is pending
    pub read_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            origin_code: DEFAULT_ORIGIN_CODE.to_string(),
            handshake_retry: Duration::from_millis(DEFAULT_HANDSHAKE_RETRY_MS),
            schedule_quiet_period: Duration::from_secs(DEFAULT_SCHEDULE_QUIET_SECS),
            report_unchanged_warnings: false,
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the configuration
    pub fn validate(&self) -> Result<()> {
        let origin_ok = self.origin_code.len() == 2
            && self.origin_code.chars().all(|c| c.is_ascii_hexdigit());
        if !origin_ok {
            return Err(Error::InvalidConfig(format!(
                "origin code must be two hex digits, got {:?}",
                self.origin_code
            )));
        }

        if self.handshake_retry.is_zero() {
            return Err(Error::InvalidConfig("handshake retry must be greater than zero".into()));
        }

        if self.schedule_quiet_period.is_zero() {
            return Err(Error::InvalidConfig(
                "schedule quiet period must be greater than zero".into(),
            ));
        }

        if self.read_timeout.is_zero() {
            return Err(Error::InvalidConfig("read timeout must be greater than zero".into()));
        }

        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the origin code of outbound FHT commands
    pub fn origin_code(mut self, code: impl Into<String>) -> Self {
        self.config.origin_code = code.into();
        self
    }

    /// Set the version request retry interval
    pub fn handshake_retry(mut self, interval: Duration) -> Self {
        self.config.handshake_retry = interval;
        self
    }

    /// Set the weekly program quiet period
    pub fn schedule_quiet_period(mut self, period: Duration) -> Self {
        self.config.schedule_quiet_period = period;
        self
    }

    /// Report all warning flags on every warning frame
    pub fn report_unchanged_warnings(mut self, enabled: bool) -> Self {
        self.config.report_unchanged_warnings = enabled;
        self
    }

    /// Set the read poll interval
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    /// Validate and build the config
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.origin_code, "77");
        assert_eq!(config.handshake_retry, Duration::from_secs(5));
        assert_eq!(config.schedule_quiet_period, Duration::from_secs(20));
        assert!(!config.report_unchanged_warnings);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = Config::builder()
            .origin_code("1f")
            .schedule_quiet_period(Duration::from_secs(2))
            .report_unchanged_warnings(true)
            .build()
            .unwrap();

        assert_eq!(config.origin_code, "1f");
        assert_eq!(config.schedule_quiet_period, Duration::from_secs(2));
        assert!(config.report_unchanged_warnings);
    }

    #[test]
    fn test_invalid_origin_code() {
        assert!(Config::builder().origin_code("7").build().is_err());
        assert!(Config::builder().origin_code("zz").build().is_err());
        assert!(Config::builder().origin_code("777").build().is_err());
    }

    #[test]
    fn test_zero_durations_rejected() {
        let result = Config::builder().handshake_retry(Duration::ZERO).build();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));

        let result = Config::builder().schedule_quiet_period(Duration::ZERO).build();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }
}
