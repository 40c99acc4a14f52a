use crate::errors::{ServiceError, ServiceResult};
use config::{ConfigError, Environment, File};
use fraud_engine::ScoringConfig;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub service: ServiceConfig,
}

/// Longest accepted history retention (one year)
pub const MAX_HISTORY_RETENTION_HOURS: i64 = 366 * 24;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServiceConfig {
    /// Feed every successful assessment back into the history and device stores
    pub record_assessed_transactions: bool,
    pub history_retention_hours: i64,
    pub emulator_fingerprints: Vec<String>,
    /// CIDR ranges treated as VPN/proxy/hosting traffic
    pub proxy_networks: Vec<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            record_assessed_transactions: true,
            history_retention_hours: 24,
            emulator_fingerprints: Vec::new(),
            proxy_networks: Vec::new(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8090,
            workers: 4,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            scoring: ScoringConfig::default(),
            service: ServiceConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            // Server defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8090)?
            .set_default("server.workers", 4)?
            // Optional file, e.g. config/fraud-service.toml
            .add_source(File::with_name("config/fraud-service").required(false));

        builder = builder.add_source(Environment::with_prefix("FRAUD_SERVICE").separator("__"));

        // Override from environment variables
        if let Ok(port) = env::var("SERVICE_PORT") {
            builder = builder.set_override("server.port", port)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Check scoring tables and that retained history covers the velocity window
    pub fn validate(&self) -> ServiceResult<()> {
        self.scoring.validate()?;

        let retention = self.service.history_retention_hours;
        if retention <= 0 || retention > MAX_HISTORY_RETENTION_HOURS {
            return Err(ServiceError::ConfigurationError(format!(
                "history retention must be within 1-{} hours, got {}",
                MAX_HISTORY_RETENTION_HOURS, retention
            )));
        }
        if retention * 60 < self.scoring.velocity_window_minutes {
            return Err(ServiceError::ConfigurationError(format!(
                "history retention of {} hours is shorter than the {} minute velocity window",
                retention, self.scoring.velocity_window_minutes
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_sources() {
        let config = Config::from_env().unwrap();
        assert!(!config.server.host.is_empty());
        assert!(config.service.record_assessed_transactions);
        assert_eq!(config.scoring.odd_hour_start, 1);
        assert!(config.scoring.validate().is_ok());
    }

    #[test]
    fn test_default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_retention() {
        for hours in [0, -24, MAX_HISTORY_RETENTION_HOURS + 1, i64::MAX / 60] {
            let mut config = Config::default();
            config.service.history_retention_hours = hours;
            assert!(
                matches!(config.validate(), Err(ServiceError::ConfigurationError(_))),
                "{} accepted",
                hours
            );
        }
    }

    #[test]
    fn test_rejects_retention_shorter_than_window() {
        let mut config = Config::default();
        config.service.history_retention_hours = 1;
        config.scoring.velocity_window_minutes = 90;
        assert!(config.validate().is_err());

        config.scoring.velocity_window_minutes = 60;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_matches_builder_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8090);
        assert_eq!(config.service.history_retention_hours, 24);
    }
}
