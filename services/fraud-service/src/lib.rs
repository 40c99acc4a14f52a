pub mod config;
pub mod errors;
pub mod handlers;
pub mod metrics;
pub mod models;

use crate::config::Config;
use crate::errors::ServiceResult;
use fraud_engine::{
    FraudAssessor, InMemoryDeviceIntelligence, InMemoryTransactionHistory, RiskScorer,
    SignalCollector,
};
use std::sync::Arc;
use std::time::Instant;

/// Shared service state, built once from configuration
pub struct AppState {
    pub assessor: FraudAssessor,
    pub history: Arc<InMemoryTransactionHistory>,
    pub devices: Arc<InMemoryDeviceIntelligence>,
    pub record_assessed_transactions: bool,
    pub started_at: Instant,
}

impl AppState {
    pub fn from_config(config: &Config) -> ServiceResult<Self> {
        config.validate()?;

        let history = Arc::new(InMemoryTransactionHistory::new(
            config.service.history_retention_hours,
        ));
        let devices = Arc::new(InMemoryDeviceIntelligence::from_config(
            config.service.emulator_fingerprints.clone(),
            &config.service.proxy_networks,
        )?);

        let collector = SignalCollector::new(
            history.clone(),
            devices.clone(),
            config.scoring.velocity_window_minutes,
            config.scoring.lookup_timeout_ms,
        );
        let assessor = FraudAssessor::new(RiskScorer::new(config.scoring.clone()), collector);

        Ok(Self {
            assessor,
            history,
            devices,
            record_assessed_transactions: config.service.record_assessed_transactions,
            started_at: Instant::now(),
        })
    }
}
