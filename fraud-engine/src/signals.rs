//! External signal sources for the velocity and device heuristics

use crate::types::{DeviceReport, RiskSignals, TransactionRiskInput};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::future::Future;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::warn;

/// Transaction history store
#[async_trait]
pub trait TransactionHistory: Send + Sync {
    /// Number of transactions recorded for `user_id` in `[since, until)`,
    /// not counting `exclude_transaction_id`
    async fn recent_transaction_count(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        exclude_transaction_id: &str,
    ) -> Result<u32>;
}

/// Device fingerprinting and IP intelligence
#[async_trait]
pub trait DeviceIntelligence: Send + Sync {
    /// Inspect the device and network a transaction came from
    async fn inspect(
        &self,
        user_id: &str,
        transaction_id: &str,
        fingerprint: Option<&str>,
        ip_address: Option<&str>,
    ) -> Result<DeviceReport>;
}

/// Gathers [`RiskSignals`] from collaborators, each lookup time-bounded.
///
/// Failures and timeouts degrade the affected signal to `None`; collection
/// itself never fails.
pub struct SignalCollector {
    history: Arc<dyn TransactionHistory>,
    devices: Arc<dyn DeviceIntelligence>,
    window: Duration,
    timeout_ms: u64,
}

impl SignalCollector {
    /// Create new signal collector
    pub fn new(
        history: Arc<dyn TransactionHistory>,
        devices: Arc<dyn DeviceIntelligence>,
        window_minutes: i64,
        timeout_ms: u64,
    ) -> Self {
        Self {
            history,
            devices,
            window: Duration::minutes(window_minutes),
            timeout_ms,
        }
    }

    /// Collect signals for one transaction.
    ///
    /// The velocity window trails the transaction's own timestamp (or `now`
    /// when it has none) and never includes the transaction itself.
    pub async fn collect(&self, input: &TransactionRiskInput, now: DateTime<Utc>) -> RiskSignals {
        let reference = input.timestamp.unwrap_or(now);
        let since = reference - self.window;

        let (recent_transactions, device) = tokio::join!(
            self.bounded(
                "transaction history",
                self.history.recent_transaction_count(
                    &input.user_id,
                    since,
                    reference,
                    &input.transaction_id,
                ),
            ),
            self.bounded(
                "device intelligence",
                self.devices.inspect(
                    &input.user_id,
                    &input.transaction_id,
                    input.device_fingerprint.as_deref(),
                    input.ip_address.as_deref(),
                ),
            ),
        );

        RiskSignals {
            recent_transactions,
            device,
        }
    }

    async fn bounded<T, F>(&self, source: &str, lookup: F) -> Option<T>
    where
        F: Future<Output = Result<T>>,
    {
        let result = match timeout(std::time::Duration::from_millis(self.timeout_ms), lookup).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(self.timeout_ms)),
        };

        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Degrading {} signal: {}", source, e);
                None
            }
        }
    }
}
