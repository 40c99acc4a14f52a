//! In-memory transaction history backing the velocity heuristic

use crate::signals::TransactionHistory;
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Transaction record for velocity tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TransactionRecord {
    transaction_id: String,
    amount: Decimal,
    timestamp: DateTime<Utc>,
}

/// Per-user history
struct UserHistory {
    transactions: Vec<TransactionRecord>,
}

impl UserHistory {
    fn new() -> Self {
        Self {
            transactions: Vec::new(),
        }
    }

    /// Drop transactions older than `retention` before the newest one
    fn prune(&mut self, retention: Duration) {
        if let Some(newest) = self.newest() {
            let cutoff = newest - retention;
            self.transactions.retain(|tx| tx.timestamp >= cutoff);
        }
    }

    /// Record a transaction; re-recording the same id is a no-op
    fn add_transaction(&mut self, transaction_id: &str, amount: Decimal, timestamp: DateTime<Utc>) -> bool {
        if self.transactions.iter().any(|tx| tx.transaction_id == transaction_id) {
            return false;
        }
        self.transactions.push(TransactionRecord {
            transaction_id: transaction_id.to_string(),
            amount,
            timestamp,
        });
        true
    }

    /// Records in `[since, until)`
    fn in_window(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> impl Iterator<Item = &TransactionRecord> {
        self.transactions
            .iter()
            .filter(move |tx| tx.timestamp >= since && tx.timestamp < until)
    }

    fn newest(&self) -> Option<DateTime<Utc>> {
        self.transactions.iter().map(|tx| tx.timestamp).max()
    }
}

/// Transaction history held in process memory, keyed by user.
///
/// Whenever a user is written to, records older than the retention period
/// (measured from that user's newest record) are pruned.
pub struct InMemoryTransactionHistory {
    retention: Duration,
    // Map: user_id -> UserHistory
    users: Arc<DashMap<String, UserHistory>>,
}

impl InMemoryTransactionHistory {
    /// Create new history with the given retention
    pub fn new(retention_hours: i64) -> Self {
        Self {
            retention: Duration::hours(retention_hours),
            users: Arc::new(DashMap::new()),
        }
    }

    /// Record a completed transaction. Returns false if the id was already recorded for the user.
    pub fn record(&self, user_id: &str, transaction_id: &str, amount: Decimal, timestamp: DateTime<Utc>) -> bool {
        let mut entry = self.users.entry(user_id.to_string()).or_insert_with(UserHistory::new);
        let history = entry.value_mut();
        let added = history.add_transaction(transaction_id, amount, timestamp);
        history.prune(self.retention);
        added
    }

    /// Count transactions for `user_id` in `[since, until)`, skipping `exclude_transaction_id`
    pub fn count_between(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        exclude_transaction_id: &str,
    ) -> u32 {
        self.users
            .get(user_id)
            .map(|entry| {
                entry
                    .value()
                    .in_window(since, until)
                    .filter(|tx| tx.transaction_id != exclude_transaction_id)
                    .count() as u32
            })
            .unwrap_or(0)
    }

    /// Statistics for the window ending at the user's newest record (inclusive)
    pub fn stats(&self, user_id: &str, window_minutes: i64) -> Option<VelocityStats> {
        self.users.get(user_id).and_then(|entry| {
            let history = entry.value();
            let window_end = history.newest()?;
            let window_start = window_end - Duration::minutes(window_minutes);
            let in_window = || {
                history
                    .transactions
                    .iter()
                    .filter(move |tx| tx.timestamp >= window_start && tx.timestamp <= window_end)
            };

            Some(VelocityStats {
                user_id: user_id.to_string(),
                transaction_count: in_window().count() as u32,
                total_amount: in_window().map(|tx| tx.amount).sum(),
                window_start,
                window_end,
            })
        })
    }

    /// Clear history for a user
    pub fn reset_user(&self, user_id: &str) {
        self.users.remove(user_id);
    }

    /// Number of users with recorded history
    pub fn tracked_users(&self) -> usize {
        self.users.len()
    }
}

impl Default for InMemoryTransactionHistory {
    fn default() -> Self {
        Self::new(24)
    }
}

#[async_trait]
impl TransactionHistory for InMemoryTransactionHistory {
    async fn recent_transaction_count(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        exclude_transaction_id: &str,
    ) -> Result<u32> {
        Ok(self.count_between(user_id, since, until, exclude_transaction_id))
    }
}

/// Velocity statistics for a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VelocityStats {
    pub user_id: String,
    pub transaction_count: u32,
    pub total_amount: Decimal,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
}
