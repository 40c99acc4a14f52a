//! Scoring rule tables and collaborator budgets

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Longest accepted velocity window (one week)
pub const MAX_VELOCITY_WINDOW_MINUTES: i64 = 7 * 24 * 60;

/// Scoring configuration
///
/// Weights and score values are fixed in code; this only carries the
/// lookup tables and time settings the rules consult.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Countries scored 85 by the geographic rule
    pub high_risk_countries: Vec<String>,

    /// Countries scored 45 by the geographic rule
    pub moderate_risk_countries: Vec<String>,

    /// Merchant categories scored 70
    pub high_risk_merchant_categories: Vec<String>,

    /// Merchant categories scored 35
    pub moderate_risk_merchant_categories: Vec<String>,

    /// First odd hour (inclusive, local time)
    pub odd_hour_start: u32,

    /// Last odd hour (inclusive, local time)
    pub odd_hour_end: u32,

    /// Offset applied to UTC timestamps to get local time
    pub local_utc_offset_minutes: i32,

    /// Trailing window for the velocity count
    pub velocity_window_minutes: i64,

    /// Per-lookup time budget for collaborators
    pub lookup_timeout_ms: u64,

    /// Label reported in assessment metadata
    pub model_version: String,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            high_risk_countries: strings(&["NG", "KP", "IR", "SY", "AF", "MM", "VE", "YE"]),
            moderate_risk_countries: strings(&["RU", "CN", "PK", "UA", "BY", "KH", "LA", "PH"]),
            high_risk_merchant_categories: strings(&["gambling", "crypto", "adult", "wire_transfer"]),
            moderate_risk_merchant_categories: strings(&["travel", "jewelry", "electronics"]),
            odd_hour_start: 1,
            odd_hour_end: 5,
            local_utc_offset_minutes: 0,
            velocity_window_minutes: 60,
            lookup_timeout_ms: 250,
            model_version: "weighted-rules-v1".to_string(),
        }
    }
}

impl ScoringConfig {
    /// Reject inconsistent tables
    pub fn validate(&self) -> Result<()> {
        if self.odd_hour_start > 23 || self.odd_hour_end > 23 {
            return Err(Error::InvalidConfig(format!(
                "odd hours must be within 0-23, got {}-{}",
                self.odd_hour_start, self.odd_hour_end
            )));
        }
        if self.odd_hour_start > self.odd_hour_end {
            return Err(Error::InvalidConfig(format!(
                "odd hour range is empty: {}-{}",
                self.odd_hour_start, self.odd_hour_end
            )));
        }
        if self.local_utc_offset_minutes.abs() >= 24 * 60 {
            return Err(Error::InvalidConfig(format!(
                "UTC offset out of range: {} minutes",
                self.local_utc_offset_minutes
            )));
        }
        if self.velocity_window_minutes <= 0 || self.velocity_window_minutes > MAX_VELOCITY_WINDOW_MINUTES {
            return Err(Error::InvalidConfig(format!(
                "velocity window must be within 1-{} minutes, got {}",
                MAX_VELOCITY_WINDOW_MINUTES, self.velocity_window_minutes
            )));
        }
        if self.lookup_timeout_ms == 0 {
            return Err(Error::InvalidConfig("lookup timeout must be positive".to_string()));
        }

        if let Some(country) = self
            .high_risk_countries
            .iter()
            .find(|c| contains_ignore_case(&self.moderate_risk_countries, c))
        {
            return Err(Error::InvalidConfig(format!(
                "country {} is listed as both high and moderate risk",
                country
            )));
        }
        if let Some(category) = self
            .high_risk_merchant_categories
            .iter()
            .find(|c| contains_ignore_case(&self.moderate_risk_merchant_categories, c))
        {
            return Err(Error::InvalidConfig(format!(
                "merchant category {} is listed as both high and moderate risk",
                category
            )));
        }

        Ok(())
    }
}

/// Case-insensitive, whitespace-trimmed membership
pub(crate) fn contains_ignore_case(list: &[String], value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && list.iter().any(|item| item.trim().eq_ignore_ascii_case(value))
}
