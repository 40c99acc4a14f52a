//! The six scoring rules
//!
//! Each rule maps one aspect of a transaction to a [`RiskFactor`]. Scores and
//! severities are assigned literally per branch; there is no shared severity
//! band.

use crate::config::{contains_ignore_case, ScoringConfig};
use crate::types::{DeviceReport, FactorKind, Location, RiskFactor, Severity};
use chrono::{DateTime, FixedOffset, Timelike, Utc};
use rust_decimal::Decimal;

/// Rule text shown in the capability report
pub fn rule_description(kind: FactorKind) -> &'static str {
    match kind {
        FactorKind::Amount => "amount > 10000 -> 80; > 5000 -> 50; > 1000 -> 20; else 0",
        FactorKind::Velocity => {
            "transactions in trailing window > 7 -> 90; > 4 -> 60; > 2 -> 30; else 0"
        }
        FactorKind::Geographic => {
            "high-risk country -> 85; moderate-risk country -> 45; location absent -> 30; else 0"
        }
        FactorKind::Device => {
            "emulated device -> 95; VPN/proxy -> 60; missing or unrecognized fingerprint -> 40; else 0"
        }
        FactorKind::MerchantCategory => {
            "high-risk category -> 70; moderate-risk category -> 35; else 0"
        }
        FactorKind::TimeOfDay => "local hour within the odd-hour window -> 40; else 0",
    }
}

/// Amount rule
pub fn amount_factor(amount: Decimal) -> RiskFactor {
    let (score, severity, description) = if amount > Decimal::from(10_000) {
        (80, Severity::High, format!("Very large transaction amount: {}", amount))
    } else if amount > Decimal::from(5_000) {
        (50, Severity::Medium, format!("Large transaction amount: {}", amount))
    } else if amount > Decimal::from(1_000) {
        (20, Severity::Low, format!("Elevated transaction amount: {}", amount))
    } else {
        (0, Severity::Low, format!("Normal transaction amount: {}", amount))
    };
    RiskFactor::new(FactorKind::Amount, score, severity, description)
}

/// Velocity rule. `None` means the history store could not be consulted.
pub fn velocity_factor(recent_transactions: Option<u32>, window_minutes: i64) -> RiskFactor {
    let Some(count) = recent_transactions else {
        return RiskFactor::new(
            FactorKind::Velocity,
            0,
            Severity::Low,
            "Transaction history unavailable; velocity not evaluated",
        );
    };

    let (score, severity) = match count {
        c if c > 7 => (90, Severity::Critical),
        c if c > 4 => (60, Severity::High),
        c if c > 2 => (30, Severity::Medium),
        _ => (0, Severity::Low),
    };
    RiskFactor::new(
        FactorKind::Velocity,
        score,
        severity,
        format!("{} transactions in the last {} minutes", count, window_minutes),
    )
}

/// Geographic rule
pub fn geographic_factor(location: Option<&Location>, config: &ScoringConfig) -> RiskFactor {
    let Some(location) = location else {
        return RiskFactor::new(
            FactorKind::Geographic,
            30,
            Severity::Medium,
            "Transaction location unverifiable",
        );
    };

    let country = location.country.as_deref().map(str::trim).unwrap_or_default();
    if contains_ignore_case(&config.high_risk_countries, country) {
        RiskFactor::new(
            FactorKind::Geographic,
            85,
            Severity::High,
            format!("Transaction from high-risk country: {}", country.to_uppercase()),
        )
    } else if contains_ignore_case(&config.moderate_risk_countries, country) {
        RiskFactor::new(
            FactorKind::Geographic,
            45,
            Severity::Medium,
            format!("Transaction from moderate-risk country: {}", country.to_uppercase()),
        )
    } else {
        RiskFactor::new(FactorKind::Geographic, 0, Severity::Low, "Location within normal range")
    }
}

/// Device rule. `report` is `None` when device intelligence was unavailable.
pub fn device_factor(fingerprint: Option<&str>, report: Option<&DeviceReport>) -> RiskFactor {
    let fingerprint = fingerprint.map(str::trim).filter(|f| !f.is_empty());

    if let Some(report) = report {
        if report.emulated {
            return RiskFactor::new(
                FactorKind::Device,
                95,
                Severity::Critical,
                "Emulated or virtual device detected",
            );
        }
        if report.proxy {
            return RiskFactor::new(FactorKind::Device, 60, Severity::High, "VPN or proxy detected");
        }
    }

    match (fingerprint, report) {
        (None, _) => RiskFactor::new(
            FactorKind::Device,
            40,
            Severity::Medium,
            "No device fingerprint supplied",
        ),
        (Some(_), None) => RiskFactor::new(
            FactorKind::Device,
            0,
            Severity::Low,
            "Device intelligence unavailable; device not evaluated",
        ),
        (Some(_), Some(report)) if report.recognized == Some(false) => RiskFactor::new(
            FactorKind::Device,
            40,
            Severity::Medium,
            "Unrecognized device for this user",
        ),
        (Some(_), Some(_)) => {
            RiskFactor::new(FactorKind::Device, 0, Severity::Low, "Known device")
        }
    }
}

/// Merchant category rule
pub fn merchant_factor(category: Option<&str>, config: &ScoringConfig) -> RiskFactor {
    let category = category.map(str::trim).unwrap_or_default();

    if contains_ignore_case(&config.high_risk_merchant_categories, category) {
        RiskFactor::new(
            FactorKind::MerchantCategory,
            70,
            Severity::High,
            format!("High-risk merchant category: {}", category.to_lowercase()),
        )
    } else if contains_ignore_case(&config.moderate_risk_merchant_categories, category) {
        RiskFactor::new(
            FactorKind::MerchantCategory,
            35,
            Severity::Medium,
            format!("Moderate-risk merchant category: {}", category.to_lowercase()),
        )
    } else {
        RiskFactor::new(
            FactorKind::MerchantCategory,
            0,
            Severity::Low,
            "Merchant category within normal range",
        )
    }
}

/// Local hour of `timestamp` under the configured offset
pub fn local_hour(timestamp: DateTime<Utc>, config: &ScoringConfig) -> u32 {
    match FixedOffset::east_opt(config.local_utc_offset_minutes * 60) {
        Some(offset) => timestamp.with_timezone(&offset).hour(),
        None => timestamp.hour(),
    }
}

/// Time-of-day rule
pub fn time_of_day_factor(timestamp: DateTime<Utc>, config: &ScoringConfig) -> RiskFactor {
    let hour = local_hour(timestamp, config);
    if (config.odd_hour_start..=config.odd_hour_end).contains(&hour) {
        RiskFactor::new(
            FactorKind::TimeOfDay,
            40,
            Severity::Medium,
            format!("Transaction at odd hour: {:02}:00", hour),
        )
    } else {
        RiskFactor::new(FactorKind::TimeOfDay, 0, Severity::Low, "Transaction at normal hour")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn location(country: &str) -> Location {
        Location {
            country: Some(country.to_string()),
            city: None,
        }
    }

    #[test]
    fn test_amount_tiers() {
        assert_eq!(amount_factor(Decimal::from(15_000)).score, 80);
        assert_eq!(amount_factor(Decimal::from(10_000)).score, 50);
        assert_eq!(amount_factor(Decimal::from(5_001)).score, 50);
        assert_eq!(amount_factor(Decimal::from(1_001)).score, 20);
        assert_eq!(amount_factor(Decimal::from(1_000)).score, 0);
        assert_eq!(amount_factor(Decimal::ZERO).score, 0);
        assert_eq!(amount_factor(Decimal::from(15_000)).severity, Severity::High);
    }

    #[test]
    fn test_velocity_tiers() {
        assert_eq!(velocity_factor(Some(8), 60).severity, Severity::Critical);
        assert_eq!(velocity_factor(Some(8), 60).score, 90);
        assert_eq!(velocity_factor(Some(7), 60).score, 60);
        assert_eq!(velocity_factor(Some(5), 60).score, 60);
        assert_eq!(velocity_factor(Some(4), 60).score, 30);
        assert_eq!(velocity_factor(Some(2), 60).score, 0);
        assert_eq!(velocity_factor(None, 60).score, 0);
    }

    #[test]
    fn test_geographic_lists() {
        let config = ScoringConfig::default();
        let factor = geographic_factor(Some(&location("ng")), &config);
        assert_eq!((factor.score, factor.severity), (85, Severity::High));

        let factor = geographic_factor(Some(&location("RU")), &config);
        assert_eq!((factor.score, factor.severity), (45, Severity::Medium));

        let factor = geographic_factor(None, &config);
        assert_eq!((factor.score, factor.severity), (30, Severity::Medium));

        assert_eq!(geographic_factor(Some(&location("US")), &config).score, 0);
        assert_eq!(geographic_factor(Some(&location("ZZ-unknown")), &config).score, 0);
    }

    #[test]
    fn test_device_precedence() {
        let emulated = DeviceReport {
            emulated: true,
            proxy: true,
            recognized: Some(false),
        };
        assert_eq!(device_factor(Some("fp"), Some(&emulated)).score, 95);

        let proxy = DeviceReport {
            proxy: true,
            ..Default::default()
        };
        assert_eq!(device_factor(None, Some(&proxy)).score, 60);

        let unknown = DeviceReport {
            recognized: Some(false),
            ..Default::default()
        };
        assert_eq!(device_factor(Some("fp"), Some(&unknown)).score, 40);

        let known = DeviceReport {
            recognized: Some(true),
            ..Default::default()
        };
        assert_eq!(device_factor(Some("fp"), Some(&known)).score, 0);
    }

    #[test]
    fn test_device_missing_fingerprint_vs_degraded_lookup() {
        assert_eq!(device_factor(None, None).score, 40);
        assert_eq!(device_factor(Some("  "), None).score, 40);
        assert_eq!(device_factor(Some("fp"), None).score, 0);
    }

    #[test]
    fn test_merchant_sets() {
        let config = ScoringConfig::default();
        assert_eq!(merchant_factor(Some("Gambling"), &config).score, 70);
        assert_eq!(merchant_factor(Some("wire_transfer"), &config).score, 70);
        assert_eq!(merchant_factor(Some("jewelry"), &config).score, 35);
        assert_eq!(merchant_factor(Some("groceries"), &config).score, 0);
        assert_eq!(merchant_factor(None, &config).score, 0);
    }

    #[test]
    fn test_odd_hours_inclusive() {
        let config = ScoringConfig::default();
        let at = |h| Utc.with_ymd_and_hms(2024, 3, 1, h, 30, 0).unwrap();
        assert_eq!(time_of_day_factor(at(0), &config).score, 0);
        assert_eq!(time_of_day_factor(at(1), &config).score, 40);
        assert_eq!(time_of_day_factor(at(5), &config).score, 40);
        assert_eq!(time_of_day_factor(at(6), &config).score, 0);
    }

    #[test]
    fn test_local_offset_shifts_hour() {
        let config = ScoringConfig {
            local_utc_offset_minutes: -5 * 60,
            ..Default::default()
        };
        // 08:00 UTC is 03:00 at UTC-5
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        assert_eq!(local_hour(ts, &config), 3);
        assert_eq!(time_of_day_factor(ts, &config).score, 40);
    }
}
