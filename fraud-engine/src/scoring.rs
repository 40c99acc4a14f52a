//! Weighted multi-factor risk scorer

use crate::config::ScoringConfig;
use crate::heuristics;
use crate::types::*;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Risk scorer
///
/// Pure: the result depends only on the input, the supplied signals and the
/// reference time.
#[derive(Debug, Clone)]
pub struct RiskScorer {
    config: ScoringConfig,
}

impl RiskScorer {
    /// Create new risk scorer
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Scoring configuration
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Evaluate all six heuristics
    pub fn evaluate_factors(
        &self,
        input: &TransactionRiskInput,
        signals: &RiskSignals,
        now: DateTime<Utc>,
    ) -> Vec<RiskFactor> {
        let timestamp = input.timestamp.unwrap_or(now);

        vec![
            heuristics::amount_factor(input.amount),
            heuristics::velocity_factor(
                signals.recent_transactions,
                self.config.velocity_window_minutes,
            ),
            heuristics::geographic_factor(input.location.as_ref(), &self.config),
            heuristics::device_factor(input.device_fingerprint.as_deref(), signals.device.as_ref()),
            heuristics::merchant_factor(input.merchant_category.as_deref(), &self.config),
            heuristics::time_of_day_factor(timestamp, &self.config),
        ]
    }

    /// Assess transaction risk
    pub fn score(
        &self,
        input: &TransactionRiskInput,
        signals: &RiskSignals,
        now: DateTime<Utc>,
    ) -> RiskAssessment {
        let factors = self.evaluate_factors(input, signals, now);
        for factor in &factors {
            debug!(
                "Factor {} scored {} ({:?}): {}",
                factor.name, factor.score, factor.severity, factor.description
            );
        }

        let fraud_score = aggregate(&factors);
        let recommended_action = RecommendedAction::from_score(fraud_score);

        let evidence: Vec<RiskFactor> = factors
            .iter()
            .filter(|f| f.severity.is_evidence())
            .cloned()
            .collect();

        let patterns: Vec<String> = factors
            .iter()
            .filter(|f| f.score > 30)
            .map(|f| f.description.clone())
            .collect();

        let mut degraded_signals = Vec::new();
        if signals.recent_transactions.is_none() {
            degraded_signals.push(FactorKind::Velocity);
        }
        if signals.device.is_none() {
            degraded_signals.push(FactorKind::Device);
        }

        let confidence = confidence(&factors, degraded_signals.len());

        info!(
            "Fraud score calculated: {} (action: {}) for transaction {}",
            fraud_score.value(),
            recommended_action.as_str(),
            input.transaction_id
        );

        RiskAssessment {
            transaction_id: input.transaction_id.clone(),
            is_fraudulent: fraud_score.is_fraudulent(),
            fraud_score,
            recommended_action,
            evidence,
            patterns,
            factors,
            metadata: AssessmentMetadata {
                assessment_id: None,
                confidence,
                model_version: self.config.model_version.clone(),
                processing_time_ms: 0,
                assessed_at: now,
                degraded_signals,
            },
        }
    }

    /// Fixed configuration report
    pub fn capabilities(&self) -> ScorerCapabilities {
        ScorerCapabilities {
            model_version: self.config.model_version.clone(),
            heuristics: FactorKind::ALL
                .iter()
                .map(|kind| HeuristicDescriptor {
                    kind: *kind,
                    name: kind.label().to_string(),
                    weight: kind.weight(),
                    rule: heuristics::rule_description(*kind).to_string(),
                })
                .collect(),
            action_thresholds: RecommendedAction::THRESHOLDS
                .iter()
                .map(|(action, min_score)| ActionThreshold {
                    action: *action,
                    min_score: *min_score,
                })
                .collect(),
            fraud_threshold: FRAUD_THRESHOLD,
        }
    }
}

impl Default for RiskScorer {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

/// Weighted sum normalized by the maximum achievable weighted sum
pub fn aggregate(factors: &[RiskFactor]) -> FraudScore {
    let weighted: f64 = factors.iter().map(|f| f64::from(f.score) * f.weight).sum();
    let max: f64 = factors.iter().map(|f| 100.0 * f.weight).sum();

    if max <= 0.0 {
        return FraudScore::new(0);
    }

    let normalized = (100.0 * weighted / max).round().clamp(0.0, 100.0);
    FraudScore::new(normalized as u8)
}

fn confidence(factors: &[RiskFactor], degraded: usize) -> f64 {
    if factors.is_empty() {
        return 0.0;
    }

    let decisiveness: f64 = factors
        .iter()
        .map(|f| (f64::from(f.score) - 50.0).abs() / 50.0)
        .sum::<f64>()
        / factors.len() as f64;

    (0.5 + decisiveness * 0.5 - 0.1 * degraded as f64).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn clean_signals() -> RiskSignals {
        RiskSignals {
            recent_transactions: Some(0),
            device: Some(DeviceReport {
                recognized: Some(true),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_clean_transaction_approved() {
        let scorer = RiskScorer::default();
        let mut input = TransactionRiskInput::new("tx-1", "user-1", Decimal::from(50));
        input.location = Some(Location {
            country: Some("US".into()),
            city: Some("Austin".into()),
        });
        input.device_fingerprint = Some("fp-known".into());
        input.merchant_category = Some("groceries".into());

        let assessment = scorer.score(&input, &clean_signals(), noon());

        assert_eq!(assessment.fraud_score.value(), 0);
        assert_eq!(assessment.recommended_action, RecommendedAction::Approve);
        assert!(!assessment.is_fraudulent);
        assert!(assessment.evidence.is_empty());
        assert!(assessment.patterns.is_empty());
        assert_eq!(assessment.factors.len(), 6);
        assert!(assessment.metadata.degraded_signals.is_empty());
    }

    #[test]
    fn test_aggregate_is_weighted_average() {
        let factors = vec![
            RiskFactor::new(FactorKind::Amount, 80, Severity::High, "a"),
            RiskFactor::new(FactorKind::Velocity, 90, Severity::Critical, "v"),
            RiskFactor::new(FactorKind::Geographic, 85, Severity::High, "g"),
            RiskFactor::new(FactorKind::Device, 95, Severity::Critical, "d"),
            RiskFactor::new(FactorKind::MerchantCategory, 70, Severity::High, "m"),
            RiskFactor::new(FactorKind::TimeOfDay, 40, Severity::Medium, "t"),
        ];
        // 20 + 18 + 17 + 14.25 + 7 + 4 = 80.25
        assert_eq!(aggregate(&factors).value(), 80);
    }

    #[test]
    fn test_aggregate_robust_to_partial_weights() {
        // Two factors only: max sum is 45, weighted sum is 0.25*80 = 20
        let factors = vec![
            RiskFactor::new(FactorKind::Amount, 80, Severity::High, "a"),
            RiskFactor::new(FactorKind::Velocity, 0, Severity::Low, "v"),
        ];
        assert_eq!(aggregate(&factors).value(), 44);
        assert_eq!(aggregate(&[]).value(), 0);
    }

    #[test]
    fn test_worst_case_blocks() {
        let scorer = RiskScorer::default();
        let mut input = TransactionRiskInput::new("tx-2", "user-2", Decimal::from(20_000));
        input.location = Some(Location {
            country: Some("KP".into()),
            city: None,
        });
        input.device_fingerprint = Some("fp".into());
        input.merchant_category = Some("crypto".into());
        input.timestamp = Some(Utc.with_ymd_and_hms(2024, 3, 1, 3, 0, 0).unwrap());

        let signals = RiskSignals {
            recent_transactions: Some(12),
            device: Some(DeviceReport {
                emulated: true,
                ..Default::default()
            }),
        };

        let assessment = scorer.score(&input, &signals, noon());
        assert_eq!(assessment.fraud_score.value(), 80);
        assert_eq!(assessment.recommended_action, RecommendedAction::Block);
        assert!(assessment.is_fraudulent);
        assert_eq!(assessment.evidence.len(), 5);
        assert_eq!(assessment.patterns.len(), 6);
    }

    #[test]
    fn test_evidence_and_patterns_disagree() {
        let scorer = RiskScorer::default();
        let mut input = TransactionRiskInput::new("tx-3", "user-3", Decimal::from(6_000));
        input.location = Some(Location {
            country: Some("US".into()),
            city: None,
        });
        input.device_fingerprint = Some("fp".into());

        let assessment = scorer.score(&input, &clean_signals(), noon());
        let amount = assessment.factor(FactorKind::Amount).unwrap();
        assert_eq!((amount.score, amount.severity), (50, Severity::Medium));
        // Medium amount shows up as a pattern but never as evidence
        assert_eq!(assessment.patterns, vec![amount.description.clone()]);
        assert!(assessment.evidence.is_empty());
    }

    #[test]
    fn test_degraded_signals_recorded_and_lower_confidence() {
        let scorer = RiskScorer::default();
        let mut input = TransactionRiskInput::new("tx-4", "user-4", Decimal::from(100));
        input.device_fingerprint = Some("fp".into());

        let full = scorer.score(&input, &clean_signals(), noon());
        let degraded = scorer.score(&input, &RiskSignals::default(), noon());

        assert_eq!(
            degraded.metadata.degraded_signals,
            vec![FactorKind::Velocity, FactorKind::Device]
        );
        assert_eq!(degraded.factor(FactorKind::Velocity).unwrap().score, 0);
        assert_eq!(degraded.factor(FactorKind::Device).unwrap().score, 0);
        assert!(degraded.metadata.confidence < full.metadata.confidence);
    }

    #[test]
    fn test_timestamp_defaults_to_now() {
        let scorer = RiskScorer::default();
        let input = TransactionRiskInput::new("tx-5", "user-5", Decimal::from(10));
        let night = Utc.with_ymd_and_hms(2024, 3, 1, 2, 0, 0).unwrap();

        let assessment = scorer.score(&input, &clean_signals(), night);
        assert_eq!(assessment.factor(FactorKind::TimeOfDay).unwrap().score, 40);
        assert_eq!(assessment.metadata.assessed_at, night);
    }

    #[test]
    fn test_capabilities_report() {
        let caps = RiskScorer::default().capabilities();
        assert_eq!(caps.heuristics.len(), 6);
        assert_eq!(caps.action_thresholds.len(), 5);
        assert_eq!(caps.action_thresholds[0].action, RecommendedAction::Block);
        assert_eq!(caps.action_thresholds[0].min_score, 80);
        assert_eq!(caps.action_thresholds[4].action, RecommendedAction::Approve);
        assert_eq!(caps.fraud_threshold, 60);
        let total: f64 = caps.heuristics.iter().map(|h| h.weight).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }
}
