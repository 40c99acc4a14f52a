//! Request-level assessment: validation, signal collection, scoring

use crate::scoring::RiskScorer;
use crate::signals::SignalCollector;
use crate::types::{AssessmentRequest, RiskAssessment, ScorerCapabilities, TransactionRiskInput};
use crate::Result;
use chrono::Utc;
use std::time::Instant;
use tracing::warn;
use uuid::Uuid;

/// Fraud assessor
///
/// Rejects requests missing required fields before any lookup is made.
/// Once validated, an assessment always completes.
pub struct FraudAssessor {
    scorer: RiskScorer,
    collector: SignalCollector,
}

impl FraudAssessor {
    /// Create new fraud assessor
    pub fn new(scorer: RiskScorer, collector: SignalCollector) -> Self {
        Self { scorer, collector }
    }

    /// Scorer in use
    pub fn scorer(&self) -> &RiskScorer {
        &self.scorer
    }

    /// Validate and assess a raw request
    pub async fn assess(&self, request: AssessmentRequest) -> Result<RiskAssessment> {
        let input = TransactionRiskInput::try_from(request).map_err(|e| {
            warn!("Rejecting malformed assessment request: {}", e);
            e
        })?;
        Ok(self.assess_input(&input).await)
    }

    /// Assess already-validated input
    pub async fn assess_input(&self, input: &TransactionRiskInput) -> RiskAssessment {
        let started = Instant::now();
        let now = Utc::now();

        let signals = self.collector.collect(input, now).await;
        let mut assessment = self.scorer.score(input, &signals, now);

        assessment.metadata.assessment_id = Some(Uuid::new_v4());
        assessment.metadata.processing_time_ms = started.elapsed().as_millis() as u64;
        assessment
    }

    /// Scorer capability report
    pub fn capabilities(&self) -> ScorerCapabilities {
        self.scorer.capabilities()
    }
}
