//! Core types for fraud engine

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Score at or above which an assessment is flagged fraudulent
pub const FRAUD_THRESHOLD: u8 = 60;

/// Fraud score (0-100)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FraudScore(u8);

impl FraudScore {
    /// Create new fraud score (clamped to 100)
    pub fn new(score: u8) -> Self {
        Self(score.min(100))
    }

    /// Get raw score
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Check if fraudulent (>= 60)
    pub fn is_fraudulent(&self) -> bool {
        self.0 >= FRAUD_THRESHOLD
    }
}

/// Geographic origin of a transaction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Country code (ISO 3166 alpha-2 expected, anything accepted)
    #[serde(default)]
    pub country: Option<String>,

    /// City name
    #[serde(default)]
    pub city: Option<String>,
}

/// Assessment request as received from a caller.
///
/// Required fields are optional here so their absence can be reported as a
/// malformed request instead of a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRequest {
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub merchant_category: Option<String>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub device_fingerprint: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Validated transaction input for scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRiskInput {
    /// Transaction identifier
    pub transaction_id: String,

    /// User identifier
    pub user_id: String,

    /// Transaction amount
    pub amount: Decimal,

    /// Currency code
    pub currency: Option<String>,

    /// Merchant category
    pub merchant_category: Option<String>,

    /// Location
    pub location: Option<Location>,

    /// Device fingerprint
    pub device_fingerprint: Option<String>,

    /// Client IP address
    pub ip_address: Option<String>,

    /// Transaction time, defaults to assessment time
    pub timestamp: Option<DateTime<Utc>>,
}

impl TransactionRiskInput {
    /// Minimal input with only the required fields
    pub fn new(transaction_id: impl Into<String>, user_id: impl Into<String>, amount: Decimal) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            user_id: user_id.into(),
            amount,
            currency: None,
            merchant_category: None,
            location: None,
            device_fingerprint: None,
            ip_address: None,
            timestamp: None,
        }
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::MissingField(field)),
    }
}

impl TryFrom<AssessmentRequest> for TransactionRiskInput {
    type Error = Error;

    fn try_from(req: AssessmentRequest) -> Result<Self> {
        let transaction_id = required(req.transaction_id, "transactionId")?;
        let user_id = required(req.user_id, "userId")?;
        let amount = req.amount.ok_or(Error::MissingField("amount"))?;

        Ok(Self {
            transaction_id,
            user_id,
            amount,
            currency: req.currency,
            merchant_category: req.merchant_category,
            location: req.location,
            device_fingerprint: req.device_fingerprint,
            ip_address: req.ip_address,
            timestamp: req.timestamp,
        })
    }
}

/// Factor severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Low
    Low,
    /// Medium
    Medium,
    /// High
    High,
    /// Critical
    Critical,
}

impl Severity {
    /// High and critical factors count as evidence
    pub fn is_evidence(&self) -> bool {
        matches!(self, Severity::High | Severity::Critical)
    }
}

/// The six heuristics evaluated for every transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKind {
    /// Transaction amount
    Amount,
    /// Recent transaction count for the user
    Velocity,
    /// Country of origin
    Geographic,
    /// Device and network intelligence
    Device,
    /// Merchant category
    MerchantCategory,
    /// Local hour of the transaction
    TimeOfDay,
}

impl FactorKind {
    /// Evaluation order
    pub const ALL: [FactorKind; 6] = [
        FactorKind::Amount,
        FactorKind::Velocity,
        FactorKind::Geographic,
        FactorKind::Device,
        FactorKind::MerchantCategory,
        FactorKind::TimeOfDay,
    ];

    /// Fixed weight; weights sum to 1.0
    pub fn weight(&self) -> f64 {
        match self {
            FactorKind::Amount => 0.25,
            FactorKind::Velocity => 0.20,
            FactorKind::Geographic => 0.20,
            FactorKind::Device => 0.15,
            FactorKind::MerchantCategory => 0.10,
            FactorKind::TimeOfDay => 0.10,
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            FactorKind::Amount => "Transaction Amount",
            FactorKind::Velocity => "Transaction Velocity",
            FactorKind::Geographic => "Geographic Risk",
            FactorKind::Device => "Device Risk",
            FactorKind::MerchantCategory => "Merchant Category",
            FactorKind::TimeOfDay => "Time of Day",
        }
    }
}

/// One evaluated heuristic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskFactor {
    pub kind: FactorKind,
    pub name: String,
    pub weight: f64,
    pub score: u8,
    pub weighted_score: u8,
    pub severity: Severity,
    pub description: String,
}

impl RiskFactor {
    /// Build a factor for `kind`, deriving weight and weighted score
    pub fn new(kind: FactorKind, score: u8, severity: Severity, description: impl Into<String>) -> Self {
        let score = score.min(100);
        let weight = kind.weight();
        Self {
            kind,
            name: kind.label().to_string(),
            weight,
            score,
            weighted_score: (f64::from(score) * weight).round() as u8,
            severity,
            description: description.into(),
        }
    }
}

/// Recommended action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendedAction {
    /// Reject the transaction
    Block,
    /// Hold for fraud investigation
    Investigate,
    /// Manual review
    Review,
    /// Approve and watch
    Monitor,
    /// Approve
    Approve,
}

impl RecommendedAction {
    /// Minimum score per action, most severe first
    pub const THRESHOLDS: [(RecommendedAction, u8); 5] = [
        (RecommendedAction::Block, 80),
        (RecommendedAction::Investigate, 60),
        (RecommendedAction::Review, 40),
        (RecommendedAction::Monitor, 20),
        (RecommendedAction::Approve, 0),
    ];

    /// Step function over the fraud score
    pub fn from_score(score: FraudScore) -> Self {
        Self::THRESHOLDS
            .iter()
            .find(|(_, min)| score.value() >= *min)
            .map(|(action, _)| *action)
            .unwrap_or(RecommendedAction::Approve)
    }

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendedAction::Block => "BLOCK",
            RecommendedAction::Investigate => "INVESTIGATE",
            RecommendedAction::Review => "REVIEW",
            RecommendedAction::Monitor => "MONITOR",
            RecommendedAction::Approve => "APPROVE",
        }
    }
}

/// Device and network intelligence for one transaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceReport {
    /// Emulated or virtual device
    pub emulated: bool,

    /// Traffic from a VPN, proxy or hosting network
    pub proxy: bool,

    /// Whether the fingerprint is known for the user; None without a fingerprint
    pub recognized: Option<bool>,
}

/// External signals consumed by the scorer. `None` means the source was unavailable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskSignals {
    /// Transactions by the same user in the trailing window
    pub recent_transactions: Option<u32>,

    /// Device intelligence report
    pub device: Option<DeviceReport>,
}

/// Auxiliary assessment data, not used for decisions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment_id: Option<Uuid>,
    pub confidence: f64,
    pub model_version: String,
    pub processing_time_ms: u64,
    pub assessed_at: DateTime<Utc>,
    pub degraded_signals: Vec<FactorKind>,
}

/// Risk assessment result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub transaction_id: String,
    pub is_fraudulent: bool,
    pub fraud_score: FraudScore,
    pub recommended_action: RecommendedAction,
    pub evidence: Vec<RiskFactor>,
    pub patterns: Vec<String>,
    pub factors: Vec<RiskFactor>,
    pub metadata: AssessmentMetadata,
}

impl RiskAssessment {
    /// Look up a factor by kind
    pub fn factor(&self, kind: FactorKind) -> Option<&RiskFactor> {
        self.factors.iter().find(|f| f.kind == kind)
    }
}

/// Heuristic description for the capability report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeuristicDescriptor {
    pub kind: FactorKind,
    pub name: String,
    pub weight: f64,
    pub rule: String,
}

/// Action threshold for the capability report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionThreshold {
    pub action: RecommendedAction,
    pub min_score: u8,
}

/// Fixed scorer configuration, for display and documentation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorerCapabilities {
    pub model_version: String,
    pub heuristics: Vec<HeuristicDescriptor>,
    pub action_thresholds: Vec<ActionThreshold>,
    pub fraud_threshold: u8,
}
