//! Fraud Engine
//!
//! Weighted multi-factor fraud-risk scoring for payment transactions

#![forbid(unsafe_code)]

pub mod assessor;
pub mod config;
pub mod device;
pub mod error;
pub mod heuristics;
pub mod scoring;
pub mod signals;
pub mod types;
pub mod velocity;

pub use assessor::FraudAssessor;
pub use config::{ScoringConfig, MAX_VELOCITY_WINDOW_MINUTES};
pub use device::InMemoryDeviceIntelligence;
pub use error::{Error, Result};
pub use ipnetwork::IpNetwork;
pub use scoring::RiskScorer;
pub use signals::{DeviceIntelligence, SignalCollector, TransactionHistory};
pub use types::*;
pub use velocity::{InMemoryTransactionHistory, VelocityStats};
