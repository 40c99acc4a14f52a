use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ===== History Ingestion =====
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RecordTransactionRequest {
    pub transaction_id: String,
    pub user_id: String,
    pub amount: Decimal,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

// ===== Device Registration =====
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDeviceRequest {
    pub user_id: String,
    pub device_fingerprint: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

// ===== Health Check =====
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub tracked_users: usize,
}

// ===== Error Response =====
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
