use crate::errors::{ServiceError, ServiceResult};
use crate::metrics;
use crate::models::*;
use crate::AppState;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use fraud_engine::{AssessmentRequest, RiskAssessment};
use tracing::{info, warn};

// ===== Health Check =====
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        tracked_users: state.history.tracked_users(),
    })
}

// ===== Assess Transaction =====
pub async fn assess_transaction(
    req: web::Json<AssessmentRequest>,
    state: web::Data<AppState>,
) -> ServiceResult<HttpResponse> {
    let request = req.into_inner();

    let assessment = match state.assessor.assess(request.clone()).await {
        Ok(assessment) => assessment,
        Err(e) => {
            metrics::MALFORMED_REQUESTS.inc();
            return Err(e.into());
        }
    };
    metrics::observe_assessment(&assessment);

    if state.record_assessed_transactions {
        record_assessed(&state, &request, &assessment);
    }

    Ok(HttpResponse::Ok().json(assessment))
}

/// Feed an assessed transaction back into the stores. A retried transaction
/// id leaves both stores untouched so the retry scores the same.
fn record_assessed(state: &AppState, request: &AssessmentRequest, assessment: &RiskAssessment) {
    // Required fields are present once assessment succeeded
    let (user_id, amount) = match (request.user_id.as_deref(), request.amount) {
        (Some(user_id), Some(amount)) => (user_id, amount),
        _ => return,
    };

    let is_new = state.history.record(
        user_id,
        &assessment.transaction_id,
        amount,
        request.timestamp.unwrap_or(assessment.metadata.assessed_at),
    );
    if !is_new {
        info!("Transaction {} already recorded, skipping feedback", assessment.transaction_id);
        return;
    }

    if let Some(fingerprint) = request.device_fingerprint.as_deref().map(str::trim) {
        if !fingerprint.is_empty() {
            state
                .devices
                .register_device_from(user_id, fingerprint, &assessment.transaction_id);
        }
    }
}

// ===== Scorer Capabilities =====
pub async fn get_capabilities(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.assessor.capabilities())
}

// ===== Record Historical Transaction =====
pub async fn record_transaction(
    req: web::Json<RecordTransactionRequest>,
    state: web::Data<AppState>,
) -> ServiceResult<HttpResponse> {
    let req = req.into_inner();
    if req.user_id.trim().is_empty() || req.transaction_id.trim().is_empty() {
        return Err(ServiceError::ValidationError(
            "userId and transactionId must not be empty".to_string(),
        ));
    }

    state.history.record(
        &req.user_id,
        &req.transaction_id,
        req.amount,
        req.timestamp.unwrap_or_else(Utc::now),
    );
    info!("Recorded transaction {} for user {}", req.transaction_id, req.user_id);

    Ok(HttpResponse::Created().json(StatusResponse {
        status: "recorded".to_string(),
    }))
}

// ===== Register Known Device =====
pub async fn register_device(
    req: web::Json<RegisterDeviceRequest>,
    state: web::Data<AppState>,
) -> ServiceResult<HttpResponse> {
    let req = req.into_inner();
    let fingerprint = req.device_fingerprint.trim();
    if req.user_id.trim().is_empty() || fingerprint.is_empty() {
        return Err(ServiceError::ValidationError(
            "userId and deviceFingerprint must not be empty".to_string(),
        ));
    }

    state.devices.register_device(&req.user_id, fingerprint);
    info!("Registered device for user {}", req.user_id);

    Ok(HttpResponse::Created().json(StatusResponse {
        status: "registered".to_string(),
    }))
}

// ===== Velocity Stats =====
pub async fn get_velocity_stats(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> ServiceResult<HttpResponse> {
    let user_id = path.into_inner();
    let window = state.assessor.scorer().config().velocity_window_minutes;

    let stats = state
        .history
        .stats(&user_id, window)
        .ok_or_else(|| ServiceError::NotFound(format!("no history for user {}", user_id)))?;

    Ok(HttpResponse::Ok().json(stats))
}

// ===== Prometheus Metrics =====
pub async fn get_metrics() -> ServiceResult<HttpResponse> {
    let body = metrics::metrics_text(&metrics::REGISTRY)
        .map_err(|e| ServiceError::InternalError(e.to_string()))?;

    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(body))
}

// ===== Configure Routes =====
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        warn!("Rejecting unreadable request body: {}", err);
        metrics::MALFORMED_REQUESTS.inc();
        ServiceError::MalformedRequest(err.to_string()).into()
    });

    cfg.app_data(json_config)
        .service(
            web::scope("/api/v1/fraud")
                .route("/assess", web::post().to(assess_transaction))
                .route("/capabilities", web::get().to(get_capabilities))
                .route("/transactions", web::post().to(record_transaction))
                .route("/devices", web::post().to(register_device))
                .route("/velocity/{user_id}", web::get().to(get_velocity_stats)),
        )
        .route("/health", web::get().to(health_check))
        .route("/metrics", web::get().to(get_metrics));
}
