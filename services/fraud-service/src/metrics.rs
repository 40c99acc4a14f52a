use fraud_engine::{FactorKind, RiskAssessment};
use lazy_static::lazy_static;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::time::Duration;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"]
    ).expect("metric can be created");

    pub static ref HTTP_REQUEST_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new("http_request_duration_seconds", "HTTP request duration in seconds")
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        &["method", "path"]
    ).expect("metric can be created");

    // Business metrics - fraud scoring
    pub static ref ASSESSMENTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("fraud_assessments_total", "Assessments by recommended action"),
        &["action"]
    ).expect("metric can be created");

    pub static ref FRAUD_SCORE: Histogram = Histogram::with_opts(
        HistogramOpts::new("fraud_score_distribution", "Distribution of fraud scores")
            .buckets(vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0])
    ).expect("metric can be created");

    pub static ref DEGRADED_SIGNALS: IntCounterVec = IntCounterVec::new(
        Opts::new("fraud_degraded_signals_total", "Heuristics scored without collaborator data"),
        &["signal"]
    ).expect("metric can be created");

    pub static ref MALFORMED_REQUESTS: IntCounter = IntCounter::new(
        "fraud_malformed_requests_total",
        "Assessment requests rejected for missing fields"
    ).expect("metric can be created");
}

/// Register all metrics with the given registry
pub fn register_metrics(registry: &Registry) -> Result<(), prometheus::Error> {
    // HTTP metrics
    registry.register(Box::new(HTTP_REQUESTS_TOTAL.clone()))?;
    registry.register(Box::new(HTTP_REQUEST_DURATION.clone()))?;

    // Business metrics
    registry.register(Box::new(ASSESSMENTS_TOTAL.clone()))?;
    registry.register(Box::new(FRAUD_SCORE.clone()))?;
    registry.register(Box::new(DEGRADED_SIGNALS.clone()))?;
    registry.register(Box::new(MALFORMED_REQUESTS.clone()))?;

    Ok(())
}

pub fn observe_http(method: &str, path: &str, status: u16, elapsed: Duration) {
    let status = status.to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, status.as_str()])
        .inc();
    HTTP_REQUEST_DURATION
        .with_label_values(&[method, path])
        .observe(elapsed.as_secs_f64());
}

pub fn observe_assessment(assessment: &RiskAssessment) {
    ASSESSMENTS_TOTAL
        .with_label_values(&[assessment.recommended_action.as_str()])
        .inc();
    FRAUD_SCORE.observe(f64::from(assessment.fraud_score.value()));

    for signal in &assessment.metadata.degraded_signals {
        let label = match signal {
            FactorKind::Velocity => "velocity",
            FactorKind::Device => "device",
            _ => "other",
        };
        DEGRADED_SIGNALS.with_label_values(&[label]).inc();
    }
}

/// Generate metrics output in Prometheus text format
pub fn metrics_text(registry: &Registry) -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    let mut buffer = vec![];
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
