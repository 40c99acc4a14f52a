use actix_web::{HttpResponse, ResponseError};
use std::fmt;

#[derive(Debug)]
pub enum ServiceError {
    MalformedRequest(String),
    ValidationError(String),
    ConfigurationError(String),
    NotFound(String),
    InternalError(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::MalformedRequest(msg) => write!(f, "Malformed request: {}", msg),
            ServiceError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ServiceError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            ServiceError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ServiceError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ServiceError {}

impl ServiceError {
    fn code(&self) -> &'static str {
        match self {
            ServiceError::MalformedRequest(_) => "MALFORMED_REQUEST",
            ServiceError::ValidationError(_) => "VALIDATION_ERROR",
            ServiceError::ConfigurationError(_) => "CONFIGURATION_ERROR",
            ServiceError::NotFound(_) => "NOT_FOUND",
            ServiceError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for ServiceError {
    fn error_response(&self) -> HttpResponse {
        let body = serde_json::json!({
            "error": self.code(),
            "message": self.to_string()
        });

        match self {
            ServiceError::MalformedRequest(_) | ServiceError::ValidationError(_) => {
                HttpResponse::BadRequest().json(body)
            }
            ServiceError::NotFound(_) => HttpResponse::NotFound().json(body),
            ServiceError::ConfigurationError(_) | ServiceError::InternalError(_) => {
                HttpResponse::InternalServerError().json(body)
            }
        }
    }
}

impl From<fraud_engine::Error> for ServiceError {
    fn from(err: fraud_engine::Error) -> Self {
        match err {
            fraud_engine::Error::MissingField(_) => ServiceError::MalformedRequest(err.to_string()),
            fraud_engine::Error::InvalidConfig(msg) => ServiceError::ConfigurationError(msg),
            other => ServiceError::InternalError(other.to_string()),
        }
    }
}

impl From<config::ConfigError> for ServiceError {
    fn from(err: config::ConfigError) -> Self {
        ServiceError::ConfigurationError(err.to_string())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
