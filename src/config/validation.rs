//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (queue size > 0, at least one worker)
//! - Detect header names that would clash
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("worker.response_body_temp_dir must not be empty")]
    EmptyTempDir,

    #[error("worker.requests_queue_size must be greater than 0")]
    ZeroQueueSize,

    #[error("worker.workers must be greater than 0")]
    ZeroWorkers,

    #[error("header name for {0} must not be empty")]
    EmptyHeaderName(&'static str),

    #[error("marker header and data file header are both named '{0}'")]
    HeaderClash(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.worker.response_body_temp_dir.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyTempDir);
    }
    if config.worker.requests_queue_size == 0 {
        errors.push(ValidationError::ZeroQueueSize);
    }
    if config.worker.workers == 0 {
        errors.push(ValidationError::ZeroWorkers);
    }

    let marker = config.headers.marker.name.trim();
    let data_file = config.headers.data_file.trim();
    if marker.is_empty() {
        errors.push(ValidationError::EmptyHeaderName("headers.marker"));
    }
    if data_file.is_empty() {
        errors.push(ValidationError::EmptyHeaderName("headers.data_file"));
    }
    if !marker.is_empty() && marker.eq_ignore_ascii_case(data_file) {
        errors.push(ValidationError::HeaderClash(marker.to_string()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
