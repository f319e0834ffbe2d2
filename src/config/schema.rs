//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the mirror gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    /// Worker loop and queue settings.
    pub worker: WorkerConfig,

    /// Fixed and out-of-band response headers.
    pub headers: HeaderConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

/// Worker loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkerConfig {
    /// Directory file-backed response bodies are staged in.
    pub response_body_temp_dir: PathBuf,

    /// Capacity of the inbound request queue (backpressure).
    pub requests_queue_size: usize,

    /// Number of independent loops consuming the queue.
    pub workers: usize,

    /// Create `response_body_temp_dir` on startup if missing.
    pub create_temp_dir: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            response_body_temp_dir: std::env::temp_dir().join("mirror-gateway"),
            requests_queue_size: 1024,
            workers: 1,
            create_temp_dir: true,
        }
    }
}

/// Response header configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeaderConfig {
    /// Header attached to every response.
    pub marker: MarkerHeader,

    /// Header naming the staged body file of a file-backed response.
    pub data_file: String,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            marker: MarkerHeader::default(),
            data_file: "X-Background-Content-Handler-Data-File".to_string(),
        }
    }
}

/// A constant name/value header pair.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MarkerHeader {
    pub name: String,
    pub value: String,
}

impl Default for MarkerHeader {
    fn default() -> Self {
        Self {
            name: "X-Foo-Bar".to_string(),
            value: "Baz".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ObservabilityConfig {
    /// `EnvFilter` directives; `RUST_LOG` takes precedence.
    pub log_filter: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Address the Prometheus exporter listens on.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "mirror_gateway=info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
