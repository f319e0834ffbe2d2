//! Shared utilities for integration and load testing.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};

use mirror_gateway::config::GatewayConfig;
use mirror_gateway::message::{RequestData, RequestMessage, RequestMeta};

/// Config staging bodies under `<dir>/bodies` with `workers` loops.
pub fn gateway_config(dir: &Path, workers: usize) -> Arc<GatewayConfig> {
    let mut config = GatewayConfig::default();
    config.worker.response_body_temp_dir = dir.join("bodies");
    config.worker.workers = workers;
    config.worker.requests_queue_size = 64;
    Arc::new(config)
}

/// Write `len` bytes of non-repeating-looking data to `<dir>/<name>`.
pub fn write_source_file(dir: &Path, name: &str, len: usize) -> PathBuf {
    let path = dir.join(name);
    let bytes: Vec<u8> = (0..len)
        .map(|i| (i.wrapping_mul(31) ^ (i >> 7)) as u8)
        .collect();
    std::fs::write(&path, bytes).unwrap();
    path
}

/// SHA-256 of a file's contents.
pub fn hash_file(path: &Path) -> Vec<u8> {
    let bytes = std::fs::read(path).unwrap();
    Sha256::digest(&bytes).to_vec()
}

/// A request selecting the mirror operation.
pub fn mirror_request(handle: mirror_gateway::message::Handle, data: RequestData) -> RequestMessage {
    RequestMessage::new(handle, RequestMeta::new("/gateway", "mirror"), data)
}
