//! Format dispatch for mirror requests.
//!
//! # Responsibilities
//! - Select the operation named by `meta.args`
//! - Produce the mirrored body for each payload format
//! - Stage `file` payloads into the response body temp directory
//!
//! # Design Decisions
//! - Exhaustive match over `DataFormat`; `binary` fails loudly
//! - The file copy is awaited in full before a result is returned, so a
//!   response never references a half-written file
//! - A failed copy removes whatever it left behind

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::WorkerConfig;
use crate::gateway::error::DispatchError;
use crate::gateway::temp_path;
use crate::message::{DataFormat, RequestMessage};

/// Operation selected by a request's `meta.args`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Mirror,
    Other(String),
}

impl Operation {
    pub fn parse(args: &str) -> Self {
        match args {
            "mirror" => Operation::Mirror,
            other => Operation::Other(other.to_string()),
        }
    }
}

/// How the body of a successful response is materialised.
#[derive(Debug, Clone, PartialEq)]
pub enum MirrorResult {
    NoBody,
    InlineValue(Value),
    FileBacked(PathBuf),
}

/// Run the operation selected by `request.meta.args`.
///
/// Operations other than mirror are no-ops and produce an empty body.
pub async fn dispatch(
    config: &WorkerConfig,
    request: &RequestMessage,
) -> Result<MirrorResult, DispatchError> {
    match Operation::parse(&request.meta.args) {
        Operation::Mirror => mirror(config, request).await,
        Operation::Other(args) => {
            tracing::debug!(handle = %request.handle, args = %args, "No operation selected");
            Ok(MirrorResult::NoBody)
        }
    }
}

/// Echo the request payload back according to its declared format.
pub async fn mirror(
    config: &WorkerConfig,
    request: &RequestMessage,
) -> Result<MirrorResult, DispatchError> {
    let data = &request.data;
    match &data.format {
        DataFormat::None => Ok(MirrorResult::NoBody),
        DataFormat::Json => Ok(MirrorResult::InlineValue(
            data.json.clone().unwrap_or(Value::Null),
        )),
        DataFormat::String => Ok(MirrorResult::InlineValue(
            data.string.clone().map(Value::String).unwrap_or(Value::Null),
        )),
        DataFormat::Binary => Err(DispatchError::UnimplementedFormat(DataFormat::Binary)),
        DataFormat::File => {
            let source = data.file.as_deref().ok_or(DispatchError::MissingFilePath)?;
            let dest = temp_path::allocate(&config.response_body_temp_dir);
            stage_file(source, &dest).await?;
            Ok(MirrorResult::FileBacked(dest))
        }
        DataFormat::Unknown(tag) => Err(DispatchError::UnknownFormat(tag.clone())),
    }
}

async fn stage_file(source: &Path, dest: &Path) -> Result<(), DispatchError> {
    match tokio::fs::copy(source, dest).await {
        Ok(bytes) => {
            tracing::debug!(source = %source.display(), dest = %dest.display(), bytes, "File staged");
            Ok(())
        }
        Err(error) => {
            if let Err(e) = tokio::fs::remove_file(dest).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(dest = %dest.display(), error = %e, "Failed to remove partial copy");
                }
            }
            Err(DispatchError::FileCopy {
                source_path: source.to_path_buf(),
                dest_path: dest.to_path_buf(),
                error,
            })
        }
    }
}
