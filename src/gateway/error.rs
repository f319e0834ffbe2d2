//! Gateway error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::message::DataFormat;
use crate::queue::QueueError;

/// Errors raised while computing the response for a single request.
///
/// Every variant is turned into a 500 response whose body is the
/// `Display` text, so messages are written for the HTTP caller.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// `data.format` is not one of the recognised tags.
    #[error("Invalid unknown data format, value: [{0}]")]
    UnknownFormat(String),

    /// The tag is recognised but mirroring it is not supported.
    #[error("Unsupported data format, value: [{0}]")]
    UnimplementedFormat(DataFormat),

    /// `format = file` without a source path.
    #[error("Data format 'file' requires a source file path")]
    MissingFilePath,

    /// Copying the source file into the temp directory failed.
    #[error("Error copying file, source: [{}], destination: [{}], message: [{error}]", .source_path.display(), .dest_path.display())]
    FileCopy {
        source_path: PathBuf,
        dest_path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Dispatch panicked; the payload message is kept when it is a string.
    #[error("Internal error: {0}")]
    Panicked(String),
}

/// Errors that stop a gateway loop.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The inbound queue failed; the loop cannot make progress.
    #[error("Inbound queue failed: {0}")]
    Queue(#[from] QueueError),

    /// The temp directory could not be prepared at startup.
    #[error("Cannot prepare temp directory {}: {error}", .path.display())]
    TempDir {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// A loop task panicked or was aborted.
    #[error("Gateway loop terminated abnormally: {0}")]
    Join(String),
}
