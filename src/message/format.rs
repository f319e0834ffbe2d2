//! Payload format tag carried by every request.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Declares which payload field of a request is populated.
///
/// Tags the gateway does not recognise are kept as `Unknown` so the
/// offending value can be reported back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataFormat {
    None,
    Json,
    String,
    Binary,
    File,
    Unknown(String),
}

impl DataFormat {
    pub fn as_str(&self) -> &str {
        match self {
            DataFormat::None => "none",
            DataFormat::Json => "json",
            DataFormat::String => "string",
            DataFormat::Binary => "binary",
            DataFormat::File => "file",
            DataFormat::Unknown(tag) => tag.as_str(),
        }
    }

    /// Label used for metrics, where unknown tags collapse into one bucket.
    pub fn metric_label(&self) -> &'static str {
        match self {
            DataFormat::None => "none",
            DataFormat::Json => "json",
            DataFormat::String => "string",
            DataFormat::Binary => "binary",
            DataFormat::File => "file",
            DataFormat::Unknown(_) => "unknown",
        }
    }
}

impl From<String> for DataFormat {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "none" => DataFormat::None,
            "json" => DataFormat::Json,
            "string" => DataFormat::String,
            "binary" => DataFormat::Binary,
            "file" => DataFormat::File,
            _ => DataFormat::Unknown(tag),
        }
    }
}

impl From<&str> for DataFormat {
    fn from(tag: &str) -> Self {
        DataFormat::from(tag.to_string())
    }
}

impl From<DataFormat> for String {
    fn from(format: DataFormat) -> Self {
        match format {
            DataFormat::Unknown(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
