//! Inbound request message.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::message::format::DataFormat;

/// Opaque correlation token owned by the front-end.
///
/// The gateway never interprets it; it is copied into the response so the
/// front-end can find the client connection that is waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(pub i64);

impl From<i64> for Handle {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Request metadata attached by the front-end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestMeta {
    /// Route the client requested.
    pub uri: String,

    /// Query string, used to select the operation (e.g. "mirror").
    pub args: String,

    /// Client request headers.
    pub headers: BTreeMap<String, String>,

    /// Path of the file the front-end buffered a large upload into.
    #[serde(rename = "dataTempFile", skip_serializing_if = "Option::is_none")]
    pub data_temp_file: Option<PathBuf>,

    /// Anything else the front-end passes along (timeouts, client address, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RequestMeta {
    pub fn new(uri: impl Into<String>, args: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            args: args.into(),
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Request payload; only the field matching `format` is expected to be set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestData {
    pub format: DataFormat,
    #[serde(default)]
    pub json: Option<Value>,
    #[serde(default)]
    pub string: Option<String>,
    /// Hex-encoded bytes.
    #[serde(default)]
    pub binary: Option<String>,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl RequestData {
    fn empty(format: DataFormat) -> Self {
        Self {
            format,
            json: None,
            string: None,
            binary: None,
            file: None,
        }
    }

    pub fn none() -> Self {
        Self::empty(DataFormat::None)
    }

    pub fn json(value: Value) -> Self {
        Self {
            json: Some(value),
            ..Self::empty(DataFormat::Json)
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self {
            string: Some(value.into()),
            ..Self::empty(DataFormat::String)
        }
    }

    pub fn binary(hex: impl Into<String>) -> Self {
        Self {
            binary: Some(hex.into()),
            ..Self::empty(DataFormat::Binary)
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            file: Some(path.into()),
            ..Self::empty(DataFormat::File)
        }
    }

    /// Payload with an arbitrary format tag and no populated field.
    pub fn tagged(format: impl Into<DataFormat>) -> Self {
        Self::empty(format.into())
    }
}

impl Default for RequestData {
    fn default() -> Self {
        Self::none()
    }
}

/// One inbound mirror request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestMessage {
    pub handle: Handle,
    #[serde(default)]
    pub meta: RequestMeta,
    #[serde(default)]
    pub data: RequestData,
}

impl RequestMessage {
    pub fn new(handle: Handle, meta: RequestMeta, data: RequestData) -> Self {
        Self {
            handle,
            meta,
            data,
        }
    }
}
