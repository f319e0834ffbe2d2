//! Outbound response message.
//!
//! # Responsibilities
//! - Carry the gateway's decision for one request back to the front-end
//! - Encode inline data into the bytes the HTTP client receives
//!
//! # Design Decisions
//! - A file-backed body is never inline: `data` stays `None` and a header
//!   names the staged file
//! - Objects and arrays are sent as JSON text, strings as-is

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::request::Handle;

pub const STATUS_OK: u16 = 200;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub handle: Handle,
    pub status: u16,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl ResponseMessage {
    pub fn new(handle: Handle, status: u16) -> Self {
        Self {
            handle,
            status,
            headers: BTreeMap::new(),
            data: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = match data {
            Value::Null => None,
            other => Some(other),
        };
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Path of the staged body file, if this response is file-backed.
    pub fn file_path(&self, header_name: &str) -> Option<&Path> {
        self.headers
            .get(header_name)
            .map(|path| Path::new(path.as_str()))
    }

    /// Bytes to send as the HTTP body when the body is inline.
    pub fn body(&self) -> Vec<u8> {
        match &self.data {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::String(text)) => text.as_bytes().to_vec(),
            Some(other) => other.to_string().into_bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_body_encoding() {
        let handle = Handle(7);

        let empty = ResponseMessage::new(handle, STATUS_OK);
        assert!(empty.body().is_empty());

        let text = ResponseMessage::new(handle, STATUS_OK).with_data(json!("foobar"));
        assert_eq!(text.body(), b"foobar");

        let object = ResponseMessage::new(handle, STATUS_OK).with_data(json!({ "foo": 42 }));
        let decoded: Value = serde_json::from_slice(&object.body()).unwrap();
        assert_eq!(decoded, json!({ "foo": 42 }));

        let number = ResponseMessage::new(handle, STATUS_OK).with_data(json!(42));
        assert_eq!(number.body(), b"42");
    }

    #[test]
    fn test_null_data_is_dropped() {
        let resp = ResponseMessage::new(Handle(1), STATUS_OK).with_data(Value::Null);
        assert!(resp.data.is_none());
    }

    #[test]
    fn test_file_path_header() {
        let resp = ResponseMessage::new(Handle(1), STATUS_OK).with_header("X-File", "/tmp/abc");
        assert_eq!(resp.file_path("X-File"), Some(Path::new("/tmp/abc")));
        assert_eq!(resp.file_path("X-Other"), None);
    }

    #[test]
    fn test_status_classes() {
        assert!(ResponseMessage::new(Handle(1), STATUS_OK).is_success());
        assert!(!ResponseMessage::new(Handle(1), STATUS_INTERNAL_ERROR).is_success());
    }
}
