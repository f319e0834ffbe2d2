//! Building request messages from raw HTTP parts.
//!
//! # Responsibilities
//! - Decide the `DataFormat` of an incoming body
//! - Pick up bodies the front-end already buffered to disk
//!
//! # Design Decisions
//! - Only JSON objects and arrays become `json`; scalars stay `string`
//! - A body is parsed as JSON only when no content type is declared or it
//!   is `application/json` / `text/json`
//! - Non UTF-8 bodies are carried as lowercase hex
//! - A present but empty body is the string `""`, not `none`

use serde_json::Value;

use crate::message::request::{Handle, RequestData, RequestMessage, RequestMeta};

const CONTENT_TYPE: &str = "content-type";
const JSON_CONTENT_TYPES: [&str; 2] = ["application/json", "text/json"];

impl RequestMessage {
    /// Classify `body` and wrap it together with `meta` into a request message.
    pub fn from_parts(handle: Handle, meta: RequestMeta, body: Option<&[u8]>) -> Self {
        let data = match body {
            Some(bytes) => classify_body(&meta, bytes),
            None => match &meta.data_temp_file {
                Some(path) => RequestData::file(path.clone()),
                None => RequestData::none(),
            },
        };
        Self::new(handle, meta, data)
    }
}

fn classify_body(meta: &RequestMeta, bytes: &[u8]) -> RequestData {
    let Ok(text) = std::str::from_utf8(bytes) else {
        return RequestData::binary(hex::encode(bytes));
    };

    if json_or_unspecified(meta) {
        if let Ok(value @ (Value::Object(_) | Value::Array(_))) = serde_json::from_str::<Value>(text) {
            return RequestData::json(value);
        }
    }
    RequestData::string(text)
}

fn json_or_unspecified(meta: &RequestMeta) -> bool {
    match meta.header(CONTENT_TYPE) {
        Some(content_type) => JSON_CONTENT_TYPES
            .iter()
            .any(|json| content_type.eq_ignore_ascii_case(json)),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::DataFormat;
    use serde_json::json;
    use std::path::PathBuf;

    fn meta() -> RequestMeta {
        RequestMeta::new("/gateway", "mirror")
    }

    #[test]
    fn test_json_object_without_content_type() {
        let req = RequestMessage::from_parts(Handle(1), meta(), Some(br#"{"foo":42}"#));
        assert_eq!(req.data.format, DataFormat::Json);
        assert_eq!(req.data.json, Some(json!({ "foo": 42 })));
    }

    #[test]
    fn test_json_array_with_json_content_type() {
        let meta = meta().with_header("Content-Type", "TEXT/JSON");
        let req = RequestMessage::from_parts(Handle(1), meta, Some(b"[1,2,3]"));
        assert_eq!(req.data.format, DataFormat::Json);
    }

    #[test]
    fn test_json_scalar_stays_string() {
        let req = RequestMessage::from_parts(Handle(1), meta(), Some(b"42"));
        assert_eq!(req.data.format, DataFormat::String);
        assert_eq!(req.data.string.as_deref(), Some("42"));
    }

    #[test]
    fn test_other_content_type_is_not_parsed() {
        let meta = meta().with_header("content-type", "text/plain");
        let req = RequestMessage::from_parts(Handle(1), meta, Some(br#"{"foo":42}"#));
        assert_eq!(req.data.format, DataFormat::String);
        assert_eq!(req.data.string.as_deref(), Some(r#"{"foo":42}"#));
    }

    #[test]
    fn test_plain_text() {
        let req = RequestMessage::from_parts(Handle(1), meta(), Some(b"foobar"));
        assert_eq!(req.data.format, DataFormat::String);
        assert_eq!(req.data.string.as_deref(), Some("foobar"));
    }

    #[test]
    fn test_invalid_utf8_is_hex_binary() {
        let req = RequestMessage::from_parts(Handle(1), meta(), Some(&[0xff, 0x00, 0x1a]));
        assert_eq!(req.data.format, DataFormat::Binary);
        assert_eq!(req.data.binary.as_deref(), Some("ff001a"));
    }

    #[test]
    fn test_no_body() {
        let req = RequestMessage::from_parts(Handle(1), meta(), None);
        assert_eq!(req.data.format, DataFormat::None);
        assert_eq!(req.data.string, None);
    }

    #[test]
    fn test_empty_body_is_empty_string() {
        let req = RequestMessage::from_parts(Handle(1), meta(), Some(b""));
        assert_eq!(req.data.format, DataFormat::String);
        assert_eq!(req.data.string.as_deref(), Some(""));

        let mut meta = meta();
        meta.data_temp_file = Some(PathBuf::from("/var/tmp/upload"));
        let req = RequestMessage::from_parts(Handle(2), meta, Some(b""));
        assert_eq!(req.data.format, DataFormat::String);
        assert_eq!(req.data.file, None);
    }

    #[test]
    fn test_buffered_upload_becomes_file() {
        let mut meta = meta();
        meta.data_temp_file = Some(PathBuf::from("/var/tmp/upload"));
        let req = RequestMessage::from_parts(Handle(9), meta, None);
        assert_eq!(req.handle, Handle(9));
        assert_eq!(req.data.format, DataFormat::File);
        assert_eq!(req.data.file, Some(PathBuf::from("/var/tmp/upload")));
    }
}
