//! Document decoding.
//!
//! Malformed input is rejected here, before any comparison starts.

use serde_json::Value;

use crate::errors::{ExError, ExErrorKind, Result};

/// Parse raw bytes into a JSON document
///
/// # Errors
///
/// - `InvalidInput` if the bytes are not UTF-8 or not valid JSON
pub fn parse_document(bytes: &[u8]) -> Result<Value> {
    let text = std::str::from_utf8(bytes).map_err(|e| {
        ExError::new(ExErrorKind::InvalidInput)
            .with_op("parse_document")
            .with_message(format!("document is not valid UTF-8: {}", e))
    })?;

    serde_json::from_str(text).map_err(|e| {
        ExError::new(ExErrorKind::InvalidInput)
            .with_op("parse_document")
            .with_message(format!("document is not valid JSON: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_valid_document() {
        let value = parse_document(br#"{"a": [1, 2.5, null]}"#).unwrap();
        assert_eq!(value, json!({"a": [1, 2.5, null]}));
    }

    #[test]
    fn test_scalar_root_is_accepted() {
        assert_eq!(parse_document(b"\"text\"").unwrap(), json!("text"));
    }

    #[test]
    fn test_invalid_utf8() {
        let err = parse_document(&[0xff, 0xfe, 0x7b]).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidInput);
        assert!(err.message().contains("UTF-8"));
    }

    #[test]
    fn test_invalid_json() {
        let err = parse_document(b"{\"a\": }").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidInput);
        assert_eq!(err.op(), Some("parse_document"));
    }
}
