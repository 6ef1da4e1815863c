//! Newline-delimited JSON-RPC framing for the stdio side.
//!
//! One request object per line. Everything else is reported as a
//! framing error for the caller to drop or answer, never to crash on.

use hostlink_core::jsonrpc::JsonRpcRequest;

use crate::error::FramingError;

/// Maximum accepted input line length in bytes (10 MiB).
pub(super) const MAX_MESSAGE_BYTES: usize = 10 * 1024 * 1024;

/// Parses one input line into a request.
///
/// # Errors
///
/// Returns [`FramingError::MessageTooLarge`] for oversized lines,
/// [`FramingError::UnsupportedBatch`] for arrays, and
/// [`FramingError::MalformedJson`] for everything else that fails to
/// parse as a single request object.
pub(super) fn parse_line(line: &str) -> Result<JsonRpcRequest, FramingError> {
    if line.len() > MAX_MESSAGE_BYTES {
        return Err(FramingError::MessageTooLarge {
            max_bytes: MAX_MESSAGE_BYTES,
        });
    }
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(FramingError::MalformedJson {
            reason: "empty message".to_string(),
        });
    }
    let value: serde_json::Value =
        serde_json::from_str(trimmed).map_err(|e| FramingError::MalformedJson {
            reason: e.to_string(),
        })?;
    if value.is_array() {
        return Err(FramingError::UnsupportedBatch);
    }
    serde_json::from_value(value).map_err(|e| FramingError::MalformedJson {
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostlink_core::jsonrpc::JsonRpcId;

    /// Tests that a complete request line parses with its id intact.
    #[test]
    fn parses_request_line() {
        let req =
            parse_line(r#"{"jsonrpc":"2.0","id":7,"method":"tools/list","params":{}}"#).unwrap();
        assert_eq!(req.id, Some(JsonRpcId::Number(7)));
        assert_eq!(req.method, "tools/list");
    }

    /// Tests that a notification (no id) parses.
    #[test]
    fn parses_notification_line() {
        let req = parse_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).unwrap();
        assert!(req.id.is_none());
    }

    /// Tests that non-JSON input reports malformed, not a panic.
    #[test]
    fn rejects_garbage() {
        let err = parse_line("this is not json").unwrap_err();
        assert!(matches!(err, FramingError::MalformedJson { .. }));

        let err = parse_line("   ").unwrap_err();
        assert!(matches!(err, FramingError::MalformedJson { .. }));

        let err = parse_line("42").unwrap_err();
        assert!(matches!(err, FramingError::MalformedJson { .. }));
    }

    /// Tests that batch arrays are refused explicitly.
    #[test]
    fn rejects_batches() {
        let err = parse_line(r#"[{"jsonrpc":"2.0","id":1,"method":"a"}]"#).unwrap_err();
        assert!(matches!(err, FramingError::UnsupportedBatch));
    }

    /// Tests that a fractional id fails the parse.
    #[test]
    fn rejects_float_id() {
        let err = parse_line(r#"{"jsonrpc":"2.0","id":1.5,"method":"a"}"#).unwrap_err();
        match err {
            FramingError::MalformedJson { reason } => assert!(reason.contains("integer")),
            other => panic!("expected MalformedJson, got {other:?}"),
        }
    }

    /// Tests that an object without a method is not a request.
    #[test]
    fn rejects_methodless_object() {
        let err = parse_line(r#"{"jsonrpc":"2.0","id":1}"#).unwrap_err();
        assert!(matches!(err, FramingError::MalformedJson { .. }));
    }

    /// Tests the line size limit.
    #[test]
    fn rejects_oversized_line() {
        let huge = format!(
            r#"{{"jsonrpc":"2.0","id":1,"method":"a","params":{{"x":"{}"}}}}"#,
            "y".repeat(MAX_MESSAGE_BYTES)
        );
        let err = parse_line(&huge).unwrap_err();
        assert!(matches!(err, FramingError::MessageTooLarge { .. }));
    }
}
