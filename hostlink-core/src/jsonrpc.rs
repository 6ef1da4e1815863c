//! JSON-RPC 2.0 message types for the stdio and event-stream wire.
//!
//! Ids are the correlation currency of the bridge: they key the pending
//! request registry and must survive the round trip byte-exact. JSON-RPC
//! allows string, integer, and null ids; fractional ids are rejected at
//! parse time rather than silently truncated. An explicit `"id": null` is
//! folded into an absent id, since both mean "the caller holds no handle
//! to this request" and both get a generated id before submission.

use std::borrow::Cow;
use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Protocol version tag carried by every message.
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC error code for unparseable input.
pub const PARSE_ERROR: i64 = -32700;

/// JSON-RPC error code for internal bridge failures.
pub const INTERNAL_ERROR: i64 = -32603;

/// A JSON-RPC request id: a string or an integer.
///
/// Hashable so it can key the pending request registry directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JsonRpcId {
    /// Integer id, e.g. `"id": 7`.
    Number(i64),
    /// String id, e.g. `"id": "req-7"`.
    String(String),
}

impl JsonRpcId {
    /// Mints a fresh id for requests that arrived without one.
    #[must_use]
    pub fn generate() -> Self {
        JsonRpcId::String(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for JsonRpcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonRpcId::Number(n) => write!(f, "{n}"),
            JsonRpcId::String(s) => write!(f, "{s}"),
        }
    }
}

impl Serialize for JsonRpcId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            JsonRpcId::Number(n) => serializer.serialize_i64(*n),
            JsonRpcId::String(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for JsonRpcId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::String(s) => Ok(JsonRpcId::String(s)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(JsonRpcId::Number)
                .ok_or_else(|| de::Error::custom("JSON-RPC id must be an integer, not a float")),
            _ => Err(de::Error::custom(
                "JSON-RPC id must be a string, an integer, or null",
            )),
        }
    }
}

fn default_version() -> Cow<'static, str> {
    Cow::Borrowed(JSONRPC_VERSION)
}

/// A request or notification read from the stdio peer.
///
/// The version tag is tolerated when absent so the relay does not reject
/// traffic the host itself would accept; enforcing the protocol is the
/// host's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version tag, normally `"2.0"`.
    #[serde(default = "default_version")]
    pub jsonrpc: Cow<'static, str>,
    /// Request id; `None` until the correlator assigns one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<JsonRpcId>,
    /// Method name, e.g. `tools/call`.
    pub method: String,
    /// Method parameters, forwarded verbatim apart from path translation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

/// A response streamed back by the host or synthesized by the bridge.
///
/// The id is always serialized, as `null` when absent, so peers can pair
/// even a failed parse with *something*.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Protocol version tag.
    #[serde(default = "default_version")]
    pub jsonrpc: Cow<'static, str>,
    /// Id of the request this answers; `None` serializes as `null`.
    #[serde(default)]
    pub id: Option<JsonRpcId>,
    /// Success payload, mutually exclusive with `error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Failure payload, mutually exclusive with `result`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Builds a success response carrying `result`.
    #[must_use]
    pub fn success(id: Option<JsonRpcId>, result: serde_json::Value) -> Self {
        JsonRpcResponse {
            jsonrpc: Cow::Borrowed(JSONRPC_VERSION),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Builds an error response carrying `error`.
    #[must_use]
    pub fn error(id: Option<JsonRpcId>, error: JsonRpcError) -> Self {
        JsonRpcResponse {
            jsonrpc: Cow::Borrowed(JSONRPC_VERSION),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// The `error` member of a JSON-RPC response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Numeric error code.
    pub code: i64,
    /// Short human-readable summary.
    pub message: String,
    /// Optional structured detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcError {
    /// Standard `-32700` object for input that did not parse as JSON.
    #[must_use]
    pub fn parse_error() -> Self {
        JsonRpcError {
            code: PARSE_ERROR,
            message: "Parse error".to_string(),
            data: None,
        }
    }

    /// Standard `-32603` object for bridge-internal failures.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        JsonRpcError {
            code: INTERNAL_ERROR,
            message: message.into(),
            data: None,
        }
    }
}
