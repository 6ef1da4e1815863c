//! Error types for the bridge engine.
//!
//! `LinkError` covers every failure the engine can surface: startup
//! misconfiguration, event-stream trouble, and the per-request failures
//! that become JSON-RPC error responses on stdout.

use crate::jsonrpc::JsonRpcError;

/// Errors raised while moving requests between the stdio peer and the host.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// The configured event-stream URL could not be parsed.
    #[error("invalid event stream URL `{url}`: {reason}")]
    InvalidUrl {
        /// The URL as configured.
        url: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// The shared HTTP client could not be constructed.
    #[error("failed to build HTTP client: {reason}")]
    ClientBuild {
        /// Builder diagnostic.
        reason: String,
    },

    /// The event-stream connection failed, returned a non-success status,
    /// or broke mid-read. Handled internally by reconnecting.
    #[error("event stream failure: {reason}")]
    Stream {
        /// What went wrong with the stream.
        reason: String,
    },

    /// No submission endpoint was announced within the wait window.
    #[error("no submission endpoint became available within {wait_secs}s")]
    NoEndpoint {
        /// How long the caller waited, in seconds.
        wait_secs: u64,
    },

    /// The host did not stream back a response before the deadline.
    #[error("no response from host within {timeout_secs}s")]
    ResponseTimeout {
        /// The deadline that expired, in seconds.
        timeout_secs: u64,
    },

    /// A request reused an id that is still awaiting its response.
    #[error("request id {id} is already in flight")]
    DuplicateId {
        /// The contested id, rendered for display.
        id: String,
    },

    /// The submission POST could not be delivered or was refused.
    #[error("request submission failed: {reason}")]
    Submit {
        /// Transport or status diagnostic.
        reason: String,
    },
}

impl LinkError {
    /// Renders this error as the JSON-RPC error object reported to the
    /// stdio peer.
    #[must_use]
    pub fn to_rpc_error(&self) -> JsonRpcError {
        JsonRpcError::internal(self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsonrpc::INTERNAL_ERROR;

    #[test]
    fn display_includes_wait_window() {
        let err = LinkError::NoEndpoint { wait_secs: 20 };
        assert_eq!(
            err.to_string(),
            "no submission endpoint became available within 20s"
        );
    }

    #[test]
    fn rpc_error_uses_internal_code() {
        let err = LinkError::ResponseTimeout { timeout_secs: 30 };
        let rpc = err.to_rpc_error();
        assert_eq!(rpc.code, INTERNAL_ERROR);
        assert!(rpc.message.contains("30s"));
    }
}
