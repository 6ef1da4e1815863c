//! Hostlink Core — protocol engine for the stdio-to-SSE bridge.
//!
//! This library provides everything the `hostlink` binary needs apart from
//! its stdio front end: JSON-RPC 2.0 types, the incremental event-stream
//! parser, path translation between the sandbox and host namespaces, the
//! request correlator that pairs submissions with streamed responses, the
//! self-healing event-stream task, and the shared configuration and error
//! types.

pub mod config;
pub mod error;
pub mod jsonrpc;
pub mod paths;
pub mod router;
pub mod sse;
pub mod stream;
