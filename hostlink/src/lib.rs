//! Hostlink CLI wrapper around the stdio-to-SSE bridge.

pub mod bridge;
pub mod cli;
pub mod error;
