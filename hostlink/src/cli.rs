//! Command-line arguments for the `hostlink` binary.
//!
//! Defined separately from `main.rs` so integration tests can construct
//! them directly.

use clap::Parser;

use hostlink_core::config::{DEFAULT_SHARE_ROOT, DEFAULT_STREAM_URL, LinkConfig};

/// Bridges a stdio MCP client to an SSE-transport tool host.
#[derive(Parser, Debug)]
#[command(name = "hostlink", version)]
pub struct LinkArgs {
    /// URL of the host's event-stream endpoint.
    #[arg(long, short = 'u', env = "HOSTLINK_SSE_URL", default_value = DEFAULT_STREAM_URL)]
    pub url: String,

    /// Host share root prepended to rewritten sandbox paths.
    #[arg(long, env = "HOSTLINK_SHARE_ROOT", default_value = DEFAULT_SHARE_ROOT)]
    pub share_root: String,

    /// Reply to unparseable input lines with a JSON-RPC parse error
    /// instead of dropping them.
    #[arg(long)]
    pub reply_parse_errors: bool,

    /// Enable debug logging on stderr.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl LinkArgs {
    /// Folds the command line over environment-derived settings.
    ///
    /// Flags layer on top of `LinkConfig::from_env`, so the timeout
    /// knobs remain reachable through the environment while the common
    /// settings get first-class flags.
    #[must_use]
    pub fn into_config(self) -> LinkConfig {
        let mut config = LinkConfig::from_env();
        config.stream_url = self.url;
        config.share_root = self.share_root;
        config.reply_parse_errors = config.reply_parse_errors || self.reply_parse_errors;
        config
    }
}
