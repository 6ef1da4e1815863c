//! Hostlink CLI entry point.
//!
//! Parses arguments, initialises stderr logging, and runs the bridge
//! over the process's stdin and stdout.

use std::sync::Arc;

use clap::Parser;
use tokio::io::BufReader;

use hostlink::bridge::run_bridge;
use hostlink::cli::LinkArgs;

// ─────────────────────────────────────────────────────────────────────────────
// Entry Point
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let args = LinkArgs::parse();
    init_tracing(args.verbose);

    let config = Arc::new(args.into_config());
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();

    let code = match run_bridge(config, stdin, stdout).await {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!(error = %e, "bridge failed");
            eprintln!("hostlink: {e}");
            1
        }
    };

    std::process::exit(code);
}

// ─────────────────────────────────────────────────────────────────────────────
// Tracing Init
// ─────────────────────────────────────────────────────────────────────────────

/// Initialise tracing subscriber with stderr output.
///
/// When `verbose` is true, sets filter to `debug`. Otherwise, respects
/// `RUST_LOG` environment variable (defaulting to no output). stdout
/// carries the reply stream, so diagnostics must stay on stderr.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
