//! Bridge orchestration: client construction, task wiring, shutdown.
//!
//! `run_bridge` owns the process lifecycle. It builds the shared HTTP
//! client, spawns the event-stream task, and then drives the inbound
//! read loop on the current task. When the inbound stream closes it
//! signals the stream task, logs any requests left waiting, and returns;
//! that return is the process's only clean exit.

mod agent_to_host;
mod helpers;
mod ndjson;

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncWrite};
use tokio::sync::{Mutex, watch};
use tracing::{error, info, warn};

use hostlink_core::config::LinkConfig;
use hostlink_core::error::LinkError;
use hostlink_core::router::Router;
use hostlink_core::stream::run_event_stream;

/// Runs the bridge over the given inbound reader and outbound writer
/// until the reader closes.
///
/// The reader and writer are parameters rather than hardwired process
/// handles so integration tests can drive the whole loop through
/// in-memory pipes; `main` passes stdin and stdout.
///
/// # Errors
///
/// Fails only before any traffic moves: an unusable stream URL or an
/// HTTP client that cannot be built. Once running, every fault is
/// logged and absorbed.
pub async fn run_bridge<R, W>(
    config: Arc<LinkConfig>,
    mut reader: R,
    writer: W,
) -> Result<(), LinkError>
where
    R: AsyncBufRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let client = reqwest::Client::builder()
        .connect_timeout(config.connect_timeout)
        .build()
        .map_err(|e| LinkError::ClientBuild {
            reason: e.to_string(),
        })?;

    let (endpoint_tx, endpoint_rx) = watch::channel(None);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let router = Arc::new(Router::new(
        Arc::clone(&config),
        client.clone(),
        endpoint_rx,
    )?);

    let stream_task = tokio::spawn(run_event_stream(
        client,
        Arc::clone(&config),
        endpoint_tx,
        Arc::clone(&router),
        shutdown_rx,
    ));

    info!(url = %config.stream_url, "bridge started");

    let stdout = Arc::new(Mutex::new(writer));
    agent_to_host::agent_to_host(Arc::clone(&config), Arc::clone(&router), &mut reader, stdout)
        .await;

    // inbound side is gone; stop the stream and leave
    let _ = shutdown_tx.send(true);
    let orphaned = router.pending_count().await;
    if orphaned > 0 {
        warn!(count = orphaned, "requests still pending at shutdown");
    }
    if let Err(join_error) = stream_task.await {
        error!(error = %join_error, "event stream task failed to stop cleanly");
    }
    info!("bridge stopped");
    Ok(())
}
