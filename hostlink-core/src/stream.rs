//! Event stream lifecycle: connect, consume, reconnect.
//!
//! One task owns the stream for the life of the process. It connects
//! with the event-stream accept header, pipes body chunks through the
//! parser, and reacts to the two recognized events. On any close or
//! failure it clears the published endpoint, sleeps the fixed reconnect
//! delay, and connects again; the delay lives in the single place the
//! task can await it, so a second live reconnect timer cannot exist.
//! The loop never ends on its own; only the shutdown signal stops it.

use std::sync::Arc;

use reqwest::header;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::LinkConfig;
use crate::error::LinkError;
use crate::jsonrpc::JsonRpcResponse;
use crate::router::Router;
use crate::sse::{SseEvent, SseParser};

/// Event name announcing the submission endpoint path.
const ENDPOINT_EVENT: &str = "endpoint";

/// Event name carrying a JSON-RPC response.
const MESSAGE_EVENT: &str = "message";

/// Drives the event stream until `shutdown_rx` flips.
///
/// Spawn this once; it publishes endpoint announcements through
/// `endpoint_tx` and hands every streamed response to `router`.
pub async fn run_event_stream(
    client: reqwest::Client,
    config: Arc<LinkConfig>,
    endpoint_tx: watch::Sender<Option<String>>,
    router: Arc<Router>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.changed() => break,
            outcome = stream_once(&client, &config, &endpoint_tx, &router) => match outcome {
                Ok(()) => info!("event stream closed by host"),
                Err(error) => warn!(error = %error, "event stream failed"),
            },
        }

        // the endpoint died with the connection that announced it
        endpoint_tx.send_replace(None);

        debug!(delay = ?config.reconnect_delay, "reconnecting after delay");
        tokio::select! {
            biased;
            _ = shutdown_rx.changed() => break,
            () = tokio::time::sleep(config.reconnect_delay) => {}
        }
    }
    debug!("event stream task stopped");
}

/// One connection lifetime: connect, then consume until the stream ends.
async fn stream_once(
    client: &reqwest::Client,
    config: &LinkConfig,
    endpoint_tx: &watch::Sender<Option<String>>,
    router: &Router,
) -> Result<(), LinkError> {
    let mut response = client
        .get(&config.stream_url)
        .header(header::ACCEPT, "text/event-stream")
        .send()
        .await
        .map_err(|e| LinkError::Stream {
            reason: format!("connect failed: {e}"),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(LinkError::Stream {
            reason: format!("unexpected status {status}"),
        });
    }
    info!(url = %config.stream_url, "event stream connected");

    let mut parser = SseParser::new();
    while let Some(chunk) = response.chunk().await.map_err(|e| LinkError::Stream {
        reason: format!("read failed: {e}"),
    })? {
        for event in parser.push(&chunk) {
            handle_event(event, endpoint_tx, router).await;
        }
    }
    Ok(())
}

/// Reacts to one framed event from the stream.
async fn handle_event(
    event: SseEvent,
    endpoint_tx: &watch::Sender<Option<String>>,
    router: &Router,
) {
    match event.name.as_str() {
        ENDPOINT_EVENT => {
            info!(endpoint = %event.data, "submission endpoint announced");
            endpoint_tx.send_replace(Some(event.data));
        }
        MESSAGE_EVENT => match serde_json::from_str::<JsonRpcResponse>(&event.data) {
            Ok(response) => router.resolve(response).await,
            Err(error) => warn!(error = %error, "dropping malformed message payload"),
        },
        other => debug!(event = other, "ignoring unrecognized event"),
    }
}
