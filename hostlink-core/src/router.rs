//! Request correlator: pairs submitted requests with streamed responses.
//!
//! Submissions travel one way (HTTP POST to the endpoint the stream
//! announced) and responses another (`message` events on the stream), so
//! the only thing binding a response to its caller is the request id.
//! Each submission parks a oneshot sender in the pending registry; the
//! stream task completes it through [`Router::resolve`]. Removal and
//! completion happen under the registry lock, so a waiter is resolved
//! exactly once no matter which of response, timeout, or submission
//! failure gets there first.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, oneshot, watch};
use tracing::{debug, warn};

use crate::config::LinkConfig;
use crate::error::LinkError;
use crate::jsonrpc::{JsonRpcId, JsonRpcRequest, JsonRpcResponse};
use crate::paths::translate_request;

/// What a waiter eventually receives.
type WaiterResult = Result<JsonRpcResponse, LinkError>;

/// Pending-request registry keyed by request id.
///
/// One oneshot sender per in-flight id. Completion removes the entry and
/// fires the sender in one step; a receiver that gave up (timeout) just
/// sees its send ignored.
#[derive(Debug, Default)]
struct PendingWaiters {
    waiters: HashMap<JsonRpcId, oneshot::Sender<WaiterResult>>,
}

impl PendingWaiters {
    /// Registers a waiter, refusing ids that are already in flight.
    fn register(&mut self, id: &JsonRpcId) -> Result<oneshot::Receiver<WaiterResult>, LinkError> {
        if self.waiters.contains_key(id) {
            return Err(LinkError::DuplicateId { id: id.to_string() });
        }
        let (tx, rx) = oneshot::channel();
        self.waiters.insert(id.clone(), tx);
        Ok(rx)
    }

    /// Completes and removes the waiter for `id`. Returns false when no
    /// such waiter exists.
    fn complete(&mut self, id: &JsonRpcId, outcome: WaiterResult) -> bool {
        if let Some(tx) = self.waiters.remove(id) {
            let _ = tx.send(outcome);
            true
        } else {
            false
        }
    }

    /// Removes the waiter for `id` without completing it.
    fn remove(&mut self, id: &JsonRpcId) -> bool {
        self.waiters.remove(id).is_some()
    }

    fn len(&self) -> usize {
        self.waiters.len()
    }
}

/// Correlates outbound submissions with responses arriving on the stream.
#[derive(Debug)]
pub struct Router {
    client: reqwest::Client,
    config: Arc<LinkConfig>,
    /// Scheme://authority of the stream URL; submission endpoint paths
    /// are appended to this.
    origin: String,
    endpoint_rx: watch::Receiver<Option<String>>,
    pending: Arc<Mutex<PendingWaiters>>,
}

impl Router {
    /// Builds a router for the stream URL in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::InvalidUrl`] when the stream URL does not
    /// parse or is not http(s).
    pub fn new(
        config: Arc<LinkConfig>,
        client: reqwest::Client,
        endpoint_rx: watch::Receiver<Option<String>>,
    ) -> Result<Self, LinkError> {
        let url = reqwest::Url::parse(&config.stream_url).map_err(|e| LinkError::InvalidUrl {
            url: config.stream_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(LinkError::InvalidUrl {
                url: config.stream_url.clone(),
                reason: format!("unsupported scheme `{}`", url.scheme()),
            });
        }
        let origin = url.origin().ascii_serialization();
        Ok(Router {
            client,
            config,
            origin,
            endpoint_rx,
            pending: Arc::new(Mutex::new(PendingWaiters::default())),
        })
    }

    /// Submits one request to the host and waits for its response.
    ///
    /// Blocks until an endpoint is known (bounded by the endpoint wait),
    /// translates paths, assigns an id when the request carries none,
    /// registers the waiter, then POSTs on a detached task so a
    /// caller-side timeout abandons the transfer without cancelling it.
    ///
    /// # Errors
    ///
    /// [`LinkError::NoEndpoint`] when no endpoint is announced in time,
    /// [`LinkError::DuplicateId`] when the id is already in flight,
    /// [`LinkError::Submit`] when the POST fails or is refused, and
    /// [`LinkError::ResponseTimeout`] when the host never streams an
    /// answer.
    pub async fn submit(&self, mut request: JsonRpcRequest) -> Result<JsonRpcResponse, LinkError> {
        let endpoint = self.wait_for_endpoint().await?;
        translate_request(&mut request, &self.config.share_root);

        let id = match request.id.clone() {
            Some(id) => id,
            None => {
                let generated = JsonRpcId::generate();
                debug!(id = %generated, method = %request.method, "assigned id to bare request");
                request.id = Some(generated.clone());
                generated
            }
        };

        let reply_rx = self.pending.lock().await.register(&id)?;

        let submit_url = format!("{}{}", self.origin, endpoint);
        tokio::spawn(post_and_watch(
            self.client.clone(),
            Arc::clone(&self.pending),
            submit_url,
            request,
            id.clone(),
        ));

        let timeout = self.config.response_timeout;
        match tokio::time::timeout(timeout, reply_rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => {
                self.pending.lock().await.remove(&id);
                Err(LinkError::Submit {
                    reason: "reply channel closed before delivery".to_string(),
                })
            }
            Err(_) => {
                if self.pending.lock().await.remove(&id) {
                    warn!(
                        id = %id,
                        timeout_secs = timeout.as_secs(),
                        "no streamed response before the deadline"
                    );
                } else {
                    debug!(id = %id, "response arrived as the timeout fired; dropped");
                }
                Err(LinkError::ResponseTimeout {
                    timeout_secs: timeout.as_secs(),
                })
            }
        }
    }

    /// Hands a streamed response to whichever waiter registered its id.
    ///
    /// Responses without an id, or whose id matches nothing (typically a
    /// waiter that already timed out), are dropped after logging.
    pub async fn resolve(&self, response: JsonRpcResponse) {
        let Some(id) = response.id.clone() else {
            warn!("dropping streamed response without an id");
            return;
        };
        if self.pending.lock().await.complete(&id, Ok(response)) {
            debug!(id = %id, "matched streamed response to pending request");
        } else {
            debug!(id = %id, "dropping streamed response with no pending request");
        }
    }

    /// Number of requests still awaiting a response.
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Waits until the stream has announced an endpoint, bounded by the
    /// configured endpoint wait.
    async fn wait_for_endpoint(&self) -> Result<String, LinkError> {
        let mut endpoint_rx = self.endpoint_rx.clone();
        let wait = self.config.endpoint_wait;
        match tokio::time::timeout(wait, endpoint_rx.wait_for(Option::is_some)).await {
            Ok(Ok(current)) => Ok(current.clone().unwrap_or_default()),
            Ok(Err(_)) | Err(_) => {
                warn!(
                    wait_secs = wait.as_secs(),
                    "no submission endpoint became available"
                );
                Err(LinkError::NoEndpoint {
                    wait_secs: wait.as_secs(),
                })
            }
        }
    }
}

/// Runs the submission POST and, on failure, fails the waiter.
///
/// Detached from the caller on purpose: the POST keeps running even if
/// the submitting side times out and walks away. A successful POST reply
/// is only an acknowledgement; the RPC response arrives on the stream.
async fn post_and_watch(
    client: reqwest::Client,
    pending: Arc<Mutex<PendingWaiters>>,
    url: String,
    request: JsonRpcRequest,
    id: JsonRpcId,
) {
    let failure = match client.post(&url).json(&request).send().await {
        Ok(reply) if reply.status().is_success() => {
            debug!(id = %id, status = %reply.status(), "request submitted");
            None
        }
        Ok(reply) => Some(LinkError::Submit {
            reason: format!("submission endpoint returned {}", reply.status()),
        }),
        Err(error) => Some(LinkError::Submit {
            reason: describe_transport_error(&error),
        }),
    };
    if let Some(error) = failure {
        warn!(id = %id, error = %error, url = %url, "request submission failed");
        pending.lock().await.complete(&id, Err(error));
    }
}

/// Maps a reqwest error to the phrase shown to the stdio peer.
fn describe_transport_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "connection to submission endpoint timed out".to_string()
    } else if error.is_connect() {
        format!("could not connect to submission endpoint: {error}")
    } else {
        error.to_string()
    }
}
