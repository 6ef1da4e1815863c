//! Forward path: input lines become submissions, replies come back in
//! completion order.
//!
//! One loop owns the inbound reader. Each parsed request is served on
//! its own task so a slow tool call never blocks the next line; the
//! shared writer mutex keeps the reply lines whole. Nothing that happens
//! to a single request can break the loop; the only exits are end of
//! input and a failed read.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncWrite};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use hostlink_core::config::LinkConfig;
use hostlink_core::jsonrpc::JsonRpcRequest;
use hostlink_core::router::Router;

use super::helpers::{bounded_read_line, error_line, parse_error_line, response_line, write_stdout};
use super::ndjson::{MAX_MESSAGE_BYTES, parse_line};
use crate::error::FramingError;

/// Reads the peer until end of input, submitting each parsed line.
pub(super) async fn agent_to_host<R, W>(
    config: Arc<LinkConfig>,
    router: Arc<Router>,
    reader: &mut R,
    stdout: Arc<Mutex<W>>,
) where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let mut raw_buf = Vec::new();
    loop {
        raw_buf.clear();
        let bytes_read = match bounded_read_line(reader, &mut raw_buf, MAX_MESSAGE_BYTES).await {
            Ok(n) => n,
            Err(FramingError::MessageTooLarge { max_bytes }) => {
                warn!(max_bytes, "dropping oversized input line");
                reply_to_parse_failure(&config, &stdout).await;
                continue;
            }
            Err(FramingError::Io(error)) => {
                warn!(error = %error, "input read failed, treating as closed");
                break;
            }
            Err(error) => {
                warn!(error = %error, "dropping unreadable input line");
                continue;
            }
        };
        if bytes_read == 0 {
            info!("input stream closed");
            break;
        }

        let line = String::from_utf8_lossy(&raw_buf);
        if line.trim().is_empty() {
            continue;
        }

        match parse_line(&line) {
            Ok(request) => {
                debug!(method = %request.method, id = ?request.id, "request accepted");
                tokio::spawn(serve_request(
                    Arc::clone(&router),
                    Arc::clone(&stdout),
                    request,
                ));
            }
            Err(error) => {
                warn!(error = %error, "dropping malformed input line");
                reply_to_parse_failure(&config, &stdout).await;
            }
        }
    }
}

/// Submits one request and writes its reply, success or synthesized
/// error. The error reply echoes the id the caller sent.
async fn serve_request<W>(router: Arc<Router>, stdout: Arc<Mutex<W>>, request: JsonRpcRequest)
where
    W: AsyncWrite + Unpin,
{
    let id = request.id.clone();
    let line = match router.submit(request).await {
        Ok(response) => response_line(&response),
        Err(error) => {
            warn!(id = ?id, error = %error, "request failed");
            error_line(id, &error)
        }
    };
    if let Err(error) = write_stdout(&stdout, line.as_bytes()).await {
        warn!(error = %error, "failed to write reply");
    }
}

/// Answers an unparseable line when configured to; the default is the
/// logged drop above.
async fn reply_to_parse_failure<W>(config: &LinkConfig, stdout: &Mutex<W>)
where
    W: AsyncWrite + Unpin,
{
    if !config.reply_parse_errors {
        return;
    }
    let line = parse_error_line();
    if let Err(error) = write_stdout(stdout, line.as_bytes()).await {
        warn!(error = %error, "failed to write parse error reply");
    }
}
