//! Shared I/O utilities and reply formatting for the bridge.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use hostlink_core::error::LinkError;
use hostlink_core::jsonrpc::{JsonRpcError, JsonRpcId, JsonRpcResponse};

use crate::error::FramingError;

// ─────────────────────────────────────────────────────────────────────────────
// Reply Formatting
// ─────────────────────────────────────────────────────────────────────────────

/// Renders a response as one newline-terminated output line.
pub(super) fn response_line(response: &JsonRpcResponse) -> String {
    let mut line = serde_json::to_string(response).unwrap_or_else(|_| "{}".to_string());
    line.push('\n');
    line
}

/// Renders the synthesized reply for a request that failed inside the
/// bridge, echoing the id the caller sent (null when it sent none).
pub(super) fn error_line(id: Option<JsonRpcId>, error: &LinkError) -> String {
    response_line(&JsonRpcResponse::error(id, error.to_rpc_error()))
}

/// Renders the `-32700` reply for input that never parsed. The id is
/// null; there is nothing to echo.
pub(super) fn parse_error_line() -> String {
    response_line(&JsonRpcResponse::error(None, JsonRpcError::parse_error()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared Output Writer
// ─────────────────────────────────────────────────────────────────────────────

/// Writes one reply through the shared writer and flushes it.
///
/// Every per-request task writes to the same descriptor; serializing
/// through the mutex keeps output lines whole.
pub(super) async fn write_stdout<W>(stdout: &Mutex<W>, data: &[u8]) -> Result<(), std::io::Error>
where
    W: AsyncWrite + Unpin,
{
    let mut guard = stdout.lock().await;
    guard.write_all(data).await?;
    guard.flush().await
}

// ─────────────────────────────────────────────────────────────────────────────
// Bounded Line Reading
// ─────────────────────────────────────────────────────────────────────────────

/// Reads a single line from an async buffered reader, enforcing a byte
/// limit.
///
/// Unlike bare `read_line`, this will not grow memory without bound when
/// the peer streams bytes with no newline. Once the accumulated bytes
/// pass `max_bytes` the remainder of the offending line is drained and
/// [`FramingError::MessageTooLarge`] is returned, leaving the reader
/// positioned at the next line.
///
/// Bytes accumulate as raw `Vec<u8>` so multi-byte characters straddling
/// internal buffer boundaries are never split; the caller converts to a
/// string once the full line is assembled.
///
/// # Returns
///
/// - `Ok(n)` with `n > 0`: a complete line was appended to `buf`
/// - `Ok(0)`: end of input
/// - `Err(FramingError::MessageTooLarge)`: line exceeded `max_bytes`
/// - `Err(FramingError::Io)`: underlying read failure
pub(super) async fn bounded_read_line<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    max_bytes: usize,
) -> Result<usize, FramingError>
where
    R: AsyncBufRead + Unpin,
{
    let mut total = 0usize;
    loop {
        let available = reader.fill_buf().await.map_err(FramingError::Io)?;

        if available.is_empty() {
            // end of input: hand back whatever accumulated
            return Ok(total);
        }

        match available.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                let to_consume = pos + 1;
                if total + to_consume > max_bytes {
                    reader.consume(to_consume);
                    return Err(FramingError::MessageTooLarge { max_bytes });
                }
                buf.extend_from_slice(&available[..to_consume]);
                total += to_consume;
                reader.consume(to_consume);
                return Ok(total);
            }
            None => {
                let len = available.len();
                if total + len > max_bytes {
                    reader.consume(len);
                    drain_until_newline(reader).await;
                    return Err(FramingError::MessageTooLarge { max_bytes });
                }
                buf.extend_from_slice(available);
                total += len;
                reader.consume(len);
            }
        }
    }
}

/// Skips bytes until a newline or end of input, so the reader lands on
/// the start of the next line after an oversized one. Bounded by a
/// 30-second timeout in case the peer stalls mid-line.
async fn drain_until_newline<R>(reader: &mut R)
where
    R: AsyncBufRead + Unpin,
{
    let drain = async {
        loop {
            match reader.fill_buf().await {
                Ok([]) => return,
                Ok(available) => {
                    if let Some(pos) = available.iter().position(|&b| b == b'\n') {
                        let consume = pos + 1;
                        reader.consume(consume);
                        return;
                    }
                    let len = available.len();
                    reader.consume(len);
                }
                Err(error) => {
                    tracing::warn!(error = %error, "read failed while draining oversized line");
                    return;
                }
            }
        }
    };
    if tokio::time::timeout(std::time::Duration::from_secs(30), drain)
        .await
        .is_err()
    {
        tracing::warn!("gave up draining an oversized line after 30s");
    }
}
