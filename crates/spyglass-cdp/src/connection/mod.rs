//! CDP WebSocket connection management.
//!
//! A [`CdpConnection`] owns exactly one WebSocket to a tab-level debugger
//! endpoint and multiplexes a request/response protocol with asynchronous
//! event streams over it. One spawned read pump parses inbound frames and
//! routes responses to their waiters; one spawned write task serializes all
//! outbound frames so there is never more than one writer on the socket.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{Mutex, broadcast, mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, instrument, trace, warn};

use crate::error::CdpError;
use crate::transport::{CdpEvent, CdpMessage, CdpRequest, CdpResponse};

pub mod discovery;

/// Default per-command timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Buffer size for the event broadcast channel.
const EVENT_CHANNEL_SIZE: usize = 512;

/// Outbound command queue capacity.
const WRITE_QUEUE_SIZE: usize = 64;

/// Largest inbound frame the pump will parse. Oversized frames kill the
/// connection rather than the process.
const MAX_FRAME_BYTES: usize = 32 * 1024 * 1024;

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<CdpResponse>>>>;

/// Tuning knobs for a [`CdpConnection`].
#[derive(Debug, Clone)]
pub struct CdpConnectionOptions {
    /// Default deadline applied to [`CdpConnection::send_command`].
    pub command_timeout: Duration,
    /// Capacity of the event broadcast channel.
    pub event_capacity: usize,
}

impl Default for CdpConnectionOptions {
    fn default() -> Self {
        Self {
            command_timeout: DEFAULT_TIMEOUT,
            event_capacity: EVENT_CHANNEL_SIZE,
        }
    }
}

impl CdpConnectionOptions {
    /// Create options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default command timeout.
    #[must_use]
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }
}

/// A live CDP connection bound to one debugger endpoint.
#[derive(Debug)]
pub struct CdpConnection {
    /// Sender feeding the serialized write task.
    tx: mpsc::Sender<CdpRequest>,
    /// Broadcast side of the event fan-out.
    event_tx: broadcast::Sender<CdpEvent>,
    /// In-flight commands awaiting a response, keyed by command ID.
    pending: PendingMap,
    /// Monotonic command ID counter, starts at 1.
    next_id: AtomicU64,
    /// Set once the transport is gone, by whichever side noticed first.
    closed: Arc<AtomicBool>,
    /// Default deadline for commands without an explicit one.
    command_timeout: Duration,
    /// Handle to the background read pump.
    read_handle: tokio::task::JoinHandle<()>,
    /// Handle to the background write task.
    write_handle: tokio::task::JoinHandle<()>,
}

impl CdpConnection {
    /// Connect to a CDP WebSocket endpoint with default options.
    ///
    /// # Errors
    ///
    /// Returns an error if the WebSocket handshake fails.
    pub async fn connect(ws_url: &str) -> Result<Self, CdpError> {
        Self::connect_with_options(ws_url, &CdpConnectionOptions::default()).await
    }

    /// Connect to a CDP WebSocket endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the WebSocket handshake fails.
    #[instrument(level = "debug", skip(ws_url, options), fields(ws_url = %ws_url))]
    pub async fn connect_with_options(
        ws_url: &str,
        options: &CdpConnectionOptions,
    ) -> Result<Self, CdpError> {
        let (ws_stream, response) = tokio_tungstenite::connect_async(ws_url)
            .await
            .map_err(|e| CdpError::ConnectionFailed(e.to_string()))?;
        debug!(status = %response.status(), "WebSocket connection established");

        let (write, read) = ws_stream.split();

        let (tx, rx) = mpsc::channel::<CdpRequest>(WRITE_QUEUE_SIZE);
        let (event_tx, _) = broadcast::channel::<CdpEvent>(options.event_capacity);
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let closed = Arc::new(AtomicBool::new(false));

        let write_handle = tokio::spawn(Self::write_loop(rx, write));
        let read_handle = tokio::spawn(Self::read_loop(
            read,
            pending.clone(),
            event_tx.clone(),
            closed.clone(),
        ));

        Ok(Self {
            tx,
            event_tx,
            pending,
            next_id: AtomicU64::new(1),
            closed,
            command_timeout: options.command_timeout,
            read_handle,
            write_handle,
        })
    }

    /// Background task owning the write half: the single writer.
    async fn write_loop<S>(mut rx: mpsc::Receiver<CdpRequest>, mut sink: S)
    where
        S: futures_util::Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
    {
        trace!("CDP write loop started");
        while let Some(request) = rx.recv().await {
            let json = match serde_json::to_string(&request) {
                Ok(j) => j,
                Err(e) => {
                    error!(error = %e, method = %request.method, "Failed to serialize CDP request");
                    continue;
                }
            };

            trace!(id = request.id, method = %request.method, "Sending CDP request");

            if sink.send(Message::Text(json.into())).await.is_err() {
                warn!("WebSocket sink closed, ending write loop");
                break;
            }
        }
        trace!("CDP write loop ended");
    }

    /// Background pump owning the read half: the single reader.
    ///
    /// Routes responses to waiters and fans events out to subscribers. When
    /// the stream ends for any reason, every pending waiter is failed.
    async fn read_loop<S>(
        mut stream: S,
        pending: PendingMap,
        event_tx: broadcast::Sender<CdpEvent>,
        closed: Arc<AtomicBool>,
    ) where
        S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
            + Unpin,
    {
        trace!("CDP read loop started");
        while let Some(msg) = stream.next().await {
            let text = match msg {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "WebSocket closed by remote");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "WebSocket error, ending read loop");
                    break;
                }
                Ok(_) => continue,
            };

            if text.len() > MAX_FRAME_BYTES {
                error!(size = text.len(), max = MAX_FRAME_BYTES, "Inbound frame too large");
                break;
            }

            let cdp_msg: CdpMessage = match serde_json::from_str(&text) {
                Ok(m) => m,
                Err(e) => {
                    error!(error = %e, "Failed to parse CDP message");
                    break;
                }
            };

            match cdp_msg {
                CdpMessage::Response(resp) => {
                    let id = resp.id;
                    let mut pending = pending.lock().await;
                    if let Some(sender) = pending.remove(&id) {
                        let _ = sender.send(resp);
                    } else {
                        // Either a duplicate response or an id we never
                        // issued; both are protocol bugs on the far side.
                        warn!(id = id, "Dropping response for unknown or already-resolved command");
                    }
                }
                CdpMessage::Event(event) => {
                    trace!(method = %event.method, "Received CDP event");
                    // Fan out in arrival order; ignore if no receivers.
                    let _ = event_tx.send(event);
                }
            }
        }

        // Transport is gone: fail every in-flight command by dropping its
        // result slot, which surfaces ConnectionLost to the waiter.
        closed.store(true, Ordering::SeqCst);
        let dropped = pending.lock().await.drain().count();
        if dropped > 0 {
            warn!(count = dropped, "Failing pending commands after connection loss");
        }
        trace!("CDP read loop ended");
    }

    /// Send a CDP command and wait for its response with the default deadline.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be queued, the response times
    /// out, the transport drops, or the browser returns a protocol error.
    pub async fn send_command<P, R>(&self, method: &str, params: Option<P>) -> Result<R, CdpError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        self.send_command_with_timeout(method, params, self.command_timeout)
            .await
    }

    /// Send a CDP command with an explicit deadline.
    ///
    /// The deadline bounds only the local wait; CDP has no cancel, so the
    /// command may still execute in the browser after a timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be queued, the response times
    /// out, the transport drops, or the browser returns a protocol error.
    #[instrument(level = "trace", skip(self, params), fields(method = %method))]
    pub async fn send_command_with_timeout<P, R>(
        &self,
        method: &str,
        params: Option<P>,
        timeout_duration: Duration,
    ) -> Result<R, CdpError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        if self.is_closed() {
            return Err(CdpError::ConnectionLost);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let params_value = params.map(serde_json::to_value).transpose()?;

        let request = CdpRequest {
            id,
            method: method.to_string(),
            params: params_value,
        };

        // Register the waiter before queueing the write so a fast response
        // cannot race past its slot.
        let (resp_tx, resp_rx) = oneshot::channel();
        self.pending.lock().await.insert(id, resp_tx);

        if self.tx.send(request).await.is_err() {
            self.pending.lock().await.remove(&id);
            return Err(CdpError::SendFailed("write queue closed".to_string()));
        }

        let response = match timeout(timeout_duration, resp_rx).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(_)) => return Err(CdpError::ConnectionLost),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                warn!(id = id, method = %method, "CDP command timed out");
                return Err(CdpError::Timeout(timeout_duration));
            }
        };

        if let Some(error) = response.error {
            warn!(id = id, method = %method, code = error.code, error_msg = %error.message, "CDP protocol error");
            return Err(CdpError::Protocol {
                code: error.code,
                message: error.message,
            });
        }

        let result = response.result.unwrap_or(Value::Null);
        serde_json::from_value(result).map_err(CdpError::from)
    }

    /// Subscribe to CDP events.
    ///
    /// Events are delivered in arrival order. Slow subscribers may observe
    /// lag on the broadcast channel; they never block the pump.
    pub fn subscribe_events(&self) -> broadcast::Receiver<CdpEvent> {
        self.event_tx.subscribe()
    }

    /// Non-blocking closed signal.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Tear down the connection: stops both background tasks and fails all
    /// in-flight commands. Idempotent.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!("Closing CDP connection");
        self.read_handle.abort();
        self.write_handle.abort();
        self.pending.lock().await.clear();
    }
}

impl Drop for CdpConnection {
    fn drop(&mut self) {
        // Tasks hold the socket halves; aborting them releases the fd.
        self.read_handle.abort();
        self.write_handle.abort();
    }
}

#[cfg(test)]
mod tests;
