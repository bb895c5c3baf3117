//! WebSocket transport: each frame becomes one text message.
//!
//! Hosts that run the WebView out of process (a remote renderer, a test
//! harness, a devtools proxy) can expose a WebSocket endpoint instead of an
//! in-process callback.
//!
//! # Threading model
//!
//! [`Transport::deliver`] is synchronous, but writing to a socket is not.  The
//! transport therefore owns a background task (the *pump*) that holds the
//! socket; `deliver` only pushes the frame onto an unbounded channel that the
//! pump drains in order.  The pump also reads the socket so control frames
//! (ping, close) are processed, and discards any data the peer sends.
//!
//! When the socket fails or the peer closes, the pump exits and every later
//! `deliver` returns [`TransportError::Closed`].  Frames queued but not yet
//! written at that moment are lost.

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, Message as WsMessage},
    WebSocketStream,
};
use tracing::{debug, info, warn};

use crate::application::transport::{Transport, TransportError};

/// Sends frames as WebSocket text messages.
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    tx: mpsc::UnboundedSender<String>,
}

impl WebSocketTransport {
    /// Opens a client connection to `url` (e.g. `ws://127.0.0.1:9000/ipc`).
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP connection or the WebSocket handshake
    /// fails.
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let (ws_stream, _response) = connect_async(url)
            .await
            .with_context(|| format!("failed to open WebSocket transport to {url}"))?;

        info!("WebSocket transport connected to {url}");
        Ok(Self::from_stream(ws_stream))
    }

    /// Wraps an already-established WebSocket, client or server side.
    ///
    /// Must be called from within a Tokio runtime; the pump task is spawned
    /// immediately.
    pub fn from_stream<S>(ws_stream: WebSocketStream<S>) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(pump(ws_stream, rx));
        Self { tx }
    }
}

impl Transport for WebSocketTransport {
    fn deliver(&self, frame: &str) -> Result<(), TransportError> {
        self.tx
            .send(frame.to_string())
            .map_err(|_| TransportError::Closed)
    }
}

/// Writes queued frames to the socket until either side goes away.
async fn pump<S>(ws_stream: WebSocketStream<S>, mut frames: mpsc::UnboundedReceiver<String>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    loop {
        tokio::select! {
            frame = frames.recv() => match frame {
                Some(frame) => {
                    if let Err(e) = ws_tx.send(WsMessage::Text(frame)).await {
                        warn!("WebSocket transport send failed: {e}");
                        break;
                    }
                }
                None => {
                    // Every sender handle is gone; close politely.
                    debug!("WebSocket transport dropped; closing socket");
                    let _ = ws_tx.close().await;
                    break;
                }
            },
            inbound = ws_rx.next() => match inbound {
                Some(Ok(WsMessage::Close(_))) | None => {
                    debug!("WebSocket peer closed the transport");
                    break;
                }
                Some(Ok(msg)) => {
                    debug!("ignoring inbound WebSocket message ({} bytes)", msg.len());
                }
                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) => break,
                Some(Err(e)) => {
                    warn!("WebSocket transport read failed: {e}");
                    break;
                }
            },
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
