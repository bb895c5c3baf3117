//! In-process transport backed by an unbounded Tokio channel.
//!
//! Useful when the host's message pump runs on its own task: the pump owns
//! the receiver and forwards each frame to the WebView however it likes.
//! Tests use it to capture exactly what would have been put on the wire.

use tokio::sync::mpsc;

use crate::application::transport::{Transport, TransportError};

/// Queues each frame on an unbounded channel.
///
/// `deliver` never blocks.  Once the receiver is dropped every call returns
/// [`TransportError::Closed`].
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelTransport {
    /// Creates a transport and the receiver that will see its frames, in
    /// delivery order.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Transport for ChannelTransport {
    fn deliver(&self, frame: &str) -> Result<(), TransportError> {
        self.tx
            .send(frame.to_string())
            .map_err(|_| TransportError::Closed)
    }
}
