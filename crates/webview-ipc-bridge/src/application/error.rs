//! Error taxonomy for the send side of the bridge.

use thiserror::Error;
use webview_ipc_core::CodecError;

use crate::application::transport::TransportError;
use crate::domain::{ConfigError, StreamId};

/// Errors returned by [`crate::application::IpcSender`] and the stream
/// sender.
///
/// Nothing is retried or swallowed: every failure goes back to the caller,
/// who decides whether to retry, drop, or alert.  Frames that were already
/// delivered are never retracted.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The arguments could not be put on the wire.  Nothing was sent.
    #[error("message could not be serialized: {0}")]
    Serialization(#[from] CodecError),

    /// The transport refused the frame.
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    /// A data stream was requested with a chunk size of zero.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,

    /// A chunked transfer stopped part-way through.
    ///
    /// `chunks_delivered` chunks reached the transport before the failure;
    /// no terminal chunk was sent, so the receiver sees a truncated stream.
    #[error("stream {stream_id} abandoned after {chunks_delivered} chunk(s): {source}")]
    PartialStream {
        stream_id: StreamId,
        chunks_delivered: u64,
        #[source]
        source: Box<BridgeError>,
    },

    /// Reading the stream source failed.
    #[error("failed to read stream source: {0}")]
    SourceRead(#[from] std::io::Error),

    /// The transfer was cancelled before its terminal chunk.
    #[error("stream {stream_id} cancelled after {chunks_delivered} chunk(s)")]
    Cancelled {
        stream_id: StreamId,
        chunks_delivered: u64,
    },

    /// The background stream task panicked or was aborted.
    #[error("stream task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl BridgeError {
    /// Number of chunks that reached the transport, for stream failures.
    pub fn chunks_delivered(&self) -> Option<u64> {
        match self {
            BridgeError::PartialStream {
                chunks_delivered, ..
            }
            | BridgeError::Cancelled {
                chunks_delivered, ..
            } => Some(*chunks_delivered),
            _ => None,
        }
    }
}
