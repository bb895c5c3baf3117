//! The delivery port: the single capability the bridge needs from its host.

use std::sync::Arc;

use thiserror::Error;

/// Failures reported by a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The other side is gone; nothing more can be delivered.
    #[error("transport is closed")]
    Closed,

    /// The transport refused this particular frame.
    #[error("transport rejected the frame: {0}")]
    Rejected(String),
}

/// Hands one serialized frame to the host.
///
/// Implementations must deliver frames in the order `deliver` is called and
/// must not block waiting for the receiver to process them.  Acceptance means
/// "queued for delivery", not "processed".
///
/// Infrastructure implementations live in [`crate::infrastructure`]; tests
/// use the generated `MockTransport` or a recording double.
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send + Sync {
    /// Delivers one frame.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the frame could not be accepted.
    fn deliver(&self, frame: &str) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn deliver(&self, frame: &str) -> Result<(), TransportError> {
        (**self).deliver(frame)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn deliver(&self, frame: &str) -> Result<(), TransportError> {
        (**self).deliver(frame)
    }
}
