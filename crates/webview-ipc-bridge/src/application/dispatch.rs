//! The dispatch facade: one method per thing the page can tell the host.
//!
//! Every method builds its positional arguments, serializes them with
//! [`serialize_message`], and hands the frame to the [`Transport`].
//! Serialization happens first, so a value that cannot be encoded never
//! reaches the transport.
//!
//! Methods return as soon as the transport accepts the frame.  None of them
//! wait for a reply; `BeginInvokeDotNet` results come back as separate inbound
//! messages correlated by call id, which is the caller's business.

use std::sync::Arc;

use serde::Serialize;
use tokio::io::AsyncRead;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use webview_ipc_core::{base64_encode, serialize_message, Arg, MessageKind};

use crate::application::error::BridgeError;
use crate::application::stream_sender::{
    send_stream, send_stream_from_reader, CancelFlag, ChunkSink, StreamOptions, StreamReport,
};
use crate::application::transport::Transport;
use crate::domain::{BridgeConfig, CallId, EventDescriptor, StreamChunk, StreamId};

/// Sends typed messages over a [`Transport`].
///
/// Cheap to clone: clones share the same transport and configuration.  The
/// default type parameter lets hosts hold an `IpcSender` over
/// `Arc<dyn Transport>` without naming the concrete transport.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use webview_ipc_bridge::application::IpcSender;
/// use webview_ipc_bridge::domain::BridgeConfig;
/// use webview_ipc_bridge::infrastructure::ChannelTransport;
///
/// let (transport, mut frames) = ChannelTransport::new();
/// let sender = IpcSender::new(Arc::new(transport), BridgeConfig::default());
///
/// sender.send_location_changed("https://app/settings", false).unwrap();
/// assert_eq!(
///     frames.try_recv().unwrap(),
///     r#"__bwv:["OnLocationChanged","https://app/settings",false]"#
/// );
/// ```
pub struct IpcSender<T: ?Sized = dyn Transport> {
    transport: Arc<T>,
    config: Arc<BridgeConfig>,
}

impl<T: ?Sized> Clone for IpcSender<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            config: Arc::clone(&self.config),
        }
    }
}

impl<T: Transport + ?Sized> IpcSender<T> {
    pub fn new(transport: Arc<T>, config: BridgeConfig) -> Self {
        Self {
            transport,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    // ── Single-frame messages ─────────────────────────────────────────────────

    /// Announces that the page has attached: `AttachPage(baseUrl, startUrl)`.
    pub fn send_attach_page(&self, base_url: &str, start_url: &str) -> Result<(), BridgeError> {
        self.send(
            MessageKind::AttachPage,
            vec![Arg::from(base_url), Arg::from(start_url)],
        )
    }

    /// Acknowledges a render batch: `OnRenderCompleted(batchId, errorOrNull)`.
    pub fn send_render_completed(
        &self,
        batch_id: u64,
        error: Option<&str>,
    ) -> Result<(), BridgeError> {
        self.send(
            MessageKind::OnRenderCompleted,
            vec![Arg::from(batch_id), Arg::from(error)],
        )
    }

    /// Forwards a UI event: `DispatchBrowserEvent(descriptor, eventArgs)`.
    ///
    /// Both values are embedded as JSON objects, not as strings.
    ///
    /// # Errors
    ///
    /// [`BridgeError::Serialization`] if `event_args` cannot be represented as
    /// JSON; nothing is sent in that case.
    pub fn send_browser_event<A>(
        &self,
        descriptor: &EventDescriptor,
        event_args: &A,
    ) -> Result<(), BridgeError>
    where
        A: Serialize + ?Sized,
    {
        self.send(
            MessageKind::DispatchBrowserEvent,
            vec![Arg::json(descriptor)?, Arg::json(event_args)?],
        )
    }

    /// Starts a host-side method call:
    /// `BeginInvokeDotNet(callId, assemblyName, methodIdentifier, targetObjectId, argsJson)`.
    ///
    /// - `call_id` zero is sent as `null` (fire-and-forget); see
    ///   [`CallId::to_wire`].
    /// - A missing `target_object_id` is sent as `0`, meaning "static method".
    /// - `args_json` is sent as a JSON *string*; the receiver parses it.
    pub fn send_begin_invoke_dotnet(
        &self,
        call_id: CallId,
        assembly_name: Option<&str>,
        method_identifier: &str,
        target_object_id: Option<u64>,
        args_json: &str,
    ) -> Result<(), BridgeError> {
        self.send(
            MessageKind::BeginInvokeDotNet,
            vec![
                Arg::from(call_id.to_wire()),
                Arg::from(assembly_name),
                Arg::from(method_identifier),
                Arg::from(target_object_id.unwrap_or(0)),
                Arg::from(args_json),
            ],
        )
    }

    /// Completes a host-initiated call: `EndInvokeJS(asyncHandle, succeeded, result)`.
    ///
    /// `result_json` must already be serialized JSON and is embedded verbatim.
    ///
    /// # Errors
    ///
    /// [`BridgeError::Serialization`] if `result_json` is not valid JSON.
    pub fn send_end_invoke_js(
        &self,
        async_handle: u64,
        succeeded: bool,
        result_json: &str,
    ) -> Result<(), BridgeError> {
        self.send(
            MessageKind::EndInvokeJs,
            vec![
                Arg::from(async_handle),
                Arg::from(succeeded),
                Arg::raw_json(result_json)?,
            ],
        )
    }

    /// Sends a whole buffer in one frame: `ReceiveByteArrayFromJS(id, base64)`.
    ///
    /// Use [`IpcSender::send_data_stream`] for large buffers; this method
    /// only warns when `max_byte_array_len` is exceeded.
    pub fn send_byte_array(&self, id: u64, data: &[u8]) -> Result<(), BridgeError> {
        if let Some(limit) = self.config.max_byte_array_len {
            if data.len() > limit {
                warn!(
                    id,
                    len = data.len(),
                    limit,
                    "byte array exceeds configured limit; consider a data stream"
                );
            }
        }
        self.send(
            MessageKind::ReceiveByteArrayFromJs,
            vec![Arg::from(id), Arg::String(base64_encode(data))],
        )
    }

    /// Reports a navigation: `OnLocationChanged(uri, intercepted)`.
    pub fn send_location_changed(&self, uri: &str, intercepted: bool) -> Result<(), BridgeError> {
        self.send(
            MessageKind::OnLocationChanged,
            vec![Arg::from(uri), Arg::from(intercepted)],
        )
    }

    // ── Data streams ──────────────────────────────────────────────────────────

    /// Streams `data` in chunks on the current task and waits for the last
    /// chunk to be accepted.
    pub async fn stream_data(
        &self,
        data: &[u8],
        stream_id: &StreamId,
        chunk_size: usize,
    ) -> Result<StreamReport, BridgeError> {
        let options = StreamOptions::from_config(&self.config);
        send_stream(data, stream_id, chunk_size, self, &options).await
    }

    /// Streams whatever `reader` yields until EOF.
    pub async fn stream_from_reader<R>(
        &self,
        reader: &mut R,
        stream_id: &StreamId,
        chunk_size: usize,
    ) -> Result<StreamReport, BridgeError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let options = StreamOptions::from_config(&self.config);
        send_stream_from_reader(reader, stream_id, chunk_size, self, &options).await
    }

    /// Starts streaming `data` on a background task and returns immediately.
    ///
    /// Must be called from within a Tokio runtime.  Await
    /// [`StreamHandle::finished`] to learn the outcome, or call
    /// [`StreamHandle::cancel`] to stop before the next chunk.
    pub fn send_data_stream(
        &self,
        data: Vec<u8>,
        stream_id: StreamId,
        chunk_size: usize,
    ) -> StreamHandle
    where
        T: 'static,
    {
        let options = StreamOptions::from_config(&self.config);
        let cancel = options.cancel.clone();
        let sender = self.clone();
        let task_id = stream_id.clone();

        let task = tokio::spawn(async move {
            send_stream(&data, &task_id, chunk_size, &sender, &options).await
        });

        StreamHandle {
            stream_id,
            cancel,
            task,
        }
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn send(&self, kind: MessageKind, args: Vec<Arg>) -> Result<(), BridgeError> {
        let frame = serialize_message(kind, &args)?;
        if let Err(e) = self.transport.deliver(&frame) {
            warn!(kind = %kind, error = %e, "transport refused frame");
            return Err(e.into());
        }
        debug!(kind = %kind, len = frame.len(), "message sent");
        Ok(())
    }
}

/// Each chunk becomes a `ReceiveJSDataChunk(streamId, base64, isLast)` frame.
impl<T: Transport + ?Sized> ChunkSink for IpcSender<T> {
    fn send_chunk(&self, chunk: &StreamChunk) -> Result<(), BridgeError> {
        self.send(
            MessageKind::ReceiveJsDataChunk,
            vec![
                Arg::from(chunk.stream_id.as_str()),
                Arg::from(chunk.data_base64.as_str()),
                Arg::from(chunk.is_last),
            ],
        )
    }
}

// ── Background stream handle ──────────────────────────────────────────────────

/// A data stream running on its own task.
///
/// Dropping the handle does not stop the transfer; call
/// [`StreamHandle::cancel`] for that.
#[derive(Debug)]
pub struct StreamHandle {
    stream_id: StreamId,
    cancel: CancelFlag,
    task: JoinHandle<Result<StreamReport, BridgeError>>,
}

impl StreamHandle {
    pub fn stream_id(&self) -> &StreamId {
        &self.stream_id
    }

    /// Asks the transfer to stop before its next chunk.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Waits for the transfer to finish and returns its outcome.
    ///
    /// # Errors
    ///
    /// The transfer's own error, or [`BridgeError::TaskJoin`] if the task
    /// panicked.
    pub async fn finished(self) -> Result<StreamReport, BridgeError> {
        self.task.await?
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
