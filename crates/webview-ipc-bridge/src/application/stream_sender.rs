//! Chunked data streams.
//!
//! A payload too large for one frame is split into fixed-size slices, each
//! base64-encoded and sent as its own `ReceiveJSDataChunk` frame.  The receiver
//! reassembles them by stream id, in the order they arrive.
//!
//! # Ordering and failure
//!
//! Chunks are sent strictly in order and exactly one of them carries
//! `is_last = true`.  The first failure stops the transfer: later chunks are
//! never attempted and no terminal chunk is sent, so the receiver sees a
//! truncated stream rather than a corrupted one.  The error reports how many
//! chunks were delivered before the failure.
//!
//! # Cooperative yielding
//!
//! Between chunks the sender calls [`tokio::task::yield_now`] so that one
//! large transfer cannot starve other tasks on a single-threaded runtime.
//! Chunks of concurrent transfers may therefore interleave on the transport;
//! each transfer's own chunks remain in order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{info, trace, warn};
use webview_ipc_core::base64_encode;

use crate::application::error::BridgeError;
use crate::domain::{BridgeConfig, StreamChunk, StreamId};

// ── Sink port ─────────────────────────────────────────────────────────────────

/// Receives the chunks of a data stream, one at a time and in order.
///
/// [`crate::application::IpcSender`] implements this by wrapping each chunk in
/// a `ReceiveJSDataChunk` frame.  Tests implement it with a recording double.
pub trait ChunkSink: Send + Sync {
    /// Sends one chunk.
    ///
    /// # Errors
    ///
    /// Any error stops the transfer.
    fn send_chunk(&self, chunk: &StreamChunk) -> Result<(), BridgeError>;
}

impl<S: ChunkSink + ?Sized> ChunkSink for Arc<S> {
    fn send_chunk(&self, chunk: &StreamChunk) -> Result<(), BridgeError> {
        (**self).send_chunk(chunk)
    }
}

// ── Options and results ───────────────────────────────────────────────────────

/// A shared flag that asks an in-flight transfer to stop.
///
/// Cancellation is checked before each chunk.  A chunk already handed to the
/// sink is never recalled.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Per-transfer knobs.
#[derive(Debug, Clone)]
pub struct StreamOptions {
    /// Yield to the scheduler after this many chunks.  `0` never yields.
    pub yield_every_chunks: usize,
    pub cancel: CancelFlag,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            yield_every_chunks: 1,
            cancel: CancelFlag::default(),
        }
    }
}

impl StreamOptions {
    /// Options taking their yield interval from `config`, with a fresh
    /// cancel flag.
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self {
            yield_every_chunks: config.yield_every_chunks,
            cancel: CancelFlag::new(),
        }
    }
}

/// Summary of a completed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamReport {
    pub stream_id: StreamId,
    /// Chunks delivered, including the terminal one.
    pub chunks_sent: u64,
    /// Payload bytes delivered, before base64 expansion.
    pub bytes_sent: u64,
}

// ── Public entry points ───────────────────────────────────────────────────────

/// Sends `payload` to `sink` as a sequence of chunks of at most `chunk_size`
/// bytes.
///
/// | Payload length        | Chunks sent                            |
/// |-----------------------|----------------------------------------|
/// | 0                     | 1 (empty, terminal)                    |
/// | L > 0                 | ceil(L / chunk_size), last is terminal |
///
/// # Errors
///
/// - [`BridgeError::InvalidChunkSize`] if `chunk_size` is zero; nothing is sent.
/// - [`BridgeError::Cancelled`] if `options.cancel` is set before the
///   terminal chunk.
/// - [`BridgeError::PartialStream`] if the sink fails, wrapping the sink's
///   error.
pub async fn send_stream<S>(
    payload: &[u8],
    stream_id: &StreamId,
    chunk_size: usize,
    sink: &S,
    options: &StreamOptions,
) -> Result<StreamReport, BridgeError>
where
    S: ChunkSink + ?Sized,
{
    if chunk_size == 0 {
        return Err(BridgeError::InvalidChunkSize);
    }

    info!(
        stream_id = %stream_id,
        payload_len = payload.len(),
        chunk_size,
        "starting data stream"
    );

    let mut emitter = ChunkEmitter::new(sink, stream_id, options);
    if payload.is_empty() {
        emitter.emit(&[], true).await?;
    } else {
        let total = payload.len().div_ceil(chunk_size);
        for (index, slice) in payload.chunks(chunk_size).enumerate() {
            emitter.emit(slice, index + 1 == total).await?;
        }
    }

    Ok(emitter.finish())
}

/// Like [`send_stream`], but pulls the payload from an async reader instead
/// of a buffer, so the whole payload never has to be in memory.
///
/// The reader is read one chunk ahead so the terminal chunk can be flagged
/// without a trailing empty frame.  A source that is empty from the start
/// produces a single empty terminal chunk.
///
/// # Errors
///
/// As for [`send_stream`].  A read failure is reported as
/// [`BridgeError::PartialStream`] wrapping [`BridgeError::SourceRead`].
pub async fn send_stream_from_reader<R, S>(
    reader: &mut R,
    stream_id: &StreamId,
    chunk_size: usize,
    sink: &S,
    options: &StreamOptions,
) -> Result<StreamReport, BridgeError>
where
    R: AsyncRead + Unpin + ?Sized,
    S: ChunkSink + ?Sized,
{
    if chunk_size == 0 {
        return Err(BridgeError::InvalidChunkSize);
    }

    info!(stream_id = %stream_id, chunk_size, "starting data stream from reader");

    let mut emitter = ChunkEmitter::new(sink, stream_id, options);
    let mut current = read_chunk(reader, chunk_size)
        .await
        .map_err(|e| emitter.abandon(BridgeError::SourceRead(e)))?;

    loop {
        // A short read means the source hit EOF inside this chunk.
        if current.len() < chunk_size {
            emitter.emit(&current, true).await?;
            break;
        }

        let next = read_chunk(reader, chunk_size)
            .await
            .map_err(|e| emitter.abandon(BridgeError::SourceRead(e)))?;

        if next.is_empty() {
            emitter.emit(&current, true).await?;
            break;
        }

        emitter.emit(&current, false).await?;
        current = next;
    }

    Ok(emitter.finish())
}

// ── Internals ─────────────────────────────────────────────────────────────────

/// Upper bound on the buffer reserved before a chunk is read.  `read_to_end`
/// grows past it as data actually arrives.
const MAX_READ_PREALLOC: usize = 64 * 1024;

/// Reads up to `limit` bytes, stopping early only at EOF.
async fn read_chunk<R>(reader: &mut R, limit: usize) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = Vec::with_capacity(limit.min(MAX_READ_PREALLOC));
    (&mut *reader).take(limit as u64).read_to_end(&mut buf).await?;
    Ok(buf)
}

/// Tracks one transfer's progress and turns failures into stream errors.
struct ChunkEmitter<'a, S: ?Sized> {
    sink: &'a S,
    stream_id: &'a StreamId,
    options: &'a StreamOptions,
    chunks_sent: u64,
    bytes_sent: u64,
}

impl<'a, S: ChunkSink + ?Sized> ChunkEmitter<'a, S> {
    fn new(sink: &'a S, stream_id: &'a StreamId, options: &'a StreamOptions) -> Self {
        Self {
            sink,
            stream_id,
            options,
            chunks_sent: 0,
            bytes_sent: 0,
        }
    }

    async fn emit(&mut self, data: &[u8], is_last: bool) -> Result<(), BridgeError> {
        if self.options.cancel.is_cancelled() {
            warn!(
                stream_id = %self.stream_id,
                chunks_delivered = self.chunks_sent,
                "data stream cancelled"
            );
            return Err(BridgeError::Cancelled {
                stream_id: self.stream_id.clone(),
                chunks_delivered: self.chunks_sent,
            });
        }

        let chunk = StreamChunk {
            stream_id: self.stream_id.clone(),
            sequence: self.chunks_sent,
            data_base64: base64_encode(data),
            is_last,
        };

        if let Err(e) = self.sink.send_chunk(&chunk) {
            return Err(self.abandon(e));
        }

        self.chunks_sent += 1;
        self.bytes_sent += data.len() as u64;
        trace!(
            stream_id = %self.stream_id,
            sequence = chunk.sequence,
            len = data.len(),
            is_last,
            "chunk sent"
        );

        let every = self.options.yield_every_chunks as u64;
        if !is_last && every > 0 && self.chunks_sent % every == 0 {
            tokio::task::yield_now().await;
        }
        Ok(())
    }

    fn abandon(&self, source: BridgeError) -> BridgeError {
        warn!(
            stream_id = %self.stream_id,
            chunks_delivered = self.chunks_sent,
            error = %source,
            "data stream abandoned"
        );
        BridgeError::PartialStream {
            stream_id: self.stream_id.clone(),
            chunks_delivered: self.chunks_sent,
            source: Box::new(source),
        }
    }

    fn finish(self) -> StreamReport {
        info!(
            stream_id = %self.stream_id,
            chunks = self.chunks_sent,
            bytes = self.bytes_sent,
            "data stream complete"
        );
        StreamReport {
            stream_id: self.stream_id.clone(),
            chunks_sent: self.chunks_sent,
            bytes_sent: self.bytes_sent,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    use webview_ipc_core::base64_decode;

    use super::*;
    use crate::application::transport::TransportError;

    /// Records every chunk; optionally fails on the n-th attempt (1-based).
    #[derive(Default)]
    struct RecordingSink {
        chunks: Mutex<Vec<StreamChunk>>,
        fail_on_attempt: Option<usize>,
    }

    impl RecordingSink {
        fn failing_on(attempt: usize) -> Self {
            Self {
                fail_on_attempt: Some(attempt),
                ..Default::default()
            }
        }

        fn chunks(&self) -> Vec<StreamChunk> {
            self.chunks.lock().unwrap().clone()
        }
    }

    impl ChunkSink for RecordingSink {
        fn send_chunk(&self, chunk: &StreamChunk) -> Result<(), BridgeError> {
            let mut chunks = self.chunks.lock().unwrap();
            chunks.push(chunk.clone());
            if self.fail_on_attempt == Some(chunks.len()) {
                return Err(TransportError::Closed.into());
            }
            Ok(())
        }
    }

    fn decoded(chunks: &[StreamChunk]) -> Vec<Vec<u8>> {
        chunks
            .iter()
            .map(|c| base64_decode(&c.data_base64).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_five_bytes_in_chunks_of_two() {
        // Arrange
        let sink = RecordingSink::default();
        let id = StreamId::from("s1");

        // Act
        let report = send_stream(b"ABCDE", &id, 2, &sink, &StreamOptions::default())
            .await
            .unwrap();

        // Assert
        let chunks = sink.chunks();
        assert_eq!(decoded(&chunks), vec![b"AB".to_vec(), b"CD".to_vec(), b"E".to_vec()]);
        assert_eq!(
            chunks.iter().map(|c| c.is_last).collect::<Vec<_>>(),
            vec![false, false, true]
        );
        assert_eq!(report.chunks_sent, 3);
        assert_eq!(report.bytes_sent, 5);
    }

    #[tokio::test]
    async fn test_empty_payload_sends_one_empty_terminal_chunk() {
        let sink = RecordingSink::default();

        send_stream(&[], &StreamId::from("e"), 16, &sink, &StreamOptions::default())
            .await
            .unwrap();

        let chunks = sink.chunks();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].data_base64, "");
        assert!(chunks[0].is_last);
    }

    #[tokio::test]
    async fn test_exact_multiple_has_no_trailing_empty_chunk() {
        let sink = RecordingSink::default();

        send_stream(&[1, 2, 3, 4], &StreamId::from("m"), 2, &sink, &StreamOptions::default())
            .await
            .unwrap();

        let chunks = sink.chunks();
        assert_eq!(chunks.len(), 2);
        assert!(chunks[1].is_last);
        assert_eq!(decoded(&chunks)[1], vec![3, 4]);
    }

    #[tokio::test]
    async fn test_zero_chunk_size_is_rejected_before_sending() {
        let sink = RecordingSink::default();

        let result =
            send_stream(b"abc", &StreamId::from("z"), 0, &sink, &StreamOptions::default()).await;

        assert!(matches!(result, Err(BridgeError::InvalidChunkSize)));
        assert!(sink.chunks().is_empty());
    }

    #[tokio::test]
    async fn test_sequence_numbers_count_from_zero() {
        let sink = RecordingSink::default();

        send_stream(&[0u8; 7], &StreamId::from("q"), 3, &sink, &StreamOptions::default())
            .await
            .unwrap();

        let seqs: Vec<u64> = sink.chunks().iter().map(|c| c.sequence).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_sink_failure_stops_stream_and_reports_delivered_count() {
        // Arrange: fail on the 2nd of 5 chunks.
        let sink = RecordingSink::failing_on(2);

        // Act
        let result = send_stream(
            &[0u8; 10],
            &StreamId::from("f"),
            2,
            &sink,
            &StreamOptions::default(),
        )
        .await;

        // Assert
        assert_eq!(sink.chunks().len(), 2, "chunks 3..5 must not be attempted");
        match result {
            Err(BridgeError::PartialStream {
                chunks_delivered,
                source,
                ..
            }) => {
                assert_eq!(chunks_delivered, 1);
                assert!(matches!(*source, BridgeError::Transport(TransportError::Closed)));
            }
            other => panic!("expected PartialStream, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failure_on_first_chunk_is_still_partial() {
        let sink = RecordingSink::failing_on(1);

        let err = send_stream(b"xy", &StreamId::from("f1"), 1, &sink, &StreamOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.chunks_delivered(), Some(0));
        assert!(matches!(err, BridgeError::PartialStream { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_before_start_sends_nothing() {
        let sink = RecordingSink::default();
        let options = StreamOptions::default();
        options.cancel.cancel();

        let err = send_stream(b"abc", &StreamId::from("c"), 1, &sink, &options)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BridgeError::Cancelled {
                chunks_delivered: 0,
                ..
            }
        ));
        assert!(sink.chunks().is_empty());
    }

    #[tokio::test]
    async fn test_zero_yield_interval_still_sends_everything() {
        let sink = RecordingSink::default();
        let options = StreamOptions {
            yield_every_chunks: 0,
            ..Default::default()
        };

        let report = send_stream(&[9u8; 100], &StreamId::from("y"), 7, &sink, &options)
            .await
            .unwrap();

        assert_eq!(report.chunks_sent, 15);
    }

    #[tokio::test]
    async fn test_reader_source_matches_buffer_source() {
        // Arrange
        let payload: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let from_buffer = RecordingSink::default();
        let from_reader = RecordingSink::default();
        let id = StreamId::from("r");

        // Act
        send_stream(&payload, &id, 64, &from_buffer, &StreamOptions::default())
            .await
            .unwrap();
        let mut reader: &[u8] = &payload;
        send_stream_from_reader(&mut reader, &id, 64, &from_reader, &StreamOptions::default())
            .await
            .unwrap();

        // Assert
        assert_eq!(from_buffer.chunks(), from_reader.chunks());
    }

    #[tokio::test]
    async fn test_empty_reader_sends_one_empty_terminal_chunk() {
        let sink = RecordingSink::default();
        let mut reader: &[u8] = &[];

        send_stream_from_reader(&mut reader, &StreamId::from("er"), 4, &sink, &StreamOptions::default())
            .await
            .unwrap();

        let chunks = sink.chunks();
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].is_last);
    }

    #[tokio::test]
    async fn test_reader_exact_multiple_flags_last_full_chunk() {
        let sink = RecordingSink::default();
        let data = [1u8, 2, 3, 4, 5, 6];
        let mut reader: &[u8] = &data;

        send_stream_from_reader(&mut reader, &StreamId::from("rx"), 3, &sink, &StreamOptions::default())
            .await
            .unwrap();

        let chunks = sink.chunks();
        assert_eq!(chunks.len(), 2);
        assert!(!chunks[0].is_last);
        assert!(chunks[1].is_last);
    }

    #[tokio::test]
    async fn test_huge_chunk_size_with_short_reader_sends_one_chunk() {
        // Arrange
        let sink = RecordingSink::default();
        let mut reader: &[u8] = b"ABC";

        // Act
        let report = send_stream_from_reader(
            &mut reader,
            &StreamId::from("h"),
            usize::MAX,
            &sink,
            &StreamOptions::default(),
        )
        .await
        .unwrap();

        // Assert
        assert_eq!(report.chunks_sent, 1);
        assert_eq!(decoded(&sink.chunks()), vec![b"ABC".to_vec()]);
        assert!(sink.chunks()[0].is_last);
    }

    // ── Mid-stream cancellation ───────────────────────────────────────────────

    /// Records chunks and raises the cancel flag once it has seen `after` of them.
    struct CancellingSink {
        inner: RecordingSink,
        cancel: CancelFlag,
        after: usize,
    }

    impl ChunkSink for CancellingSink {
        fn send_chunk(&self, chunk: &StreamChunk) -> Result<(), BridgeError> {
            self.inner.send_chunk(chunk)?;
            if self.inner.chunks().len() == self.after {
                self.cancel.cancel();
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_cancel_mid_stream_keeps_delivered_chunks_and_sends_no_terminal() {
        // Arrange: 5 chunks, cancelled while the 2nd is being delivered.
        let options = StreamOptions::default();
        let sink = CancellingSink {
            inner: RecordingSink::default(),
            cancel: options.cancel.clone(),
            after: 2,
        };

        // Act
        let err = send_stream(&[1u8; 10], &StreamId::from("mc"), 2, &sink, &options)
            .await
            .unwrap_err();

        // Assert
        let chunks = sink.inner.chunks();
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| !c.is_last));
        assert!(matches!(
            err,
            BridgeError::Cancelled {
                chunks_delivered: 2,
                ..
            }
        ));
    }

    // ── Reader failure ────────────────────────────────────────────────────────

    /// Yields `data`, then fails every later read.
    struct FailingReader {
        data: Vec<u8>,
        pos: usize,
    }

    impl AsyncRead for FailingReader {
        fn poll_read(
            mut self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            buf: &mut tokio::io::ReadBuf<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            if self.pos < self.data.len() {
                let start = self.pos;
                let n = buf.remaining().min(self.data.len() - start);
                buf.put_slice(&self.data[start..start + n]);
                self.pos += n;
                std::task::Poll::Ready(Ok(()))
            } else {
                std::task::Poll::Ready(Err(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "source gone",
                )))
            }
        }
    }

    #[tokio::test]
    async fn test_reader_failure_abandons_stream_without_terminal_chunk() {
        // Arrange: two full chunks of data, then an error.  The read-ahead means
        // the first chunk goes out while the second is buffered, and the error
        // surfaces while reading ahead of the second.
        let sink = RecordingSink::default();
        let mut reader = FailingReader {
            data: vec![7u8; 8],
            pos: 0,
        };

        // Act
        let err = send_stream_from_reader(
            &mut reader,
            &StreamId::from("rf"),
            4,
            &sink,
            &StreamOptions::default(),
        )
        .await
        .unwrap_err();

        // Assert
        let chunks = sink.chunks();
        assert_eq!(chunks.len(), 1);
        assert!(!chunks[0].is_last);
        match err {
            BridgeError::PartialStream {
                chunks_delivered,
                source,
                ..
            } => {
                assert_eq!(chunks_delivered, 1);
                assert!(matches!(*source, BridgeError::SourceRead(_)));
            }
            other => panic!("expected PartialStream, got {other:?}"),
        }
    }

    // ── Cooperative yielding ──────────────────────────────────────────────────

    /// Records, for each chunk, how many times a background ticker has run.
    struct TickSink {
        ticks: Arc<AtomicUsize>,
        seen: Mutex<Vec<usize>>,
    }

    impl ChunkSink for TickSink {
        fn send_chunk(&self, _chunk: &StreamChunk) -> Result<(), BridgeError> {
            self.seen
                .lock()
                .unwrap()
                .push(self.ticks.load(Ordering::SeqCst));
            Ok(())
        }
    }

    /// Spawns a task that bumps `ticks` once per scheduling turn until `stop`.
    fn spawn_ticker(ticks: Arc<AtomicUsize>, stop: Arc<AtomicBool>) {
        tokio::spawn(async move {
            while !stop.load(Ordering::SeqCst) {
                ticks.fetch_add(1, Ordering::SeqCst);
                tokio::task::yield_now().await;
            }
        });
    }

    async fn ticks_seen_per_chunk(yield_every_chunks: usize) -> Vec<usize> {
        let ticks = Arc::new(AtomicUsize::new(0));
        let stop = Arc::new(AtomicBool::new(false));
        spawn_ticker(Arc::clone(&ticks), Arc::clone(&stop));
        let sink = TickSink {
            ticks,
            seen: Mutex::new(Vec::new()),
        };
        let options = StreamOptions {
            yield_every_chunks,
            ..Default::default()
        };

        send_stream(&[0u8; 10], &StreamId::from("t"), 1, &sink, &options)
            .await
            .unwrap();

        stop.store(true, Ordering::SeqCst);
        let seen = sink.seen.lock().unwrap().clone();
        seen
    }

    #[tokio::test]
    async fn test_other_tasks_run_between_chunks() {
        // The test runtime is single-threaded: the ticker only advances when
        // the stream sender yields.
        let seen = ticks_seen_per_chunk(1).await;

        assert_eq!(seen.len(), 10);
        assert!(
            seen.windows(2).all(|w| w[1] > w[0]),
            "ticker should advance between every pair of chunks: {seen:?}"
        );
    }

    #[tokio::test]
    async fn test_zero_yield_interval_never_lets_other_tasks_run() {
        let seen = ticks_seen_per_chunk(0).await;

        assert_eq!(seen, vec![0; 10]);
    }
}
