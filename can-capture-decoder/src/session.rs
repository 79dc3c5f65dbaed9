//! Capture session
//!
//! Drives a [`ByteSource`] one 11-byte window at a time and yields frames as
//! they arrive. The session is an iterator, so long captures can be consumed
//! incrementally; [`CaptureSession::run`] is the in-memory convenience wrapper.
//!
//! Read policy:
//! - empty read (timeout): not an error, wait `retry_delay` and read again
//! - read of any other length than 11: malformed chunk, reported and skipped;
//!   the next read starts a fresh window (no byte-level realignment)
//! - end of stream, cancellation or `max_frames` ends the session
//! - any other I/O error is reported once and ends the session

use crate::config::CaptureConfig;
use crate::frame::FrameDecoder;
use crate::source::ByteSource;
use crate::types::{CapturedFrame, DecoderError, Result, WIRE_FRAME_LEN};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag shared between a session and its owner
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the session to stop after the current read
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Running counters for a capture session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    /// Valid frames handed out
    pub frames: usize,
    /// Chunks rejected for having the wrong length
    pub malformed: usize,
    /// Reads that returned nothing
    pub timeouts: usize,
    /// Valid frames skipped by the identifier filter
    pub filtered: usize,
}

/// Result of running a session to completion
#[derive(Debug, Clone)]
pub struct CaptureSummary {
    pub frames: Vec<CapturedFrame>,
    pub stats: CaptureStats,
    /// Set when the session ended on a source failure rather than cleanly
    pub source_error: Option<String>,
}

/// Stream-level capture loop over a byte source
pub struct CaptureSession<S: ByteSource> {
    source: S,
    config: CaptureConfig,
    cancel: CancelToken,
    stats: CaptureStats,
    finished: bool,
}

impl<S: ByteSource> CaptureSession<S> {
    pub fn new(source: S, config: CaptureConfig) -> Self {
        Self {
            source,
            config,
            cancel: CancelToken::new(),
            stats: CaptureStats::default(),
            finished: false,
        }
    }

    /// Use an externally owned cancellation token
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that stops this session when cancelled
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn stats(&self) -> CaptureStats {
        self.stats
    }

    /// Run until the session ends and collect every frame.
    ///
    /// Malformed chunks are counted, not returned. A source failure ends the
    /// run but keeps everything captured before it.
    pub fn run(mut self) -> CaptureSummary {
        log::info!("Starting capture session");
        let mut frames = Vec::new();
        let mut source_error = None;

        while let Some(item) = self.next() {
            match item {
                Ok(frame) => frames.push(frame),
                Err(DecoderError::Frame(_)) => {}
                Err(e) => source_error = Some(e.to_string()),
            }
        }

        log::info!(
            "Capture finished: {} frames, {} malformed, {} timeouts",
            self.stats.frames,
            self.stats.malformed,
            self.stats.timeouts
        );

        CaptureSummary {
            frames,
            stats: self.stats,
            source_error,
        }
    }

    fn limit_reached(&self) -> bool {
        match self.config.max_frames {
            Some(max) => self.stats.frames >= max,
            None => false,
        }
    }

    fn finish(&mut self, reason: &str) {
        log::debug!("Capture session ending: {}", reason);
        self.finished = true;
    }
}

impl<S: ByteSource> Iterator for CaptureSession<S> {
    type Item = Result<CapturedFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished {
                return None;
            }
            if self.cancel.is_cancelled() {
                self.finish("cancelled");
                return None;
            }
            if self.limit_reached() {
                self.finish("frame limit reached");
                return None;
            }

            let chunk = match self
                .source
                .read_chunk(WIRE_FRAME_LEN, self.config.read_timeout())
            {
                Ok(Some(chunk)) => chunk,
                Ok(None) => {
                    self.finish("end of stream");
                    return None;
                }
                Err(e) => {
                    log::error!("Byte source failed: {}", e);
                    self.finish("source error");
                    return Some(Err(e.into()));
                }
            };

            if chunk.is_empty() {
                self.stats.timeouts += 1;
                log::trace!("Read timed out, retrying");
                std::thread::sleep(self.config.retry_delay());
                continue;
            }

            match FrameDecoder::decode(&chunk) {
                Ok(frame) => {
                    if !self.config.should_keep(frame.id) {
                        self.stats.filtered += 1;
                        continue;
                    }
                    self.stats.frames += 1;
                    log::debug!("{}", frame);
                    return Some(Ok(CapturedFrame::now(frame)));
                }
                Err(e) => {
                    self.stats.malformed += 1;
                    log::warn!("{}", e);
                    return Some(Err(e.into()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ReaderSource, ScriptedSource};
    use crate::types::{Frame, FrameError};
    use std::io::{ErrorKind, Read};
    use std::sync::mpsc;
    use std::thread;
    use std::time::{Duration, Instant};

    fn wire(id: u16) -> Vec<u8> {
        Frame {
            id,
            rtr: false,
            length: 8,
            data: [0; 8],
        }
        .to_bytes()
        .to_vec()
    }

    fn fast_config() -> CaptureConfig {
        CaptureConfig::new().with_retry_delay(Duration::ZERO)
    }

    #[test]
    fn test_malformed_chunk_is_reported_and_skipped() {
        let source = ScriptedSource::new(vec![wire(0x316), vec![1, 2, 3, 4, 5], wire(0x329)]);
        let mut session = CaptureSession::new(source, fast_config());

        assert_eq!(session.next().unwrap().unwrap().frame.id, 0x316);
        match session.next().unwrap() {
            Err(DecoderError::Frame(FrameError::WrongLength { actual, .. })) => {
                assert_eq!(actual, 5)
            }
            other => panic!("expected malformed chunk, got {:?}", other),
        }
        assert_eq!(session.next().unwrap().unwrap().frame.id, 0x329);
        assert!(session.next().is_none());

        let stats = session.stats();
        assert_eq!(stats.frames, 2);
        assert_eq!(stats.malformed, 1);
    }

    #[test]
    fn test_timeouts_are_retried() {
        let mut source = ScriptedSource::new(Vec::new());
        source.push_timeout();
        source.push_timeout();
        source.push_chunk(wire(0x153));

        let summary = CaptureSession::new(source, fast_config()).run();
        assert_eq!(summary.frames.len(), 1);
        assert_eq!(summary.stats.timeouts, 2);
        assert!(summary.source_error.is_none());
    }

    #[test]
    fn test_cancelled_session_stops_before_reading() {
        let source = ScriptedSource::new(vec![wire(0x316), wire(0x316)]);
        let session = CaptureSession::new(source, fast_config());
        session.cancel_token().cancel();

        let summary = session.run();
        assert!(summary.frames.is_empty());
    }

    #[test]
    fn test_cancel_mid_stream_keeps_frames() {
        let source = ScriptedSource::new(vec![wire(0x316), wire(0x329), wire(0x545)]);
        let token = CancelToken::new();
        let mut session =
            CaptureSession::new(source, fast_config()).with_cancel_token(token.clone());

        assert!(session.next().unwrap().is_ok());
        token.cancel();
        assert!(session.next().is_none());
        assert_eq!(session.stats().frames, 1);
    }

    #[test]
    fn test_max_frames() {
        let source = ScriptedSource::new(vec![wire(1), wire(2), wire(3)]);
        let summary = CaptureSession::new(source, fast_config().with_max_frames(2)).run();
        assert_eq!(summary.frames.len(), 2);
    }

    #[test]
    fn test_id_filter_skips_silently() {
        let source = ScriptedSource::new(vec![wire(0x316), wire(0x7FF), wire(0x316)]);
        let summary =
            CaptureSession::new(source, fast_config().with_id_filter(vec![0x316])).run();
        assert_eq!(summary.frames.len(), 2);
        assert_eq!(summary.stats.filtered, 1);
        assert_eq!(summary.stats.malformed, 0);
    }

    #[test]
    fn test_source_error_ends_session_and_keeps_frames() {
        let mut source = ScriptedSource::new(vec![wire(0x316)]);
        source.push_error(ErrorKind::BrokenPipe);
        source.push_chunk(wire(0x329));

        let summary = CaptureSession::new(source, fast_config()).run();
        assert_eq!(summary.frames.len(), 1);
        assert!(summary.source_error.is_some());
    }

    /// Blocks inside `read` until the paired sender is dropped
    struct SilentLine(mpsc::Receiver<()>);

    impl Read for SilentLine {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            let _ = self.0.recv();
            Ok(0)
        }
    }

    #[test]
    fn test_cancel_stops_session_on_silent_reader() {
        let (_release, rx) = mpsc::channel::<()>();
        let source = ReaderSource::new(SilentLine(rx)).unwrap();
        let config = CaptureConfig::new().with_read_timeout(Duration::from_millis(20));
        let session = CaptureSession::new(source, config);
        let token = session.cancel_token();

        let started = Instant::now();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            token.cancel();
        });
        let summary = session.run();
        canceller.join().unwrap();

        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(summary.frames.is_empty());
        assert!(summary.stats.timeouts > 0);
        assert!(summary.source_error.is_none());
    }
}
