//! Byte sources feeding a capture session
//!
//! The session only needs "give me up to N bytes, waiting at most this long".
//! Opening and configuring the transport stays with the caller.

use std::collections::VecDeque;
use std::io::{self, ErrorKind, Read};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::thread;
use std::time::{Duration, Instant};

/// A blocking byte source with bounded reads.
///
/// `read_chunk` returns:
/// - `Ok(Some(bytes))` with 1..=max_bytes bytes when data arrived
/// - `Ok(Some(empty))` when the timeout expired with no data
/// - `Ok(None)` at end of stream
pub trait ByteSource {
    fn read_chunk(&mut self, max_bytes: usize, timeout: Duration) -> io::Result<Option<Vec<u8>>>;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_chunk(&mut self, max_bytes: usize, timeout: Duration) -> io::Result<Option<Vec<u8>>> {
        (**self).read_chunk(max_bytes, timeout)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn read_chunk(&mut self, max_bytes: usize, timeout: Duration) -> io::Result<Option<Vec<u8>>> {
        (**self).read_chunk(max_bytes, timeout)
    }
}

/// Bytes the reader thread pulls per `read` call
const READ_BUF_LEN: usize = 256;

/// Chunks buffered between the reader thread and the session
const READ_AHEAD: usize = 64;

/// Pause after the underlying reader reports it has nothing yet
const IDLE_POLL: Duration = Duration::from_millis(1);

/// Adapter over any [`Read`] (file dump, tty device, stdin).
///
/// A background thread owns the reader and forwards what it reads over a
/// channel, so `read_chunk` waits at most `timeout` even when the reader
/// itself blocks indefinitely. Bytes read past `max_bytes` are kept for the
/// next call. A short read followed by a timeout or end of file is handed out
/// as a short chunk.
///
/// Dropping the source detaches the thread; it exits on its next read.
pub struct ReaderSource {
    chunks: Receiver<io::Result<Vec<u8>>>,
    pending: VecDeque<u8>,
    eof: bool,
}

impl ReaderSource {
    pub fn new<R>(reader: R) -> io::Result<Self>
    where
        R: Read + Send + 'static,
    {
        let (tx, chunks) = mpsc::sync_channel(READ_AHEAD);
        thread::Builder::new()
            .name("can-capture-reader".to_string())
            .spawn(move || pump(reader, tx))?;

        Ok(Self {
            chunks,
            pending: VecDeque::new(),
            eof: false,
        })
    }
}

/// Reader thread body: forward reads until end of file, a hard error, or
/// the receiving side going away.
fn pump<R: Read>(mut reader: R, chunks: SyncSender<io::Result<Vec<u8>>>) {
    let mut buf = [0u8; READ_BUF_LEN];
    loop {
        let (message, last) = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => (Ok(buf[..n].to_vec()), false),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                // Empty message: lets the thread notice a dropped receiver
                thread::sleep(IDLE_POLL);
                (Ok(Vec::new()), false)
            }
            Err(e) => (Err(e), true),
        };
        if chunks.send(message).is_err() || last {
            break;
        }
    }
    log::trace!("Reader thread finished");
}

impl ByteSource for ReaderSource {
    fn read_chunk(&mut self, max_bytes: usize, timeout: Duration) -> io::Result<Option<Vec<u8>>> {
        let deadline = Instant::now().checked_add(timeout);

        while self.pending.len() < max_bytes && !self.eof {
            let wait = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => timeout,
            };
            match self.chunks.recv_timeout(wait) {
                Ok(Ok(bytes)) => self.pending.extend(bytes),
                Ok(Err(e)) => {
                    self.eof = true;
                    return Err(e);
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => self.eof = true,
            }
        }

        if self.pending.is_empty() && self.eof {
            return Ok(None);
        }
        let take = max_bytes.min(self.pending.len());
        Ok(Some(self.pending.drain(..take).collect()))
    }
}

enum ScriptEntry {
    Chunk(Vec<u8>),
    Error(ErrorKind),
}

/// Replays a fixed sequence of chunks, then reports end of stream.
///
/// Each chunk is returned as-is regardless of `max_bytes`, which lets a
/// script reproduce the short and long reads a real port produces.
#[derive(Default)]
pub struct ScriptedSource {
    script: VecDeque<ScriptEntry>,
    reads: usize,
}

impl ScriptedSource {
    pub fn new(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            script: chunks.into_iter().map(ScriptEntry::Chunk).collect(),
            reads: 0,
        }
    }

    /// Append a chunk
    pub fn push_chunk(&mut self, chunk: Vec<u8>) {
        self.script.push_back(ScriptEntry::Chunk(chunk));
    }

    /// Append an empty read (timeout)
    pub fn push_timeout(&mut self) {
        self.script.push_back(ScriptEntry::Chunk(Vec::new()));
    }

    /// Append an I/O failure
    pub fn push_error(&mut self, kind: ErrorKind) {
        self.script.push_back(ScriptEntry::Error(kind));
    }

    /// Number of read attempts served so far
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl ByteSource for ScriptedSource {
    fn read_chunk(&mut self, _max_bytes: usize, _timeout: Duration) -> io::Result<Option<Vec<u8>>> {
        self.reads += 1;
        match self.script.pop_front() {
            Some(ScriptEntry::Chunk(chunk)) => Ok(Some(chunk)),
            Some(ScriptEntry::Error(kind)) => Err(io::Error::new(kind, "scripted failure")),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TIMEOUT: Duration = Duration::from_millis(1);
    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn test_reader_source_splits_into_chunks() {
        let bytes: Vec<u8> = (0..25).collect();
        let mut source = ReaderSource::new(Cursor::new(bytes)).unwrap();

        let first = source.read_chunk(11, WAIT).unwrap().unwrap();
        let second = source.read_chunk(11, WAIT).unwrap().unwrap();
        assert_eq!(first, (0..11).collect::<Vec<u8>>());
        assert_eq!(second, (11..22).collect::<Vec<u8>>());
        // trailing partial record
        assert_eq!(source.read_chunk(11, WAIT).unwrap().unwrap(), vec![22, 23, 24]);
        assert!(source.read_chunk(11, WAIT).unwrap().is_none());
        assert!(source.read_chunk(11, WAIT).unwrap().is_none());
    }

    #[test]
    fn test_reader_source_empty_input() {
        let mut source = ReaderSource::new(Cursor::new(Vec::new())).unwrap();
        assert!(source.read_chunk(11, WAIT).unwrap().is_none());
    }

    struct TimingOutReader;

    impl Read for TimingOutReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::TimedOut, "no data"))
        }
    }

    #[test]
    fn test_reader_source_timeout_is_empty_read() {
        let mut source = ReaderSource::new(TimingOutReader).unwrap();
        assert_eq!(source.read_chunk(11, TIMEOUT).unwrap(), Some(Vec::new()));
    }

    /// Blocks inside `read` until the paired sender is dropped
    struct BlockingReader(mpsc::Receiver<()>);

    impl Read for BlockingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            let _ = self.0.recv();
            Ok(0)
        }
    }

    #[test]
    fn test_blocking_reader_still_times_out() {
        let (release, rx) = mpsc::channel();
        let mut source = ReaderSource::new(BlockingReader(rx)).unwrap();

        let started = Instant::now();
        assert_eq!(
            source.read_chunk(11, Duration::from_millis(20)).unwrap(),
            Some(Vec::new())
        );
        assert!(started.elapsed() < Duration::from_secs(2));

        drop(release);
        assert!(source.read_chunk(11, WAIT).unwrap().is_none());
    }

    /// Replays reads, including `Interrupted`, then reports end of file
    struct ChoppyReader(VecDeque<io::Result<Vec<u8>>>);

    impl Read for ChoppyReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.pop_front() {
                Some(Ok(bytes)) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                Some(Err(e)) => Err(e),
                None => Ok(0),
            }
        }
    }

    #[test]
    fn test_interrupted_read_is_retried() {
        let record: Vec<u8> = (1..=11).collect();
        let reader = ChoppyReader(VecDeque::from(vec![
            Ok(record[..5].to_vec()),
            Err(io::Error::from(ErrorKind::Interrupted)),
            Ok(record[5..].to_vec()),
        ]));
        let mut source = ReaderSource::new(reader).unwrap();

        assert_eq!(source.read_chunk(11, WAIT).unwrap(), Some(record));
        assert!(source.read_chunk(11, WAIT).unwrap().is_none());
    }

    #[test]
    fn test_reader_error_is_reported() {
        let reader = ChoppyReader(VecDeque::from(vec![Err(io::Error::from(
            ErrorKind::BrokenPipe,
        ))]));
        let mut source = ReaderSource::new(reader).unwrap();

        assert_eq!(
            source.read_chunk(11, WAIT).unwrap_err().kind(),
            ErrorKind::BrokenPipe
        );
        assert!(source.read_chunk(11, WAIT).unwrap().is_none());
    }

    #[test]
    fn test_scripted_source() {
        let mut source = ScriptedSource::new(vec![vec![1, 2, 3]]);
        source.push_timeout();
        source.push_error(ErrorKind::BrokenPipe);

        assert_eq!(source.read_chunk(11, TIMEOUT).unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(source.read_chunk(11, TIMEOUT).unwrap(), Some(Vec::new()));
        assert_eq!(
            source.read_chunk(11, TIMEOUT).unwrap_err().kind(),
            ErrorKind::BrokenPipe
        );
        assert!(source.read_chunk(11, TIMEOUT).unwrap().is_none());
        assert_eq!(source.reads(), 4);
    }
}
