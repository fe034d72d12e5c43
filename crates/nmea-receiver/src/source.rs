//! Byte Sources
//!
//! A byte source stands in for the UART/DMA peripheral: each call to
//! [`ByteSource::drain`] hands over whatever arrived since the previous call.

use crate::error::SourceError;
use std::collections::VecDeque;
use std::io::{ErrorKind, Read};
use tracing::debug;

/// Producer-side collaborator that deposits received bytes
pub trait ByteSource {
    /// Copy newly available bytes into `buf` and return how many were written.
    ///
    /// Must not block beyond the source's own read timeout; 0 means nothing
    /// arrived.
    fn drain(&mut self, buf: &mut [u8]) -> Result<usize, SourceError>;

    /// Whether the source will never produce more bytes
    fn is_exhausted(&self) -> bool {
        false
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn drain(&mut self, buf: &mut [u8]) -> Result<usize, SourceError> {
        (**self).drain(buf)
    }

    fn is_exhausted(&self) -> bool {
        (**self).is_exhausted()
    }
}

/// In-memory source replaying a queue of transfers.
///
/// Each queued chunk models one hardware transfer; a chunk larger than the
/// drain buffer is handed over across several drains.
#[derive(Debug, Default)]
pub struct SliceSource {
    chunks: VecDeque<Vec<u8>>,
}

impl SliceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one transfer
    pub fn push_chunk(&mut self, chunk: impl Into<Vec<u8>>) {
        let chunk = chunk.into();
        if !chunk.is_empty() {
            self.chunks.push_back(chunk);
        }
    }

    /// Queue `bytes` split into transfers of at most `chunk_len` bytes
    pub fn from_stream(bytes: &[u8], chunk_len: usize) -> Self {
        let mut source = Self::new();
        for chunk in bytes.chunks(chunk_len.max(1)) {
            source.push_chunk(chunk);
        }
        source
    }

    /// Transfers not yet drained
    pub fn pending_chunks(&self) -> usize {
        self.chunks.len()
    }
}

impl ByteSource for SliceSource {
    fn drain(&mut self, buf: &mut [u8]) -> Result<usize, SourceError> {
        let Some(chunk) = self.chunks.front_mut() else {
            return Ok(0);
        };

        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n == chunk.len() {
            self.chunks.pop_front();
        } else {
            chunk.drain(..n);
        }
        Ok(n)
    }

    fn is_exhausted(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Source over any blocking reader: a capture file or an opened serial port.
///
/// Read timeouts are reported as "nothing arrived"; end of file marks the
/// source exhausted.
pub struct ReaderSource<R> {
    reader: R,
    exhausted: bool,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            exhausted: false,
        }
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn drain(&mut self, buf: &mut [u8]) -> Result<usize, SourceError> {
        if self.exhausted {
            return Ok(0);
        }

        match self.reader.read(buf) {
            Ok(0) if !buf.is_empty() => {
                debug!("Reader source reached end of input");
                self.exhausted = true;
                Ok(0)
            }
            Ok(n) => Ok(n),
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted) => {
                Ok(0)
            }
            Err(e) if e.kind() == ErrorKind::BrokenPipe => Err(SourceError::Disconnected),
            Err(e) => Err(SourceError::Io(e)),
        }
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_slice_source_splits_large_chunk() {
        let mut source = SliceSource::new();
        source.push_chunk(&b"abcdef"[..]);
        source.push_chunk(&b"gh"[..]);

        let mut buf = [0u8; 4];
        assert_eq!(source.drain(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"abcd");
        assert_eq!(source.drain(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"ef");
        assert_eq!(source.drain(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"gh");
        assert_eq!(source.drain(&mut buf).unwrap(), 0);
        assert!(source.is_exhausted());
    }

    #[test]
    fn test_from_stream_chunking() {
        let source = SliceSource::from_stream(b"0123456789", 3);
        assert_eq!(source.pending_chunks(), 4);
    }

    #[test]
    fn test_reader_source_marks_eof() {
        let mut source = ReaderSource::new(Cursor::new(b"$GP\n".to_vec()));
        let mut buf = [0u8; 16];
        assert_eq!(source.drain(&mut buf).unwrap(), 4);
        assert!(!source.is_exhausted());
        assert_eq!(source.drain(&mut buf).unwrap(), 0);
        assert!(source.is_exhausted());
    }

    struct TimingOut;

    impl Read for TimingOut {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(ErrorKind::TimedOut, "no data"))
        }
    }

    #[test]
    fn test_reader_timeout_is_empty_drain() {
        let mut source = ReaderSource::new(TimingOut);
        let mut buf = [0u8; 8];
        assert_eq!(source.drain(&mut buf).unwrap(), 0);
        assert!(!source.is_exhausted());
    }
}
