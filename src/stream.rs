//! Lookahead byte stream over the transport.
//!
//! The parser pulls one byte at a time and may push any number of bytes back
//! for re-reading. Raw transport reads happen in bulk; unconsumed bytes are
//! retained until requested.

use std::collections::VecDeque;

use log::trace;

use crate::error::Result;
use crate::transport::Transport;

/// Size of a single bulk refill read from the transport.
const REFILL_CHUNK: usize = 1024;

/// One element of a [`ByteStream::wait_for_sequence`] pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    /// Matches any byte.
    Any,
    /// Matches exactly this byte.
    Byte(u8),
}

impl Expected {
    fn matches(self, actual: u8) -> bool {
        match self {
            Expected::Any => true,
            Expected::Byte(b) => b == actual,
        }
    }
}

/// Single-byte-granularity pull interface over a boxed transport, with
/// arbitrary putback.
pub struct ByteStream {
    transport: Box<dyn Transport>,
    buffer: VecDeque<u8>,
}

impl ByteStream {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            buffer: VecDeque::new(),
        }
    }

    /// Returns the next byte, blocking until one is available.
    ///
    /// Serves buffered bytes first; on an empty buffer, refills with one bulk
    /// transport read (retried in a loop if the transport returns zero bytes).
    pub fn next_byte(&mut self) -> Result<u8> {
        loop {
            if let Some(b) = self.buffer.pop_front() {
                return Ok(b);
            }
            let mut chunk = [0u8; REFILL_CHUNK];
            let n = self.transport.read(&mut chunk)?;
            trace!("refilled {} bytes from transport", n);
            self.buffer.extend(&chunk[..n]);
        }
    }

    /// Pushes a byte back so the next [`next_byte`](Self::next_byte) returns it.
    pub fn putback(&mut self, byte: u8) {
        self.buffer.push_front(byte);
    }

    /// Pushes a sequence back; subsequent reads replay it in original order.
    pub fn putback_all(&mut self, bytes: &[u8]) {
        for &b in bytes.iter().rev() {
            self.buffer.push_front(b);
        }
    }

    /// Consumes bytes until a contiguous run matches `pattern` and returns
    /// the matched window.
    ///
    /// A mismatch resets the match position to zero and discards the partial
    /// window; the mismatching byte itself is consumed, and scanning resumes
    /// with the byte after it. An empty pattern matches immediately without
    /// consuming anything.
    pub fn wait_for_sequence(&mut self, pattern: &[Expected]) -> Result<Vec<u8>> {
        if pattern.is_empty() {
            return Ok(Vec::new());
        }
        let mut window = Vec::with_capacity(pattern.len());
        let mut index = 0;
        loop {
            let actual = self.next_byte()?;
            if pattern[index].matches(actual) {
                trace!("pattern[{}] matched 0x{:02X}", index, actual);
                window.push(actual);
                if index == pattern.len() - 1 {
                    return Ok(window);
                }
                index += 1;
            } else {
                trace!("pattern reset at 0x{:02X}", actual);
                index = 0;
                window.clear();
            }
        }
    }

    /// Writes raw bytes to the transport and flushes them.
    pub fn send(&mut self, bytes: &[u8]) -> Result<()> {
        trace!("sending {:02X?}", bytes);
        self.transport.write_all(bytes)?;
        self.transport.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Read, Write};

    /// Transport fake that serves a fixed byte script and errors when drained.
    struct Script(Vec<u8>);

    impl Read for Script {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.0.is_empty() {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "script drained"));
            }
            let n = buf.len().min(self.0.len());
            buf[..n].copy_from_slice(&self.0[..n]);
            self.0.drain(..n);
            Ok(n)
        }
    }
    impl Write for Script {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn stream(bytes: &[u8]) -> ByteStream {
        ByteStream::new(Box::new(Script(bytes.to_vec())))
    }

    #[test]
    fn reads_in_order_across_refills() {
        let mut s = stream(&[1, 2, 3]);
        assert_eq!(s.next_byte().unwrap(), 1);
        assert_eq!(s.next_byte().unwrap(), 2);
        assert_eq!(s.next_byte().unwrap(), 3);
        assert!(s.next_byte().is_err());
    }

    #[test]
    fn putback_is_served_before_transport() {
        let mut s = stream(&[10, 11]);
        assert_eq!(s.next_byte().unwrap(), 10);
        s.putback(10);
        assert_eq!(s.next_byte().unwrap(), 10);
        assert_eq!(s.next_byte().unwrap(), 11);
    }

    #[test]
    fn putback_all_replays_in_original_order() {
        let mut s = stream(&[99]);
        s.putback_all(&[1, 2, 3]);
        assert_eq!(s.next_byte().unwrap(), 1);
        assert_eq!(s.next_byte().unwrap(), 2);
        assert_eq!(s.next_byte().unwrap(), 3);
        assert_eq!(s.next_byte().unwrap(), 99);
    }

    #[test]
    fn wait_for_sequence_restarts_after_partial_match() {
        // Pattern [A, any, B] against [X, A, Y, Z, X, A, Q, B]: the partial
        // match [A, Y] dies on Z, and the matched window is [A, Q, B].
        const A: u8 = 0xA0;
        const B: u8 = 0xB0;
        let mut s = stream(&[0x01, A, 0x59, 0x5A, 0x01, A, 0x51, B]);
        let window = s
            .wait_for_sequence(&[Expected::Byte(A), Expected::Any, Expected::Byte(B)])
            .unwrap();
        assert_eq!(window, vec![A, 0x51, B]);
    }

    #[test]
    fn empty_pattern_matches_without_consuming() {
        let mut s = stream(&[7]);
        assert_eq!(s.wait_for_sequence(&[]).unwrap(), Vec::<u8>::new());
        assert_eq!(s.next_byte().unwrap(), 7);
    }

    #[test]
    fn wait_for_sequence_matches_at_stream_start() {
        let mut s = stream(&[0xF9, 2, 5]);
        let window = s
            .wait_for_sequence(&[Expected::Byte(0xF9), Expected::Any, Expected::Any])
            .unwrap();
        assert_eq!(window, vec![0xF9, 2, 5]);
    }
}
