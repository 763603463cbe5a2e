//! Reassembly of raw text fragments into whole lines.
//!
//! A patch arrives as a sequence of fragments (one per network or file read)
//! whose boundaries fall anywhere, usually in the middle of a line.
//! [`ChunkSource`] hides those boundaries: it keeps the incomplete tail of the
//! previous fragment as a carry, prepends it to the next one and exposes a
//! forward-only cursor over the complete lines of the fragment currently held.
//! Only one fragment's lines are retained at a time.

use crate::TransportError;
use std::io::{ErrorKind, Read};

/// Forward-only line cursor over a sequence of text fragments.
pub struct ChunkSource<I> {
    fragments: I,
    lines: Vec<String>,
    index: usize,
    carry: String,
    exhausted: bool,
    /// Number of lines held by fragments already discarded
    consumed: usize,
}

impl<I> ChunkSource<I>
where
    I: Iterator<Item = Result<String, TransportError>>,
{
    /// Open a source and position it on the first line.
    pub fn open<T>(fragments: T) -> Result<Self, TransportError>
    where
        T: IntoIterator<IntoIter = I>,
    {
        let mut source = Self {
            fragments: fragments.into_iter(),
            lines: Vec::new(),
            index: 0,
            carry: String::new(),
            exhausted: false,
            consumed: 0,
        };
        source.refill()?;
        Ok(source)
    }

    /// The line under the cursor, or `None` once the input is exhausted.
    pub fn current(&self) -> Option<&str> {
        self.lines.get(self.index).map(String::as_str)
    }

    /// 1-based position of the cursor in the whole input.
    pub fn line_number(&self) -> usize {
        self.consumed + self.index + 1
    }

    /// Move the cursor `n` lines forward, pulling fragments as needed.
    ///
    /// Returns `false` when the producer ran out before the requested
    /// position was reached; the cursor is then at end of input.
    pub fn advance(&mut self, mut n: usize) -> Result<bool, TransportError> {
        loop {
            let remaining = self.lines.len() - self.index;
            if n < remaining {
                self.index += n;
                return Ok(true);
            }
            n -= remaining;
            if !self.refill()? {
                return Ok(false);
            }
        }
    }

    /// Drop the held lines and pull fragments until at least one complete
    /// line is available.
    fn refill(&mut self) -> Result<bool, TransportError> {
        self.consumed += self.lines.len();
        self.lines.clear();
        self.index = 0;

        while self.lines.is_empty() {
            if self.exhausted {
                return Ok(false);
            }
            match self.fragments.next() {
                Some(fragment) => {
                    let mut text = std::mem::take(&mut self.carry);
                    text.push_str(&fragment?);
                    let mut pieces = text.split('\n');
                    // split always yields at least one piece: the trailing
                    // incomplete line, possibly empty
                    let tail = pieces.next_back().unwrap_or_default().to_string();
                    self.lines = pieces.map(complete_line).collect();
                    self.carry = tail;
                }
                None => {
                    self.exhausted = true;
                    if !self.carry.is_empty() {
                        let last = std::mem::take(&mut self.carry);
                        self.lines.push(complete_line(&last));
                    }
                }
            }
        }

        Ok(true)
    }
}

fn complete_line(line: &str) -> String {
    line.strip_suffix('\r').unwrap_or(line).to_string()
}

/// Fragment producer over any byte reader.
///
/// Each fragment holds at most `chunk_size` bytes of input. A multi-byte
/// UTF-8 sequence cut by a read boundary is held back and completed by the
/// next read; invalid bytes are replaced with U+FFFD.
pub struct ReadFragments<R> {
    reader: R,
    chunk_size: usize,
    pending: Vec<u8>,
    done: bool,
}

impl<R: Read> ReadFragments<R> {
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            chunk_size: chunk_size.max(1),
            pending: Vec::new(),
            done: false,
        }
    }

    /// Decode the pending bytes, replacing each invalid sequence and keeping
    /// back only an incomplete character at the very end.
    fn decode(&mut self) -> String {
        let mut text = String::with_capacity(self.pending.len());
        let mut start = 0;

        while start < self.pending.len() {
            match std::str::from_utf8(&self.pending[start..]) {
                Ok(valid) => {
                    text.push_str(valid);
                    start = self.pending.len();
                }
                Err(e) => {
                    let end = start + e.valid_up_to();
                    text.push_str(&String::from_utf8_lossy(&self.pending[start..end]));
                    match e.error_len() {
                        Some(len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            start = end + len;
                        }
                        None => {
                            start = end;
                            break;
                        }
                    }
                }
            }
        }

        self.pending.drain(..start);
        text
    }
}

impl<R: Read> Iterator for ReadFragments<R> {
    type Item = Result<String, TransportError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut buf = vec![0u8; self.chunk_size];
        let read = loop {
            match self.reader.read(&mut buf) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(TransportError::Read {
                        message: e.to_string(),
                    }));
                }
            }
        };

        if read == 0 {
            self.done = true;
            if self.pending.is_empty() {
                return None;
            }
            let rest = std::mem::take(&mut self.pending);
            return Some(Ok(String::from_utf8_lossy(&rest).into_owned()));
        }

        self.pending.extend_from_slice(&buf[..read]);
        Some(Ok(self.decode()))
    }
}
