//! Peekable, offset-tracking reader over a fast-export stream

use std::io::{self, BufRead, Read, Write};

use crate::error::{Error, Result};

/// Buffered reader that hands out whole lines and exact-length blocks.
///
/// Peeking is served straight from the `BufRead` buffer, so looking at the
/// byte after a block never needs a pushback copy of the stream.
pub struct StreamReader<R> {
    inner: R,
    offset: u64,
}

impl<R: BufRead> StreamReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, offset: 0 }
    }

    /// Number of bytes consumed so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Read one line, LF included when present, into `buf`.
    /// Returns false once the stream is exhausted.
    pub fn read_line(&mut self, buf: &mut Vec<u8>) -> Result<bool> {
        buf.clear();
        let read = self.inner.read_until(b'\n', buf)?;
        self.offset += read as u64;
        Ok(read > 0)
    }

    /// Read exactly `len` bytes into memory.
    pub fn read_exact_vec(&mut self, len: usize, context: &'static str) -> Result<Vec<u8>> {
        // Cap the up-front allocation at 1 MiB.
        let mut buf = Vec::with_capacity(len.min(1 << 20));
        let read = (&mut self.inner).take(len as u64).read_to_end(&mut buf)?;
        self.offset += read as u64;
        if read < len {
            return Err(Error::Truncated {
                context,
                offset: self.offset,
            });
        }
        Ok(buf)
    }

    /// Stream exactly `len` bytes into `out` without buffering them.
    pub fn copy_exact<W: Write>(
        &mut self,
        len: u64,
        out: &mut W,
        context: &'static str,
    ) -> Result<()> {
        let copied = io::copy(&mut (&mut self.inner).take(len), out)?;
        self.offset += copied;
        if copied < len {
            return Err(Error::Truncated {
                context,
                offset: self.offset,
            });
        }
        Ok(())
    }

    /// Look at the next byte without consuming it.
    pub fn peek_byte(&mut self) -> Result<Option<u8>> {
        Ok(self.inner.fill_buf()?.first().copied())
    }

    /// Consume the next byte if it equals `byte`.
    pub fn consume_if(&mut self, byte: u8) -> Result<bool> {
        if self.peek_byte()? == Some(byte) {
            self.inner.consume(1);
            self.offset += 1;
            return Ok(true);
        }
        Ok(false)
    }
}
