use std::io::{self, ErrorKind, Read};

use bytes::{Buf, Bytes, BytesMut};
use tracing::trace;

use crate::error::{BencodeError, SyntaxError};

/// Byte-level lookahead over a streaming source.
///
/// `buf[..start]` has been consumed and is dropped on the next fill,
/// `buf[start..cur]` is the token being scanned and `buf[cur..end]` is
/// read-ahead. `buf[end..]` is zeroed spare room for the next read; it is only
/// initialized when the buffer grows, never on every fill.
/// `consumed` counts the stream bytes already dropped from the front of `buf`,
/// so `consumed + cur` is always the stream offset of the next byte.
pub(crate) struct Lexer<R> {
    src: R,
    buf: BytesMut,
    start: usize,
    cur: usize,
    end: usize,
    consumed: u64,
    min_buf_size: usize,
}

impl<R: Read> Lexer<R> {
    pub fn new(src: R, min_buf_size: usize) -> Self {
        Self {
            src,
            buf: BytesMut::with_capacity(min_buf_size),
            start: 0,
            cur: 0,
            end: 0,
            consumed: 0,
            min_buf_size,
        }
    }

    /// Stream offset of the next unread byte.
    pub fn position(&self) -> u64 {
        self.consumed + self.cur as u64
    }

    /// Stream offset of the byte most recently returned by [`next`](Self::next).
    pub fn last_offset(&self) -> u64 {
        self.position().saturating_sub(1)
    }

    /// Read-ahead bytes pulled from the source but not yet consumed.
    pub fn buffered(&self) -> &[u8] {
        &self.buf[self.cur..self.end]
    }

    pub fn get_ref(&self) -> &R {
        &self.src
    }

    pub fn into_inner(self) -> R {
        self.src
    }

    /// Returns the next byte, or `None` if the source is exhausted.
    pub fn next_or_eof(&mut self) -> Result<Option<u8>, BencodeError> {
        if self.cur == self.end && self.fill(1)? == 0 {
            return Ok(None);
        }
        let byte = self.buf[self.cur];
        self.cur += 1;
        Ok(Some(byte))
    }

    /// Returns the next byte; running out of input here is a syntax error.
    pub fn next(&mut self) -> Result<u8, BencodeError> {
        match self.next_or_eof()? {
            Some(byte) => Ok(byte),
            None => Err(BencodeError::syntax(
                self.position(),
                SyntaxError::UnexpectedEof,
            )),
        }
    }

    /// Returns `true` if no bytes remain in the buffer or the source.
    pub fn at_eof(&mut self) -> Result<bool, BencodeError> {
        Ok(self.cur == self.end && self.fill(1)? == 0)
    }

    /// Steps back over the byte returned by the last [`next`](Self::next).
    pub fn backup(&mut self) {
        debug_assert!(self.cur > self.start, "backup past the start of the token");
        self.cur -= 1;
    }

    /// Marks the current position as the start of the next token.
    pub fn commit(&mut self) {
        self.start = self.cur;
    }

    /// Consumes `n` bytes into the current token, reading from the source as
    /// many times as it takes.
    pub fn skip(&mut self, n: usize) -> Result<(), BencodeError> {
        while self.end - self.cur < n {
            let missing = n - (self.end - self.cur);
            if self.fill(missing)? == 0 {
                self.cur = self.end;
                return Err(BencodeError::syntax(
                    self.position(),
                    SyntaxError::UnexpectedEof,
                ));
            }
        }
        self.cur += n;
        Ok(())
    }

    /// Splits off the bytes between the last commit and the cursor.
    ///
    /// The token shares the buffer's allocation; read-ahead stays at the front
    /// of the buffer and both cursors are rebased to zero.
    pub fn cut(&mut self) -> Bytes {
        let mut token = self.buf.split_to(self.cur);
        token.advance(self.start);
        self.consumed += self.cur as u64;
        self.end -= self.cur;
        self.start = 0;
        self.cur = 0;
        token.freeze()
    }

    /// Drops everything consumed so far, keeping read-ahead for the next value.
    pub fn reset(&mut self) {
        self.commit();
        self.compact();
    }

    fn compact(&mut self) {
        if self.start > 0 {
            self.buf.advance(self.start);
            self.consumed += self.start as u64;
            self.cur -= self.start;
            self.end -= self.start;
            self.start = 0;
        }
    }

    /// Performs one read from the source into the spare room, growing it
    /// first if less than `max(want, min_buf_size)` bytes remain.
    /// Returns the number of bytes read; zero means end of input.
    fn fill(&mut self, want: usize) -> io::Result<usize> {
        self.compact();

        let need = want.max(self.min_buf_size);
        if self.buf.len() - self.end < need {
            self.buf.truncate(self.end);
            self.buf.reserve(need);
            let capacity = self.buf.capacity();
            self.buf.resize(capacity, 0);
            trace!(capacity, "grew lookahead buffer");
        }

        let n = loop {
            match self.src.read(&mut self.buf[self.end..]) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };
        self.end += n;
        trace!(read = n, buffered = self.end - self.cur, "filled lookahead buffer");
        Ok(n)
    }
}
