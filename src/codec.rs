//! Line codec for tokio.
//!
//! Reads and writes `\n`-terminated lines. Inbound bytes that are not valid
//! UTF-8 are replaced with U+FFFD rather than failing the connection.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::CodecError;

/// Newline-delimited text codec with a per-line length limit.
#[derive(Debug)]
pub struct ChatLineCodec {
    /// Index of next byte to check for newline
    next_index: usize,
    /// Maximum line length, excluding the terminator
    max_len: usize,
}

impl ChatLineCodec {
    pub fn new(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
        }
    }

    fn to_line(raw: &[u8]) -> String {
        let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        String::from_utf8_lossy(raw).into_owned()
    }
}

impl Decoder for ChatLineCodec {
    type Item = String;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, CodecError> {
        // Never scan past max_len + 1 bytes: a terminator beyond that is too late.
        let read_to = src.len().min(self.max_len.saturating_add(1));

        if let Some(offset) = src[self.next_index..read_to]
            .iter()
            .position(|b| *b == b'\n')
        {
            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;
            return Ok(Some(Self::to_line(&line)));
        }

        if src.len() > self.max_len {
            return Err(CodecError::LineTooLong {
                actual: src.len(),
                limit: self.max_len,
            });
        }

        // No complete line yet - remember where we stopped
        self.next_index = read_to;
        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>, CodecError> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        if src.is_empty() {
            return Ok(None);
        }

        // Unterminated last line
        let line = src.split_to(src.len());
        self.next_index = 0;
        Ok(Some(Self::to_line(&line)))
    }
}

impl<T: AsRef<str>> Encoder<T> for ChatLineCodec {
    type Error = CodecError;

    fn encode(&mut self, line: T, dst: &mut BytesMut) -> Result<(), CodecError> {
        let line = line.as_ref();
        dst.reserve(line.len() + 1);
        dst.extend_from_slice(line.as_bytes());
        dst.extend_from_slice(b"\n");
        Ok(())
    }
}
