//! Line decoder: raw byte stream -> trimmed, non-empty text lines
//!
//! The decoder never gives up on bad input. Invalid UTF-8 is dropped byte by
//! byte, blank lines are skipped, and lines longer than the configured bound
//! are discarded as a whole so the stream resynchronizes at the next newline.
//! Iteration ends on EOF, on cancellation, or after yielding a single
//! transport error.

use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use std::io::{self, BufRead};

/// Default upper bound on a single line, in bytes (newline excluded)
pub const DEFAULT_MAX_LINE_LEN: usize = 4096;

/// Counters describing what the decoder absorbed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Non-empty lines handed to the caller
    pub lines_yielded: u64,
    /// Lines that were empty after trimming
    pub blank_lines: u64,
    /// Lines discarded for exceeding the length bound
    pub oversized_lines: u64,
    /// Bytes removed because they were not valid UTF-8
    pub invalid_bytes_dropped: u64,
}

/// Lazy iterator over decoded lines of a `BufRead` source
pub struct LineDecoder<R> {
    reader: R,
    cancel: CancelToken,
    max_line_len: usize,
    buf: Vec<u8>,
    exhausted: bool,
    cancelled: bool,
    failed: bool,
    stats: DecoderStats,
}

impl<R: BufRead> LineDecoder<R> {
    pub fn new(reader: R, cancel: CancelToken) -> Self {
        Self {
            reader,
            cancel,
            max_line_len: DEFAULT_MAX_LINE_LEN,
            buf: Vec::new(),
            exhausted: false,
            cancelled: false,
            failed: false,
            stats: DecoderStats::default(),
        }
    }

    /// Override the per-line byte bound
    pub fn with_max_line_len(mut self, max_line_len: usize) -> Self {
        self.max_line_len = max_line_len;
        self
    }

    pub fn stats(&self) -> &DecoderStats {
        &self.stats
    }

    /// True if iteration stopped because the cancel token was set
    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Read the next newline-terminated line that fits the bound.
    ///
    /// Returns `Ok(None)` on EOF or cancellation. A trailing line without a
    /// newline is returned before EOF is reported.
    fn read_raw_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        self.buf.clear();
        let mut oversized = false;

        loop {
            if self.cancel.is_cancelled() {
                self.cancelled = true;
                return Ok(None);
            }

            let available = match self.reader.fill_buf() {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };

            if available.is_empty() {
                self.exhausted = true;
                if oversized {
                    self.note_oversized();
                    return Ok(None);
                }
                if self.buf.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(std::mem::take(&mut self.buf)));
            }

            let newline = available.iter().position(|&b| b == b'\n');
            let (chunk, used) = match newline {
                Some(pos) => (&available[..pos], pos + 1),
                None => (available, available.len()),
            };

            if !oversized {
                if self.buf.len() + chunk.len() > self.max_line_len {
                    oversized = true;
                    self.buf.clear();
                } else {
                    self.buf.extend_from_slice(chunk);
                }
            }
            self.reader.consume(used);

            if newline.is_some() {
                if oversized {
                    self.note_oversized();
                    oversized = false;
                    continue;
                }
                return Ok(Some(std::mem::take(&mut self.buf)));
            }
        }
    }

    fn note_oversized(&mut self) {
        self.stats.oversized_lines += 1;
        tracing::warn!(
            max_line_len = self.max_line_len,
            "discarding line longer than {} bytes",
            self.max_line_len
        );
    }

    /// Drop invalid UTF-8, trim, and filter blank lines
    fn decode(&mut self, raw: &[u8]) -> Option<String> {
        let mut text = String::with_capacity(raw.len());
        for chunk in raw.utf8_chunks() {
            text.push_str(chunk.valid());
            self.stats.invalid_bytes_dropped += chunk.invalid().len() as u64;
        }

        let trimmed = text.trim();
        if trimmed.is_empty() {
            self.stats.blank_lines += 1;
            return None;
        }

        self.stats.lines_yielded += 1;
        Some(trimmed.to_string())
    }
}

impl<R: BufRead> Iterator for LineDecoder<R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.exhausted || self.cancelled || self.failed {
                return None;
            }

            match self.read_raw_line() {
                Ok(Some(raw)) => {
                    if let Some(line) = self.decode(&raw) {
                        return Some(Ok(line));
                    }
                }
                Ok(None) => return None,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(Error::Transport(e)));
                }
            }
        }
    }
}
