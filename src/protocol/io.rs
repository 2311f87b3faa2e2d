//! Protocol I/O for provider message framing
//!
//! This module provides:
//! - `Framing` - native-messaging length prefix or newline-delimited JSON
//! - `encode_frame` for serializing a message into one frame
//! - `FrameReader` for streaming, gracefully degrading reads

use std::io::{self, BufRead, BufReader, Read};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::message::ProviderResponse;

/// Largest frame accepted from a provider (browser native-messaging limit)
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Maximum length for raw JSON in logs
const MAX_RAW_LOG_PREVIEW: usize = 200;

/// How messages are delimited on the provider's stdio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Framing {
    /// 4-byte native-endian length prefix followed by UTF-8 JSON
    #[default]
    Native,
    /// One JSON object per line
    Jsonl,
}

/// Get a truncated preview of raw JSON for logging
pub fn log_preview(raw: &str) -> (&str, usize) {
    let len = raw.len();
    if len > MAX_RAW_LOG_PREVIEW {
        let mut end = MAX_RAW_LOG_PREVIEW;
        while !raw.is_char_boundary(end) {
            end -= 1;
        }
        (&raw[..end], len)
    } else {
        (raw, len)
    }
}

/// Serialize a message into a single frame
pub fn encode_frame<T: Serialize>(msg: &T, framing: Framing) -> Result<Vec<u8>, serde_json::Error> {
    let json = serde_json::to_vec(msg)?;
    Ok(match framing {
        Framing::Native => {
            let mut frame = Vec::with_capacity(4 + json.len());
            // Payloads we send are tiny; u32 covers any realistic message
            frame.extend_from_slice(&(json.len() as u32).to_ne_bytes());
            frame.extend_from_slice(&json);
            frame
        }
        Framing::Jsonl => {
            let mut frame = json;
            frame.push(b'\n');
            frame
        }
    })
}

/// Reads provider responses one frame at a time
///
/// Malformed payloads are logged and skipped; only I/O failures and
/// oversized frames end the stream with an error.
pub struct FrameReader<R: Read> {
    reader: BufReader<R>,
    framing: Framing,
    /// Reusable buffer - cleared per frame to avoid allocations
    buffer: Vec<u8>,
}

impl<R: Read> FrameReader<R> {
    pub fn new(reader: R, framing: Framing) -> Self {
        FrameReader {
            reader: BufReader::new(reader),
            framing,
            buffer: Vec::with_capacity(1024),
        }
    }

    /// Read the next well-formed response
    ///
    /// # Returns
    /// * `Ok(Some(resp))` - parsed response
    /// * `Ok(None)` - end of stream
    /// * `Err(e)` - I/O failure or protocol violation
    pub fn next_response(&mut self) -> io::Result<Option<ProviderResponse>> {
        loop {
            if !self.read_frame()? {
                debug!("Reached end of provider stream");
                return Ok(None);
            }

            let raw = String::from_utf8_lossy(&self.buffer);
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                debug!("Skipping empty provider frame");
                continue;
            }

            match serde_json::from_str::<ProviderResponse>(trimmed) {
                Ok(resp) => return Ok(Some(resp)),
                Err(e) => {
                    let (preview, raw_len) = log_preview(trimmed);
                    warn!(
                        error = %e,
                        raw_preview = %preview,
                        raw_len = raw_len,
                        "Skipping malformed provider message"
                    );
                }
            }
        }
    }

    /// Fill `self.buffer` with one frame. Returns false on clean EOF.
    fn read_frame(&mut self) -> io::Result<bool> {
        self.buffer.clear();
        match self.framing {
            Framing::Native => {
                let mut header = [0u8; 4];
                match self.reader.read_exact(&mut header) {
                    Ok(()) => {}
                    Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(false),
                    Err(e) => return Err(e),
                }

                let len = u32::from_ne_bytes(header) as usize;
                if len > MAX_FRAME_LEN {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("frame of {} bytes exceeds {} byte limit", len, MAX_FRAME_LEN),
                    ));
                }

                self.buffer.resize(len, 0);
                self.reader.read_exact(&mut self.buffer)?;
                Ok(true)
            }
            Framing::Jsonl => {
                // Bounded so a provider that never sends a newline cannot grow the buffer
                let limit = MAX_FRAME_LEN as u64 + 1;
                let read = (&mut self.reader).take(limit).read_until(b'\n', &mut self.buffer)?;
                if self.buffer.len() > MAX_FRAME_LEN && self.buffer.last() != Some(&b'\n') {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("line exceeds {} byte limit", MAX_FRAME_LEN),
                    ));
                }
                Ok(read > 0)
            }
        }
    }
}
