// crates/docker-bridge-core/src/stream.rs
// ============================================================================
// Module: Stream Multiplex Decoder
// Description: Decodes length-framed stdout/stderr messages from a byte stream.
// Purpose: Demultiplex remote command output returned by exec start.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The engine multiplexes a remote command's stdout and stderr into one body
//! of frames. Each frame is an 8-byte header followed by a payload:
//!
//! ```text
//! [tag, 0, 0, 0, len_be_0, len_be_1, len_be_2, len_be_3] payload[len]
//! ```
//!
//! Tag `1` is stdout and `2` is stderr; any other tag is surfaced as
//! [`StreamTag::Unknown`] for the consumer to ignore.
//! Invariants:
//! - End of stream before a full header means "no more frames".
//! - End of stream inside a payload is a [`BridgeError::StreamRead`].
//! - Payload storage grows with bytes received, never with the declared length alone.
//! - Each emitted payload is an owned copy, independent of decoder state.
//! - The decoder is single-pass; once it ends or fails it yields nothing more.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::ErrorKind;
use std::io::Read;

use crate::error::BridgeError;
use crate::error::classify_body_read;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Size of a frame header in bytes.
pub const FRAME_HEADER_LEN: usize = 8;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Stream a frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamTag {
    /// Standard output (tag `1`).
    Stdout,
    /// Standard error (tag `2`).
    Stderr,
    /// Any other tag byte.
    Unknown(u8),
}

impl StreamTag {
    /// Maps a header tag byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            1 => Self::Stdout,
            2 => Self::Stderr,
            other => Self::Unknown(other),
        }
    }
}

/// One decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramedMessage {
    /// Stream the payload belongs to.
    pub tag: StreamTag,
    /// Payload bytes, exactly the header-declared length.
    pub payload: Vec<u8>,
}

/// Pull-based frame decoder over a byte stream.
///
/// # Invariants
/// - After returning `None` or an error, every later call returns `None`.
#[derive(Debug)]
pub struct StreamMultiplexDecoder<R> {
    /// Source byte stream.
    reader: R,
    /// Set once the stream ended or failed.
    finished: bool,
}

impl<R: Read> StreamMultiplexDecoder<R> {
    /// Wraps a byte stream.
    pub const fn new(reader: R) -> Self {
        Self {
            reader,
            finished: false,
        }
    }

    /// Decodes the next frame, or `None` at end of stream.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::StreamRead`] when the stream ends inside a
    /// payload or the underlying read fails.
    pub fn next_message(&mut self) -> Result<Option<FramedMessage>, BridgeError> {
        if self.finished {
            return Ok(None);
        }
        let result = self.decode_frame();
        if !matches!(result, Ok(Some(_))) {
            self.finished = true;
        }
        result
    }

    /// Reads one header and payload.
    fn decode_frame(&mut self) -> Result<Option<FramedMessage>, BridgeError> {
        let mut header = [0u8; FRAME_HEADER_LEN];
        if !self.fill_header(&mut header)? {
            return Ok(None);
        }
        let length = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);
        let mut payload = Vec::new();
        (&mut self.reader).take(u64::from(length)).read_to_end(&mut payload).map_err(|err| {
            classify_body_read(err, |err| BridgeError::StreamRead(err.to_string()))
        })?;
        if u64::try_from(payload.len()).ok() != Some(u64::from(length)) {
            return Err(BridgeError::StreamRead(format!(
                "stream ended before {length} payload bytes were read"
            )));
        }
        Ok(Some(FramedMessage {
            tag: StreamTag::from_byte(header[0]),
            payload,
        }))
    }

    /// Fills the header, returning false when the stream ends first.
    fn fill_header(&mut self, header: &mut [u8; FRAME_HEADER_LEN]) -> Result<bool, BridgeError> {
        let mut filled = 0;
        while filled < FRAME_HEADER_LEN {
            match self.reader.read(&mut header[filled..]) {
                Ok(0) => return Ok(false),
                Ok(read) => filled += read,
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => {
                    return Err(classify_body_read(err, |err| {
                        BridgeError::StreamRead(err.to_string())
                    }));
                }
            }
        }
        Ok(true)
    }
}

impl<R: Read> Iterator for StreamMultiplexDecoder<R> {
    type Item = Result<FramedMessage, BridgeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_message().transpose()
    }
}
