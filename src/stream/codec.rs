//! NDJSON line codec for the screening stream.
//!
//! Wraps [`tokio_util::codec::LinesCodec`] with a configurable maximum line
//! length. Framing differs from a plain lines codec in two ways:
//!
//! - per-line faults (oversized line, invalid UTF-8) are logged and the
//!   offending line is dropped, so one bad record never ends the stream;
//! - at end of stream any unterminated trailing text is discarded instead of
//!   being emitted as a final line.
//!
//! # Usage
//!
//! Use [`RecordCodec`] as the codec parameter for
//! [`tokio_util::codec::FramedRead`].
//!
//! ```rust,ignore
//! use tokio_util::codec::FramedRead;
//! use screening_client::stream::codec::RecordCodec;
//!
//! let lines = FramedRead::new(body_reader, RecordCodec::new());
//! ```

use std::io::ErrorKind;

use bytes::BytesMut;
use tokio_util::codec::{Decoder, LinesCodec, LinesCodecError};
use tracing::{debug, warn};

use crate::{AppError, Result};

/// Default maximum record length: 1 MiB.
pub const MAX_RECORD_BYTES: usize = 1_048_576;

/// Newline-delimited record framing for the screening stream.
#[derive(Debug)]
pub struct RecordCodec {
    lines: LinesCodec,
    max_length: usize,
}

impl RecordCodec {
    /// Create a codec with the default [`MAX_RECORD_BYTES`] limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_length(MAX_RECORD_BYTES)
    }

    /// Create a codec rejecting records longer than `max_length` bytes.
    #[must_use]
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            lines: LinesCodec::new_with_max_length(max_length),
            max_length,
        }
    }
}

impl Default for RecordCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for RecordCodec {
    type Item = String;
    type Error = AppError;

    /// Decode the next complete line from `src`.
    ///
    /// Returns `Ok(None)` while `src` holds no complete line. Oversized and
    /// non-UTF-8 lines are skipped.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        loop {
            match self.lines.decode(src) {
                Ok(line) => return Ok(line),
                Err(LinesCodecError::MaxLineLengthExceeded) => {
                    // LinesCodec keeps discarding up to the next newline on
                    // the following call.
                    warn!(
                        max_length = self.max_length,
                        "stream record exceeds maximum length, discarding"
                    );
                }
                Err(LinesCodecError::Io(err)) if err.kind() == ErrorKind::InvalidData => {
                    warn!(error = %err, "stream record is not valid utf-8, discarding");
                }
                Err(LinesCodecError::Io(err)) => return Err(AppError::Io(err.to_string())),
            }
        }
    }

    /// Drain remaining complete lines at end of stream, then drop whatever
    /// unterminated text is left.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        let line = self.decode(src)?;
        if line.is_none() && !src.is_empty() {
            debug!(
                leftover_bytes = src.len(),
                "discarding unterminated trailing record at end of stream"
            );
            src.clear();
            // The inner codec's scan offset pointed into the cleared bytes.
            self.lines = LinesCodec::new_with_max_length(self.max_length);
        }
        Ok(line)
    }
}
