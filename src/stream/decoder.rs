//! Stream record decoding.
//!
//! Turns the chunked body of `POST /screen-stream` into a lazy sequence of
//! typed [`StreamRecord`]s. The body is framed by [`RecordCodec`] over a
//! [`StreamReader`], so records split across network chunks are reassembled
//! and several records in one chunk are emitted one by one.
//!
//! # Record shape
//!
//! | Field     | Maps to                                     |
//! |-----------|---------------------------------------------|
//! | `error`   | [`StreamEvent::Failed`] (non-empty only)    |
//! | `step`    | [`StreamEvent::Stage`]                      |
//! | `results` | [`StreamEvent::Results`] (non-empty ranking)|
//! | `status`  | Carried on [`StreamEvent::Stage`]           |
//!
//! A record carrying none of `error`, `step` or `results` is malformed.

use std::io;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use tokio_util::codec::FramedRead;
use tokio_util::io::StreamReader;
use tracing::{debug, warn};

use crate::models::ResultSet;
use crate::stream::codec::RecordCodec;
use crate::{AppError, Result};

/// One typed event carried by a stream record.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// The pipeline reached a stage. `index` is the raw wire value.
    Stage {
        /// Stage index as sent by the backend.
        index: i64,
        /// Informational stage label sent alongside the index.
        status: Option<String>,
    },
    /// The pipeline delivered a result set with a non-empty ranking.
    Results(ResultSet),
    /// The pipeline failed.
    Failed(String),
}

/// A decoded stream record: its events in application order.
///
/// `Failed` always comes first, then `Stage`, then `Results`.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRecord(Vec<StreamEvent>);

impl StreamRecord {
    /// Events in application order.
    #[must_use]
    pub fn events(&self) -> &[StreamEvent] {
        &self.0
    }

    /// Consume the record, yielding its events.
    #[must_use]
    pub fn into_events(self) -> Vec<StreamEvent> {
        self.0
    }
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default)]
    step: Option<i64>,
    #[serde(default)]
    results: Option<ResultSet>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Decode a single line of the screening stream.
///
/// # Return value
///
/// - `Ok(Some(record))`: the line carries at least one event.
/// - `Ok(None)`: the line is blank, or only carries a result set with an
///   empty ranking.
/// - `Err(AppError::StreamDecode(..))`: the line is not a valid record.
///
/// # Errors
///
/// Returns `AppError::StreamDecode` for invalid JSON, wrongly typed fields,
/// a result set that fails [`ResultSet::validate`], or a record with no
/// recognised field.
pub fn decode_record(line: &str) -> Result<Option<StreamRecord>> {
    if line.trim().is_empty() {
        return Ok(None);
    }

    let raw: RawRecord = serde_json::from_str(line)
        .map_err(|e| AppError::StreamDecode(format!("malformed record: {e}")))?;

    let error = raw.error.filter(|msg| !msg.is_empty());
    if error.is_none() && raw.step.is_none() && raw.results.is_none() {
        return Err(AppError::StreamDecode(
            "record carries no step, results, or error field".into(),
        ));
    }

    let mut events = Vec::with_capacity(3);
    if let Some(message) = error {
        events.push(StreamEvent::Failed(message));
    }
    if let Some(index) = raw.step {
        events.push(StreamEvent::Stage {
            index,
            status: raw.status,
        });
    }
    if let Some(results) = raw.results {
        results.validate()?;
        if results.is_empty() {
            debug!("stream record carries an empty ranking, ignoring results");
        } else {
            events.push(StreamEvent::Results(results));
        }
    }

    if events.is_empty() {
        return Ok(None);
    }
    Ok(Some(StreamRecord(events)))
}

/// Frame and decode a chunked byte stream into records.
///
/// Malformed records are logged at `WARN` and skipped. A read failure on the
/// underlying body is yielded once as `Err(AppError::Transport(..))`, after
/// which the stream ends. Unterminated text left at end of stream is dropped.
pub fn record_stream<S, E>(
    chunks: S,
    max_record_bytes: usize,
) -> impl Stream<Item = Result<StreamRecord>> + Send
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send,
    E: Into<io::Error>,
{
    let reader = StreamReader::new(chunks);
    FramedRead::new(reader, RecordCodec::with_max_length(max_record_bytes)).filter_map(|item| {
        let decoded = match item {
            Ok(line) => match decode_record(&line) {
                Ok(record) => record.map(Ok),
                Err(err) => {
                    warn!(error = %err, raw_line = %line, "skipping malformed stream record");
                    None
                }
            },
            Err(err) => Some(Err(AppError::Transport(format!(
                "stream read failed: {err}"
            )))),
        };
        std::future::ready(decoded)
    })
}
