//! Screening stream ingestion.
//!
//! Covers newline framing of the chunked response body and decoding of each
//! line into typed events.

pub mod codec;
pub mod decoder;

pub use decoder::{decode_record, record_stream, StreamEvent, StreamRecord};
