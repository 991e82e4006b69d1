//! Unit tests for chunked stream decoding.
//!
//! Feeds in-memory chunk sequences through `record_stream` and checks that
//! the emitted records do not depend on where chunk boundaries fall.

use std::io;

use bytes::Bytes;
use futures_util::{stream, StreamExt};

use screening_client::stream::codec::MAX_RECORD_BYTES;
use screening_client::stream::{record_stream, StreamEvent, StreamRecord};
use screening_client::{AppError, Result};

use super::fixtures::{results_line, sample_results};

async fn decode_chunks(chunks: Vec<Vec<u8>>) -> Vec<Result<StreamRecord>> {
    let chunks = stream::iter(
        chunks
            .into_iter()
            .map(|chunk| Ok::<_, io::Error>(Bytes::from(chunk))),
    );
    record_stream(chunks, MAX_RECORD_BYTES).collect().await
}

fn stages(records: &[Result<StreamRecord>]) -> Vec<i64> {
    records
        .iter()
        .flat_map(|record| record.as_ref().unwrap().events().iter())
        .filter_map(|event| match event {
            StreamEvent::Stage { index, .. } => Some(*index),
            _ => None,
        })
        .collect()
}

fn full_stream() -> String {
    let mut body = String::new();
    for step in 0..8 {
        body.push_str(&format!("{{\"step\":{step},\"status\":\"stage {step}\"}}\n"));
    }
    body.push('\n');
    body.push_str(&results_line());
    body
}

#[tokio::test]
async fn split_inside_record_yields_exact_stage_sequence() {
    let records = decode_chunks(vec![
        b"{\"step\":0}\n{\"step\":1}\n{\"st".to_vec(),
        b"ep\":2}\n".to_vec(),
    ])
    .await;

    assert_eq!(stages(&records), vec![0, 1, 2]);
}

#[tokio::test]
async fn every_two_way_split_matches_single_chunk() {
    let body = full_stream().into_bytes();
    let expected = decode_chunks(vec![body.clone()]).await;
    assert_eq!(expected.len(), 9);

    for split in 0..=body.len() {
        let (head, tail) = body.split_at(split);
        let got = decode_chunks(vec![head.to_vec(), tail.to_vec()]).await;
        assert_eq!(got, expected, "split at byte {split} changed the output");
    }
}

#[tokio::test]
async fn byte_at_a_time_delivery_matches_single_chunk() {
    let body = full_stream().into_bytes();
    let expected = decode_chunks(vec![body.clone()]).await;

    let got = decode_chunks(body.iter().map(|b| vec![*b]).collect()).await;

    assert_eq!(got, expected);
}

#[tokio::test]
async fn split_exactly_at_delimiter_matches_single_chunk() {
    let got = decode_chunks(vec![
        b"{\"step\":3}\n".to_vec(),
        b"{\"step\":4}\n".to_vec(),
    ])
    .await;

    assert_eq!(stages(&got), vec![3, 4]);
}

#[tokio::test]
async fn results_record_spanning_chunks_is_reassembled() {
    let line = results_line().into_bytes();
    let third = line.len() / 3;
    let got = decode_chunks(vec![
        line[..third].to_vec(),
        line[third..2 * third].to_vec(),
        line[2 * third..].to_vec(),
    ])
    .await;

    assert_eq!(got.len(), 1);
    let events = got[0].as_ref().unwrap().events();
    assert!(events.contains(&StreamEvent::Results(sample_results())));
}

#[tokio::test]
async fn malformed_record_is_skipped_without_ending_stream() {
    let got = decode_chunks(vec![b"{\"step\":1}\n{oops}\n{\"step\":2}\n".to_vec()]).await;

    assert_eq!(stages(&got), vec![1, 2]);
}

#[tokio::test]
async fn trailing_text_without_delimiter_is_discarded() {
    let got = decode_chunks(vec![b"{\"step\":1}\n{\"step\":2}".to_vec()]).await;

    assert_eq!(
        stages(&got),
        vec![1],
        "unterminated record must not be force-parsed"
    );
}

#[tokio::test]
async fn read_failure_surfaces_as_transport_error() {
    let chunks = stream::iter(vec![
        Ok(Bytes::from_static(b"{\"step\":1}\n")),
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer")),
        Ok(Bytes::from_static(b"{\"step\":2}\n")),
    ]);

    let got: Vec<_> = record_stream(chunks, MAX_RECORD_BYTES).collect().await;

    assert_eq!(got.len(), 2);
    assert!(got[0].is_ok());
    assert!(
        matches!(got[1], Err(AppError::Transport(ref msg)) if msg.contains("reset by peer")),
        "unexpected item: {:?}",
        got[1]
    );
}
