#![forbid(unsafe_code)]

//! Client-side orchestration for a remote, multi-stage candidate-screening
//! pipeline: starts runs, ingests the NDJSON progress stream, tracks stage,
//! results and errors, probes backend health, and writes human decisions
//! back into received results.

pub mod client;
pub mod config;
pub mod errors;
pub mod models;
pub mod orchestrator;
pub mod stream;

pub use client::BackendClient;
pub use config::ClientConfig;
pub use errors::{AppError, Result};
pub use orchestrator::SessionOrchestrator;
