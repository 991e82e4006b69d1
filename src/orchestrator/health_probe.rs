//! Periodic backend liveness probe.
//!
//! The probe runs on its own task and publishes a [`HealthState`] through a
//! watch channel. It shares nothing with the screening run, so a failing
//! probe never touches session state.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::client::BackendClient;

/// Tri-state backend liveness.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    /// No probe has completed, or the backend reported an unrecognised status.
    #[default]
    Unknown,
    /// The backend reports it is running.
    Running,
    /// The probe failed or the backend reports an error.
    Error,
}

impl HealthState {
    /// Map a backend status string onto a health state.
    #[must_use]
    pub fn from_status(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "running" => Self::Running,
            "error" => Self::Error,
            other => {
                debug!(status = other, "unrecognised health status");
                Self::Unknown
            }
        }
    }
}

/// Perform one liveness request and map the outcome.
pub async fn probe_once(client: &BackendClient) -> HealthState {
    match client.health().await {
        Ok(status) => HealthState::from_status(&status),
        Err(err) => {
            warn!(%err, "health check failed");
            HealthState::Error
        }
    }
}

/// Builder for the background liveness probe.
///
/// Call [`spawn`](Self::spawn) to start the repeating task.
pub struct HealthProbe {
    client: BackendClient,
    interval: Duration,
    cancel: CancellationToken,
}

impl HealthProbe {
    /// Construct a probe (does not start it yet).
    #[must_use]
    pub fn new(client: BackendClient, interval: Duration, cancel: CancellationToken) -> Self {
        Self {
            client,
            interval,
            cancel,
        }
    }

    /// Spawn the repeating probe; the first probe runs immediately.
    #[must_use]
    pub fn spawn(self) -> HealthProbeHandle {
        let (tx, _rx) = watch::channel(HealthState::Unknown);
        let tx = Arc::new(tx);
        let cancel_for_handle = self.cancel.clone();

        let join_handle = tokio::spawn(
            Self::run(
                self.client.clone(),
                self.interval,
                Arc::clone(&tx),
                self.cancel,
            )
            .instrument(info_span!("health_probe")),
        );

        HealthProbeHandle {
            client: self.client,
            tx,
            join_handle: Some(join_handle),
            cancel: cancel_for_handle,
        }
    }

    async fn run(
        client: BackendClient,
        period: Duration,
        tx: Arc<watch::Sender<HealthState>>,
        cancel: CancellationToken,
    ) {
        let mut interval = tokio::time::interval(period);
        // A probe slower than the period must not be followed by a burst.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("health probe shutting down");
                    break;
                }
                _ = interval.tick() => {
                    let state = tokio::select! {
                        () = cancel.cancelled() => break,
                        state = probe_once(&client) => state,
                    };
                    publish(&tx, state);
                }
            }
        }
    }
}

fn publish(tx: &watch::Sender<HealthState>, state: HealthState) {
    tx.send_if_modified(|current| {
        if *current == state {
            return false;
        }
        info!(from = ?*current, to = ?state, "health state changed");
        *current = state;
        true
    });
}

/// Handle returned from [`HealthProbe::spawn`].
pub struct HealthProbeHandle {
    client: BackendClient,
    tx: Arc<watch::Sender<HealthState>>,
    /// Task handle for the background probe loop.
    join_handle: Option<JoinHandle<()>>,
    /// Cancelled when the handle is dropped.
    cancel: CancellationToken,
}

impl Drop for HealthProbeHandle {
    /// Stop the background probe when the handle is dropped.
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl HealthProbeHandle {
    /// Most recently published state.
    #[must_use]
    pub fn current(&self) -> HealthState {
        *self.tx.borrow()
    }

    /// Subscribe to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<HealthState> {
        self.tx.subscribe()
    }

    /// Probe once now, publish, and return the result.
    pub async fn check_now(&self) -> HealthState {
        let state = probe_once(&self.client).await;
        publish(&self.tx, state);
        state
    }

    /// Stop the probe and wait for its task to exit.
    pub async fn await_completion(mut self) {
        self.stop().await;
    }

    /// Cancel the probe and wait for its task; later calls return at once.
    pub async fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.join_handle.take() {
            if let Err(err) = handle.await {
                error!(%err, "health probe task failed");
            }
        }
    }
}
