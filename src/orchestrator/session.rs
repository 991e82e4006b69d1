//! Session orchestrator: the façade the interface layer drives.
//!
//! Construction spawns the health probe and one warm-start recovery attempt.
//! [`SessionOrchestrator::start`] begins a new generation, cancels whatever
//! run was in flight, and spawns a task that feeds the screening stream
//! through the state machine. Observers read state from
//! [`SessionOrchestrator::subscribe`] and
//! [`SessionOrchestrator::subscribe_health`].

use std::sync::{Arc, Mutex, PoisonError};

use futures_util::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::decision_sync::DecisionSync;
use super::health_probe::{HealthProbe, HealthProbeHandle, HealthState};
use super::snapshot::{SessionSnapshot, SharedSession};
use super::state_machine::Flow;
use crate::client::BackendClient;
use crate::config::ClientConfig;
use crate::models::{Decision, DecisionAck};
use crate::Result;

/// Owns one client session: run lifecycle, results, health and decisions.
pub struct SessionOrchestrator {
    client: BackendClient,
    session: SharedSession,
    decisions: DecisionSync,
    health: HealthProbeHandle,
    /// Cancellation token of the run currently in flight.
    active_run: Mutex<Option<CancellationToken>>,
    /// Parent of every token handed to spawned tasks.
    cancel: CancellationToken,
}

impl Drop for SessionOrchestrator {
    /// Stop the active run, the probe and recovery when dropped.
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Handle to one spawned screening run.
#[derive(Debug)]
pub struct RunHandle {
    generation: u64,
    task: JoinHandle<()>,
}

impl RunHandle {
    /// Generation assigned to this run.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Wait for the run task to exit (stream end, error, or supersession).
    pub async fn finished(self) {
        if let Err(err) = self.task.await {
            error!(generation = self.generation, %err, "screening run task failed");
        }
    }
}

impl SessionOrchestrator {
    /// Build a client from `config` and start the orchestrator.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` if the HTTP client cannot be built.
    pub fn connect(config: Arc<ClientConfig>) -> Result<Self> {
        Ok(Self::new(BackendClient::new(config)?))
    }

    /// Start the orchestrator over an existing client.
    ///
    /// Spawns the health probe and the warm-start recovery attempt.
    #[must_use]
    pub fn new(client: BackendClient) -> Self {
        let cancel = CancellationToken::new();
        let session = SharedSession::new();

        let health = HealthProbe::new(
            client.clone(),
            client.config().health_interval(),
            cancel.child_token(),
        )
        .spawn();

        tokio::spawn(
            recover_results(
                client.clone(),
                session.clone(),
                session.generation(),
                cancel.child_token(),
            )
            .instrument(info_span!("warm_start")),
        );

        Self {
            decisions: DecisionSync::new(client.clone(), session.clone()),
            client,
            session,
            health,
            active_run: Mutex::new(None),
            cancel,
        }
    }

    /// Subscribe to session snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.session.subscribe()
    }

    /// Clone the current session snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    /// Wait until warm-start recovery has finished.
    pub async fn wait_ready(&self) -> SessionSnapshot {
        let mut rx = self.session.subscribe();
        let snap = match rx.wait_for(|snap| snap.ready).await {
            Ok(snap) => snap.clone(),
            Err(_) => self.session.snapshot(),
        };
        snap
    }

    /// Most recent health state.
    #[must_use]
    pub fn health(&self) -> HealthState {
        self.health.current()
    }

    /// Subscribe to health state changes.
    #[must_use]
    pub fn subscribe_health(&self) -> watch::Receiver<HealthState> {
        self.health.subscribe()
    }

    /// Probe backend health now, outside the regular schedule.
    pub async fn check_health(&self) -> HealthState {
        self.health.check_now().await
    }

    /// Begin a new screening run, abandoning any run still in flight.
    ///
    /// Results, stage and error are reset before this returns. The stream is
    /// opened and consumed on a spawned task; failures surface as session
    /// state, not as a return value. Must be called from within a tokio
    /// runtime.
    pub fn start(&self) -> RunHandle {
        let run_cancel = self.cancel.child_token();
        let generation = {
            let mut active = self
                .active_run
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let generation = self.session.begin_run();
            if let Some(previous) = active.replace(run_cancel.clone()) {
                previous.cancel();
            }
            generation
        };
        info!(generation, "screening run started");

        let task = tokio::spawn(
            drive_run(
                self.client.clone(),
                self.session.clone(),
                generation,
                run_cancel,
            )
            .instrument(info_span!("screening_run", generation)),
        );

        RunHandle { generation, task }
    }

    /// Select the candidate shown in detail views.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` when the candidate is not in the current
    /// results.
    pub fn select_candidate(&self, candidate_id: &str) -> Result<()> {
        let mut outcome = Ok(());
        self.session.update(|snap| {
            outcome = snap.store.select_candidate(candidate_id);
            outcome.is_ok()
        });
        outcome
    }

    /// Submit a human decision; see [`DecisionSync::submit`].
    ///
    /// # Errors
    ///
    /// Returns `AppError::DecisionSubmission` when the backend write fails.
    pub async fn submit_decision(
        &self,
        candidate_id: &str,
        decision: Decision,
        notes: Option<String>,
    ) -> Result<DecisionAck> {
        self.decisions.submit(candidate_id, decision, notes).await
    }

    /// Cancel the active run and the health probe, then wait for the probe.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        self.health.stop().await;
        info!("session orchestrator shut down");
    }
}

/// Fetch stored results once and commit them as a completed run.
///
/// Skipped when a run newer than `generation` has started in the meantime.
/// Marks the session ready whatever the outcome.
async fn recover_results(
    client: BackendClient,
    session: SharedSession,
    generation: u64,
    cancel: CancellationToken,
) {
    let fetched = tokio::select! {
        () = cancel.cancelled() => None,
        fetched = client.fetch_results() => Some(fetched),
    };

    match fetched {
        Some(Ok(results)) if !results.is_empty() => {
            let candidates = results.ranking.len();
            let applied = session.update_if_current(generation, |snap| {
                snap.store.set_results(results);
                snap.machine.restore_completed();
            });
            if applied {
                info!(candidates, "recovered stored results");
            } else {
                debug!("a run started before recovery finished, discarding stored results");
            }
        }
        Some(Ok(_)) => debug!("no stored results to recover"),
        Some(Err(err)) => warn!(%err, "failed to fetch existing results"),
        None => debug!("recovery cancelled"),
    }

    session.update(|snap| {
        let changed = !snap.ready;
        snap.ready = true;
        changed
    });
}

/// Consume one screening stream for `generation` until it ends, fails, or
/// is superseded.
async fn drive_run(
    client: BackendClient,
    session: SharedSession,
    generation: u64,
    cancel: CancellationToken,
) {
    let opened = tokio::select! {
        biased;
        () = cancel.cancelled() => {
            debug!("run superseded before the stream opened");
            return;
        }
        opened = client.open_stream() => opened,
    };

    let records = match opened {
        Ok(records) => records,
        Err(err) => {
            warn!(%err, "screening stream could not be opened");
            session.update_if_current(generation, |snap| snap.machine.fail(err));
            return;
        }
    };
    tokio::pin!(records);

    loop {
        let item = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("run superseded, abandoning stream");
                return;
            }
            item = records.next() => item,
        };

        match item {
            Some(Ok(record)) => {
                let mut flow = Flow::Halt;
                let current = session.update_if_current(generation, |snap| {
                    flow = snap.machine.apply(record, &mut snap.store);
                });
                if !current {
                    debug!("run superseded, dropping record");
                    return;
                }
                if flow == Flow::Halt {
                    debug!("ignoring the remainder of the stream");
                    return;
                }
            }
            Some(Err(err)) => {
                warn!(%err, "screening stream failed");
                session.update_if_current(generation, |snap| snap.machine.fail(err));
                return;
            }
            None => {
                session.update_if_current(generation, |snap| snap.machine.finish());
                return;
            }
        }
    }
}
