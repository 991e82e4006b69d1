//! Observable session snapshot and its single write path.
//!
//! Every mutation of session state goes through [`SharedSession`], which
//! wraps a [`watch::Sender`]. Mutations tagged with a run generation are
//! applied only while that generation is still current; the check and the
//! write happen under the same channel lock, so a superseded run can never
//! interleave a write after a newer run has begun.

use std::sync::Arc;

use tokio::sync::watch;

use super::result_store::ResultStore;
use super::state_machine::SessionStateMachine;

/// Point-in-time view of the session, as seen by observers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    /// Generation of the most recent `start()`; `0` before the first run.
    pub generation: u64,
    /// Set once the warm-start recovery attempt has finished.
    pub ready: bool,
    /// Run lifecycle, stage and error.
    pub machine: SessionStateMachine,
    /// Committed results and selection.
    pub store: ResultStore,
}

/// Cloneable handle to the session's watch channel.
#[derive(Debug, Clone)]
pub struct SharedSession {
    tx: Arc<watch::Sender<SessionSnapshot>>,
}

impl Default for SharedSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedSession {
    /// Create a session in its initial idle, not-ready state.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot::default());
        Self { tx: Arc::new(tx) }
    }

    /// Subscribe to snapshot changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    /// Clone the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    /// Current generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.tx.borrow().generation
    }

    /// Start a new generation: bump the counter, clear results, and put the
    /// machine into `Running`. Returns the new generation.
    pub fn begin_run(&self) -> u64 {
        let mut generation = 0;
        self.tx.send_modify(|snap| {
            snap.generation += 1;
            generation = snap.generation;
            snap.store.clear();
            snap.machine.begin();
        });
        generation
    }

    /// Apply `f` only if `generation` is still current.
    ///
    /// Returns `false` when the generation has been superseded, in which
    /// case nothing is written and observers are not notified.
    pub fn update_if_current<F>(&self, generation: u64, f: F) -> bool
    where
        F: FnOnce(&mut SessionSnapshot),
    {
        self.tx.send_if_modified(|snap| {
            if snap.generation != generation {
                return false;
            }
            f(snap);
            true
        })
    }

    /// Apply `f` regardless of generation; observers are notified only when
    /// `f` returns `true`.
    pub fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut SessionSnapshot) -> bool,
    {
        self.tx.send_if_modified(f)
    }
}
