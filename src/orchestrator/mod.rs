//! Session orchestration modules.
//!
//! Covers the run state machine, the result store, decision write-through,
//! backend liveness probing, and the orchestrator façade that wires them
//! together.

pub mod decision_sync;
pub mod health_probe;
pub mod result_store;
pub mod session;
pub mod snapshot;
pub mod state_machine;

pub use decision_sync::DecisionSync;
pub use health_probe::{HealthProbe, HealthProbeHandle, HealthState};
pub use result_store::ResultStore;
pub use session::{RunHandle, SessionOrchestrator};
pub use snapshot::{SessionSnapshot, SharedSession};
pub use state_machine::{Flow, SessionState, SessionStateMachine};
