//! UI ↔ core communication protocol.
//!
//! The protocol follows an Operation/Event pattern:
//! - `Op`: commands sent from a front-end to the core
//! - `Event`: updates sent from the core to front-ends
//!
//! Communication is asynchronous and channel-based; the orchestrator
//! remains responsive to `Op`s (notably `CancelPipeline`) while a stage is
//! in flight or the run is suspended for approval.
//!
//! Uses tagged enum serialization for TypeScript compatibility:
//! ```json
//! {
//!   "type": "startPipeline",
//!   "payload": { "topic": "Why this port went silent" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::history_models::HistoryItem;
use crate::stage_models::{PipelineState, Stage};

/// Operations sent from the UI to the core.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Op {
    /// Start a new run for the given topic.
    ///
    /// Implicitly cancels any run that is still active.
    StartPipeline { topic: String },

    /// Approve the stage the run is suspended on.
    ///
    /// In step mode the operator may substitute an edited version of the
    /// stage's output as the actual input to the next stage.
    ApproveStage { edited_output: Option<String> },

    /// Cancel the active run. Idempotent; a no-op when nothing is running.
    CancelPipeline,

    /// Toggle step mode for subsequent stage boundaries.
    SetStepMode { enabled: bool },

    /// Shut down the application gracefully.
    Shutdown,
}

/// Events sent from the core to the UI.
///
/// Every event carries the id of the run it belongs to so a front-end can
/// discard updates from a superseded run.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// A new run has started.
    RunStarted {
        #[ts(type = "string")]
        run_id: Uuid,
        topic: String,
    },

    /// An operator-visible log line was appended.
    RunLog {
        #[ts(type = "string")]
        run_id: Uuid,
        line: String,
    },

    /// The authoritative pipeline state changed; a full snapshot.
    StateChanged {
        #[ts(type = "string")]
        run_id: Uuid,
        state: PipelineState,
    },

    /// The run is suspended after `stage` and waits for `ApproveStage`.
    ApprovalRequested {
        #[ts(type = "string")]
        run_id: Uuid,
        stage: Stage,
    },

    /// The run reached `Completed`, either normally (with the saved
    /// history item, if a store is configured) or via operator cancel.
    RunCompleted {
        #[ts(type = "string")]
        run_id: Uuid,
        history: Option<HistoryItem>,
    },

    /// The run failed at `stage` with a one-line reason.
    RunFailed {
        #[ts(type = "string")]
        run_id: Uuid,
        stage: Option<Stage>,
        error: String,
    },
}
