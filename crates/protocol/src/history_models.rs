//! Persisted run records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::script_models::ScriptBlock;

/// One completed run as handed to the history store.
///
/// The orchestrator constructs exactly one of these per completed run; it
/// never reads history back into pipeline state.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    #[ts(type = "string")]
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// The topic the run was started with.
    pub topic: String,
    /// The model that produced the narration.
    pub model_id: String,
    /// The timed script, in block order.
    pub blocks: Vec<ScriptBlock>,
}
