//! # sr-tui
//!
//! Terminal front-end for showrunner. Renders the pipeline state and
//! forwards operator commands to the core via the `Op`/`Event` protocol
//! from `sr-protocol`.

pub mod app;
pub mod event_handler;
pub mod tui;
pub mod widgets;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;

use sr_core::agents::{backend_from_config, AgentRoster};
use sr_core::engine::{RetryPolicy, StageRunner};
use sr_core::history::{HistoryStore, JsonHistoryStore, NoopHistoryStore};
use sr_core::state::Orchestrator;
use sr_protocol::Op;

pub use app::App;
pub use tui::Tui;

/// Wire the orchestrator to a fresh TUI and run until the operator quits.
pub async fn run_app() -> Result<()> {
    let config = sr_core::config::load_config(Path::new("."))?;

    let model_id = config.global.generation.default_model.clone();
    let backend = backend_from_config(&config.global.generation);
    let roster = AgentRoster::builtin(model_id.clone())?.with_overrides(config.agents)?;
    let retry = RetryPolicy::new(
        config.global.retry.max_retries,
        Duration::from_millis(config.global.retry.base_delay_ms),
    );
    let runner = StageRunner::new(backend, roster, retry, config.global.timing);

    let history: Arc<dyn HistoryStore> = match config.global.history.dir {
        Some(dir) => Arc::new(JsonHistoryStore::new(dir)),
        None => Arc::new(NoopHistoryStore),
    };

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (op_tx, mut op_rx) = mpsc::unbounded_channel();
    let orchestrator = Orchestrator::new(Arc::new(runner), history, model_id, events_tx);

    // Op dispatch loop: the UI stays decoupled from the orchestrator.
    tokio::spawn(async move {
        while let Some(op) = op_rx.recv().await {
            let shutdown = matches!(op, Op::Shutdown);
            orchestrator.handle_op(op).await;
            if shutdown {
                break;
            }
        }
    });

    let mut tui = Tui::init()?;
    let mut app = App::new(op_tx, events_rx);
    let result = app.run(&mut tui).await;
    tui.restore()?;
    result
}
