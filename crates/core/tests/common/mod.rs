//! Shared harness for orchestrator integration tests.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use sr_core::agents::{AgentRoster, MockBackend};
use sr_core::engine::{RetryPolicy, StageRunner};
use sr_core::history::HistoryStore;
use sr_core::state::Orchestrator;
use sr_core::timing::TimingConfig;
use sr_protocol::{Event, Stage};

pub struct Harness {
    pub orchestrator: Orchestrator,
    pub events: mpsc::UnboundedReceiver<Event>,
    /// Clone of the backend handed to the runner; shares the request log.
    pub backend: MockBackend,
}

#[allow(dead_code)]
pub fn harness(
    backend: MockBackend,
    history: Arc<dyn HistoryStore>,
    retry: RetryPolicy,
) -> Harness {
    let recorder = backend.clone();
    let runner = StageRunner::new(
        Arc::new(backend),
        AgentRoster::builtin("mock-model").expect("builtin roster"),
        retry,
        TimingConfig::default(),
    );
    let (events_tx, events) = mpsc::unbounded_channel();
    let orchestrator = Orchestrator::new(Arc::new(runner), history, "mock-model", events_tx);
    Harness {
        orchestrator,
        events,
        backend: recorder,
    }
}

/// Receive events until the run reaches a terminal event.
#[allow(dead_code)]
pub async fn wait_for_terminal(events: &mut mpsc::UnboundedReceiver<Event>) -> Vec<Event> {
    let mut seen = Vec::new();
    loop {
        let event = recv(events).await;
        let terminal = matches!(event, Event::RunCompleted { .. } | Event::RunFailed { .. });
        seen.push(event);
        if terminal {
            return seen;
        }
    }
}

/// Receive events until the run suspends for approval; returns the stage.
#[allow(dead_code)]
pub async fn wait_for_approval_request(events: &mut mpsc::UnboundedReceiver<Event>) -> Stage {
    loop {
        match recv(events).await {
            Event::ApprovalRequested { stage, .. } => return stage,
            Event::RunFailed { error, .. } => panic!("run failed while waiting: {error}"),
            _ => {}
        }
    }
}

#[allow(dead_code)]
pub async fn recv(events: &mut mpsc::UnboundedReceiver<Event>) -> Event {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("event channel closed")
}

/// Stages the backend has served so far, in order.
#[allow(dead_code)]
pub fn called_stages(backend: &MockBackend) -> Vec<Stage> {
    backend
        .recorded_requests()
        .iter()
        .map(|request| request.stage)
        .collect()
}
