//! Event handling for the TUI.
//!
//! Core events replace the local state snapshot; keyboard events map to
//! `Op`s. Both directions are pure functions so they stay testable
//! without a terminal.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc::UnboundedSender;

use sr_protocol::{ApprovalStatus, Event, Op, PipelineState};

/// Apply one core event to the UI's view of the pipeline.
pub fn handle_core_event(state: &mut PipelineState, status_line: &mut String, event: Event) {
    match event {
        Event::StateChanged { state: snapshot, .. } => {
            *state = snapshot;
        }
        Event::RunStarted { topic, .. } => {
            *status_line = format!("running: {topic}");
        }
        Event::RunLog { line, .. } => {
            *status_line = line;
        }
        Event::ApprovalRequested { stage, .. } => {
            *status_line = format!("{stage} finished. Enter approves, Esc cancels");
        }
        Event::RunCompleted { history, .. } => {
            *status_line = match history {
                Some(item) => format!("run completed, saved to history as {}", item.id),
                None => "run finished".to_string(),
            };
        }
        Event::RunFailed { error, .. } => {
            *status_line = format!("run failed: {error}");
        }
    }
}

/// Map one keyboard event to operations.
///
/// Returns `true` when the application should exit.
pub fn handle_key_event(
    key_event: KeyEvent,
    topic_input: &mut String,
    state: &PipelineState,
    op_tx: &UnboundedSender<Op>,
) -> bool {
    if key_event.kind != KeyEventKind::Press {
        return false;
    }

    match key_event.code {
        KeyCode::Char('q') | KeyCode::Char('c')
            if key_event.modifiers.contains(KeyModifiers::CONTROL) =>
        {
            let _ = op_tx.send(Op::Shutdown);
            return true;
        }
        KeyCode::Tab => {
            let _ = op_tx.send(Op::SetStepMode {
                enabled: !state.step_mode,
            });
        }
        KeyCode::Esc => {
            let _ = op_tx.send(Op::CancelPipeline);
        }
        KeyCode::Enter => {
            if state.approval == ApprovalStatus::WaitingForApproval {
                let _ = op_tx.send(Op::ApproveStage {
                    edited_output: None,
                });
            } else if !topic_input.trim().is_empty() {
                let _ = op_tx.send(Op::StartPipeline {
                    topic: topic_input.trim().to_string(),
                });
                topic_input.clear();
            }
        }
        KeyCode::Backspace => {
            topic_input.pop();
        }
        KeyCode::Char(c) => {
            topic_input.push(c);
        }
        _ => {}
    }

    false
}
