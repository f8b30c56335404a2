//! Pipeline state transitions.
//!
//! Every mutation of [`PipelineState`] goes through one of these
//! functions; nothing else writes the state. They are synchronous and
//! pure so each transition is testable on its own, and so the invariants
//! hold by construction:
//!
//! - `is_processing` and `WaitingForApproval` are mutually exclusive
//! - stage outputs are recorded strictly in pipeline order
//! - terminal phases clear the processing and approval flags

use sr_protocol::{
    ApprovalStatus, PipelinePhase, PipelineState, Stage, StageOutput, StageOutputs, MAX_LOG_LINES,
};

/// Append an operator-visible log line, dropping the oldest beyond the cap.
pub fn push_log(state: &mut PipelineState, line: impl Into<String>) {
    state.logs.push(line.into());
    if state.logs.len() > MAX_LOG_LINES {
        let excess = state.logs.len() - MAX_LOG_LINES;
        state.logs.drain(..excess);
    }
}

/// Reset the state for a fresh run of `topic`.
///
/// Clears all prior stage outputs, logs and error; keeps step mode.
pub fn begin_run(state: &mut PipelineState, topic: &str) {
    state.phase = PipelinePhase::Idle;
    state.is_processing = false;
    state.approval = ApprovalStatus::Idle;
    state.topic = topic.to_string();
    state.outputs = StageOutputs::default();
    state.logs = Vec::new();
    state.last_error = None;
}

/// Enter a stage: the stage's external call is about to start.
pub fn enter_stage(state: &mut PipelineState, stage: Stage) {
    state.phase = PipelinePhase::Stage(stage);
    state.is_processing = true;
    state.approval = ApprovalStatus::Idle;
}

/// Record a stage's validated output.
pub fn record_output(state: &mut PipelineState, output: StageOutput) {
    state.outputs.record(output);
    debug_assert!(state.outputs.completed_in_order());
}

/// Suspend for operator approval after the current stage.
pub fn await_approval(state: &mut PipelineState) {
    state.is_processing = false;
    state.approval = ApprovalStatus::WaitingForApproval;
}

/// The operator approved; the next stage is about to be entered.
pub fn resume_processing(state: &mut PipelineState) {
    state.approval = ApprovalStatus::Processing;
}

/// The final stage finished; the run is complete.
pub fn complete_run(state: &mut PipelineState) {
    state.phase = PipelinePhase::Completed;
    state.is_processing = false;
    state.approval = ApprovalStatus::Idle;
}

/// A stage failed; record one human-readable message and halt.
pub fn fail_run(state: &mut PipelineState, error: &str) {
    state.phase = PipelinePhase::Failed;
    state.is_processing = false;
    state.approval = ApprovalStatus::Idle;
    state.last_error = Some(error.to_string());
}

/// The operator cancelled; cancellation is a clean stop, not a failure.
pub fn cancel_run(state: &mut PipelineState) {
    state.phase = PipelinePhase::Completed;
    state.is_processing = false;
    state.approval = ApprovalStatus::Idle;
}

#[cfg(test)]
mod tests {
    use super::*;
    use sr_protocol::TopicSuggestion;

    fn suggestion() -> TopicSuggestion {
        TopicSuggestion {
            title: "T".to_string(),
            hook: "H".to_string(),
            viral_factor: "Fear/FOMO".to_string(),
        }
    }

    #[test]
    fn test_begin_run_clears_prior_run() {
        let mut state = PipelineState::new(true);
        state.topic = "old".to_string();
        state.last_error = Some("boom".to_string());
        push_log(&mut state, "old line");
        record_output(
            &mut state,
            StageOutput::Scout {
                suggestions: vec![suggestion()],
            },
        );

        begin_run(&mut state, "new topic");

        assert_eq!(state.phase, PipelinePhase::Idle);
        assert_eq!(state.topic, "new topic");
        assert!(state.logs.is_empty());
        assert!(state.last_error.is_none());
        assert!(!state.outputs.contains(Stage::Scout));
        // Step mode survives the reset.
        assert!(state.step_mode);
    }

    #[test]
    fn test_enter_stage_sets_processing() {
        let mut state = PipelineState::default();
        enter_stage(&mut state, Stage::Scout);
        assert_eq!(state.phase, PipelinePhase::Stage(Stage::Scout));
        assert!(state.is_processing);
        assert_eq!(state.approval, ApprovalStatus::Idle);
    }

    #[test]
    fn test_waiting_excludes_processing() {
        let mut state = PipelineState::new(true);
        enter_stage(&mut state, Stage::Scout);
        await_approval(&mut state);
        assert!(!state.is_processing);
        assert_eq!(state.approval, ApprovalStatus::WaitingForApproval);

        resume_processing(&mut state);
        assert_eq!(state.approval, ApprovalStatus::Processing);

        enter_stage(&mut state, Stage::Decode);
        assert!(state.is_processing);
        assert_eq!(state.approval, ApprovalStatus::Idle);
    }

    #[test]
    fn test_complete_run_is_terminal_and_quiet() {
        let mut state = PipelineState::default();
        enter_stage(&mut state, Stage::Narrate);
        complete_run(&mut state);
        assert_eq!(state.phase, PipelinePhase::Completed);
        assert!(!state.is_processing);
        assert_eq!(state.approval, ApprovalStatus::Idle);
        assert!(state.last_error.is_none());
    }

    #[test]
    fn test_fail_run_records_single_message() {
        let mut state = PipelineState::default();
        enter_stage(&mut state, Stage::Decode);
        fail_run(&mut state, "decode stage call failed after 4 attempt(s)");
        assert_eq!(state.phase, PipelinePhase::Failed);
        assert!(!state.is_processing);
        assert_eq!(
            state.last_error.as_deref(),
            Some("decode stage call failed after 4 attempt(s)")
        );
    }

    #[test]
    fn test_cancel_run_completes_without_error() {
        let mut state = PipelineState::new(true);
        enter_stage(&mut state, Stage::Research);
        await_approval(&mut state);
        cancel_run(&mut state);
        assert_eq!(state.phase, PipelinePhase::Completed);
        assert_eq!(state.approval, ApprovalStatus::Idle);
        assert!(state.last_error.is_none());
    }

    #[test]
    fn test_log_cap() {
        let mut state = PipelineState::default();
        for i in 0..(MAX_LOG_LINES + 25) {
            push_log(&mut state, format!("line {i}"));
        }
        assert_eq!(state.logs.len(), MAX_LOG_LINES);
        assert_eq!(state.logs[0], "line 25");
        assert_eq!(
            state.logs.last().map(String::as_str),
            Some(format!("line {}", MAX_LOG_LINES + 24).as_str())
        );
    }
}
