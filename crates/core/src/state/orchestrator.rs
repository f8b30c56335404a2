//! Pipeline orchestrator.
//!
//! Drives the ordered stage sequence for one run at a time, owns the
//! authoritative [`PipelineState`], and stays responsive to operator
//! commands while a stage is in flight or the run is suspended for
//! approval.
//!
//! Concurrency model: one spawned task per run. The task never mutates
//! state directly; every completion is applied through a guard that
//! checks the run-generation counter, so a result from a cancelled or
//! superseded run is discarded instead of clobbering the new state. The
//! step-mode suspension is an explicit continuation (a oneshot sender
//! held in the active-run record) resolved by `approve` or dropped by
//! `cancel`.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tracing::warn;
use uuid::Uuid;

use sr_protocol::{
    format_timecode, Event, Op, PipelineState, ScriptBlock, Stage, StageOutput,
};

use crate::engine::StageRunner;
use crate::error::PipelineError;
use crate::history::HistoryStore;
use crate::state::run;
use crate::timing::TimingEstimator;

/// The operator's decision at a step-mode boundary.
#[derive(Debug)]
pub struct ApprovalDecision {
    /// Replacement for the stage's rendered output, if the operator
    /// edited it before approving.
    pub edited_output: Option<String>,
}

struct ActiveRun {
    run_id: Uuid,
    seq: u64,
    cancel_tx: watch::Sender<bool>,
    /// Continuation held while the run is suspended for approval.
    approval_tx: Option<oneshot::Sender<ApprovalDecision>>,
}

struct Inner {
    state: PipelineState,
    /// Run-generation counter; bumped on every `start`.
    seq: u64,
    active: Option<ActiveRun>,
}

/// The single pipeline instance behind all front-ends.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Mutex<Inner>>,
    events_tx: mpsc::UnboundedSender<Event>,
    runner: Arc<StageRunner>,
    history: Arc<dyn HistoryStore>,
    model_id: String,
}

impl Orchestrator {
    pub fn new(
        runner: Arc<StageRunner>,
        history: Arc<dyn HistoryStore>,
        model_id: impl Into<String>,
        events_tx: mpsc::UnboundedSender<Event>,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: PipelineState::default(),
                seq: 0,
                active: None,
            })),
            events_tx,
            runner,
            history,
            model_id: model_id.into(),
        }
    }

    /// A snapshot of the authoritative state.
    pub async fn state(&self) -> PipelineState {
        self.inner.lock().await.state.clone()
    }

    /// Dispatch one front-end operation.
    pub async fn handle_op(&self, op: Op) {
        match op {
            Op::StartPipeline { topic } => {
                self.start(topic).await;
            }
            Op::ApproveStage { edited_output } => {
                self.approve(edited_output).await;
            }
            Op::CancelPipeline | Op::Shutdown => {
                self.cancel().await;
            }
            Op::SetStepMode { enabled } => self.set_step_mode(enabled).await,
        }
    }

    /// Toggle step mode; affects subsequent stage boundaries.
    pub async fn set_step_mode(&self, enabled: bool) {
        let mut inner = self.inner.lock().await;
        inner.state.step_mode = enabled;
        if let Some(run_id) = inner.active.as_ref().map(|a| a.run_id) {
            self.publish(&inner, run_id);
        }
    }

    /// Start a new run, implicitly cancelling any active one.
    pub async fn start(&self, topic: impl Into<String>) -> Uuid {
        let topic = topic.into();
        let (run_id, seq, cancel_rx) = {
            let mut inner = self.inner.lock().await;

            if let Some(previous) = inner.active.take() {
                let _ = previous.cancel_tx.send(true);
                self.emit(Event::RunCompleted {
                    run_id: previous.run_id,
                    history: None,
                });
            }

            inner.seq += 1;
            let seq = inner.seq;
            let run_id = Uuid::new_v4();
            run::begin_run(&mut inner.state, &topic);
            run::push_log(
                &mut inner.state,
                format!("[orchestrator] starting pipeline for \"{topic}\""),
            );

            let (cancel_tx, cancel_rx) = watch::channel(false);
            inner.active = Some(ActiveRun {
                run_id,
                seq,
                cancel_tx,
                approval_tx: None,
            });
            self.publish(&inner, run_id);
            (run_id, seq, cancel_rx)
        };

        self.emit(Event::RunStarted {
            run_id,
            topic: topic.clone(),
        });

        let orchestrator = self.clone();
        tokio::spawn(async move {
            orchestrator.run_loop(run_id, seq, topic, cancel_rx).await;
        });

        run_id
    }

    /// Resolve the step-mode suspension.
    ///
    /// Returns false when no run is waiting for approval.
    pub async fn approve(&self, edited_output: Option<String>) -> bool {
        let (run_id, line) = {
            let mut inner = self.inner.lock().await;
            let pending = inner.active.as_mut().and_then(|active| {
                let tx = active.approval_tx.take()?;
                Some((active.run_id, tx))
            });
            let Some((run_id, tx)) = pending else {
                return false;
            };

            if tx.send(ApprovalDecision { edited_output }).is_err() {
                return false;
            }

            run::resume_processing(&mut inner.state);
            let line = "[orchestrator] stage approved by operator".to_string();
            run::push_log(&mut inner.state, line.clone());
            self.publish(&inner, run_id);
            (run_id, line)
        };
        self.emit(Event::RunLog { run_id, line });
        true
    }

    /// Cancel the active run.
    ///
    /// Idempotent: returns false when nothing is running. Aborts the
    /// in-flight stage call, drops any pending approval continuation and
    /// completes the run with a "stopped by operator" line; cancellation
    /// is never treated as failure.
    pub async fn cancel(&self) -> bool {
        let (run_id, line) = {
            let mut inner = self.inner.lock().await;
            let Some(active) = inner.active.take() else {
                return false;
            };
            let run_id = active.run_id;
            let _ = active.cancel_tx.send(true);
            drop(active);

            run::cancel_run(&mut inner.state);
            let line = "[orchestrator] stopped by operator".to_string();
            run::push_log(&mut inner.state, line.clone());
            self.publish(&inner, run_id);
            (run_id, line)
        };
        self.emit(Event::RunLog { run_id, line });
        self.emit(Event::RunCompleted {
            run_id,
            history: None,
        });
        true
    }

    async fn run_loop(
        self,
        run_id: Uuid,
        seq: u64,
        topic: String,
        mut cancel_rx: watch::Receiver<bool>,
    ) {
        let mut carry = String::new();

        for stage in Stage::PIPELINE {
            let description = self.runner.roster().agent(stage).description.clone();
            if self
                .with_run(seq, |state| run::enter_stage(state, stage))
                .await
                .is_none()
            {
                return;
            }
            self.log_run(seq, run_id, format!("[{stage}] {description}")).await;

            let outcome = tokio::select! {
                biased;
                _ = cancel_rx.changed() => Err(PipelineError::Cancelled),
                result = self.runner.run(stage, &topic, &carry) => result,
            };

            let output = match outcome {
                Ok(output) => output,
                // cancel() has already transitioned the state; the
                // superseded call result is discarded unseen.
                Err(error) if error.is_cancellation() => return,
                Err(error) => {
                    let message = error.to_string();
                    let line = format!("[{stage}] failed: {message}");
                    if self
                        .finish_run(seq, |state| {
                            run::fail_run(state, &message);
                            run::push_log(state, line.clone());
                        })
                        .await
                        .is_some()
                    {
                        self.emit(Event::RunLog { run_id, line });
                        self.emit(Event::RunFailed {
                            run_id,
                            stage: Some(stage),
                            error: message,
                        });
                    }
                    return;
                }
            };

            let rendered = output.render_for_next_stage();
            let completion_note = match &output {
                StageOutput::Narrate { blocks } => {
                    format!("[{stage}] completed: {} timed blocks", blocks.len())
                }
                _ => format!("[{stage}] completed"),
            };
            if self
                .with_run(seq, |state| run::record_output(state, output))
                .await
                .is_none()
            {
                return;
            }
            self.log_run(seq, run_id, completion_note).await;

            if stage.is_final() {
                break;
            }

            match self.approval_gate(seq, run_id, stage).await {
                Gate::Continue => carry = rendered,
                Gate::Suspended(rx) => {
                    self.emit(Event::ApprovalRequested { run_id, stage });
                    match rx.await {
                        Ok(decision) => {
                            carry = decision.edited_output.unwrap_or(rendered);
                        }
                        // Continuation dropped: cancelled or superseded.
                        Err(_) => return,
                    }
                }
                Gate::Gone => return,
            }
        }

        self.complete(run_id, seq, &topic).await;
    }

    /// Decide what happens at a stage boundary.
    async fn approval_gate(
        &self,
        seq: u64,
        run_id: Uuid,
        stage: Stage,
    ) -> Gate {
        let mut inner = self.inner.lock().await;
        if !inner.active.as_ref().is_some_and(|a| a.seq == seq) {
            return Gate::Gone;
        }
        if !inner.state.step_mode {
            return Gate::Continue;
        }

        let (tx, rx) = oneshot::channel();
        if let Some(active) = inner.active.as_mut() {
            active.approval_tx = Some(tx);
        }
        run::await_approval(&mut inner.state);
        run::push_log(
            &mut inner.state,
            format!("[{stage}] waiting for operator approval"),
        );
        self.publish(&inner, run_id);
        Gate::Suspended(rx)
    }

    async fn complete(&self, run_id: Uuid, seq: u64, topic: &str) {
        let blocks: Vec<ScriptBlock> = {
            let inner = self.inner.lock().await;
            if !inner.active.as_ref().is_some_and(|a| a.seq == seq) {
                return;
            }
            inner
                .state
                .outputs
                .blocks()
                .map(|blocks| blocks.to_vec())
                .unwrap_or_default()
        };

        let total = TimingEstimator::total_duration_secs(&blocks);
        let line = format!(
            "[orchestrator] run completed: {} blocks, {} total",
            blocks.len(),
            format_timecode(total)
        );
        if self
            .finish_run(seq, |state| {
                run::complete_run(state);
                run::push_log(state, line.clone());
            })
            .await
            .is_none()
        {
            return;
        }
        self.emit(Event::RunLog {
            run_id,
            line,
        });

        let history = match self
            .history
            .save(topic, &self.model_id, &blocks)
            .await
        {
            Ok(item) => item,
            Err(error) => {
                warn!(error = %error, "failed to save run history");
                None
            }
        };
        self.emit(Event::RunCompleted { run_id, history });
    }

    /// Apply a transition if `seq` still names the active run.
    async fn with_run<R>(&self, seq: u64, f: impl FnOnce(&mut PipelineState) -> R) -> Option<R> {
        let mut inner = self.inner.lock().await;
        let run_id = match &inner.active {
            Some(active) if active.seq == seq => active.run_id,
            _ => return None,
        };
        let result = f(&mut inner.state);
        self.publish(&inner, run_id);
        Some(result)
    }

    /// Like [`Self::with_run`], but also retires the active run record.
    async fn finish_run<R>(&self, seq: u64, f: impl FnOnce(&mut PipelineState) -> R) -> Option<R> {
        let mut inner = self.inner.lock().await;
        let run_id = match &inner.active {
            Some(active) if active.seq == seq => active.run_id,
            _ => return None,
        };
        let result = f(&mut inner.state);
        inner.active = None;
        self.publish(&inner, run_id);
        Some(result)
    }

    async fn log_run(&self, seq: u64, run_id: Uuid, line: String) {
        if self
            .with_run(seq, |state| run::push_log(state, line.clone()))
            .await
            .is_some()
        {
            self.emit(Event::RunLog { run_id, line });
        }
    }

    fn publish(&self, inner: &Inner, run_id: Uuid) {
        self.emit(Event::StateChanged {
            run_id,
            state: inner.state.clone(),
        });
    }

    fn emit(&self, event: Event) {
        let _ = self.events_tx.send(event);
    }
}

enum Gate {
    /// Normal mode: enter the next stage immediately.
    Continue,
    /// Step mode: suspended until the continuation resolves.
    Suspended(oneshot::Receiver<ApprovalDecision>),
    /// The run was superseded while reaching the boundary.
    Gone,
}
