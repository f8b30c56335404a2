//! Stage dashboard: the five-stage chain with per-stage status.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use sr_protocol::{ApprovalStatus, PipelinePhase, PipelineState, Stage};

/// Render the stage list with status markers.
pub fn render(frame: &mut Frame, area: Rect, state: &PipelineState) {
    let mut lines: Vec<Line> = Vec::with_capacity(Stage::PIPELINE.len() + 2);

    for stage in Stage::PIPELINE {
        lines.push(stage_line(state, stage));
    }

    lines.push(Line::raw(""));
    lines.push(summary_line(state));

    let mode = if state.step_mode { "step" } else { "auto" };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Pipeline [{mode}]"));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn stage_line(state: &PipelineState, stage: Stage) -> Line<'static> {
    let is_current = state.phase.stage() == Some(stage);
    let done = state.outputs.contains(stage);

    let (marker, style) = if done {
        ("[x]", Style::default().fg(Color::Green))
    } else if is_current && state.approval == ApprovalStatus::WaitingForApproval {
        ("[?]", Style::default().fg(Color::Yellow))
    } else if is_current {
        ("[>]", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
    } else {
        ("[ ]", Style::default().fg(Color::DarkGray))
    };

    Line::from(vec![
        Span::styled(format!("{marker} "), style),
        Span::styled(stage.name().to_string(), style),
    ])
}

fn summary_line(state: &PipelineState) -> Line<'static> {
    let text = match state.phase {
        PipelinePhase::Idle => "idle".to_string(),
        PipelinePhase::Stage(stage) if state.approval == ApprovalStatus::WaitingForApproval => {
            format!("waiting for approval after {stage}")
        }
        PipelinePhase::Stage(stage) => format!("running {stage}"),
        PipelinePhase::Completed => "completed".to_string(),
        PipelinePhase::Failed => state
            .last_error
            .clone()
            .unwrap_or_else(|| "failed".to_string()),
    };
    let color = match state.phase {
        PipelinePhase::Failed => Color::Red,
        PipelinePhase::Completed => Color::Green,
        _ => Color::White,
    };
    Line::from(Span::styled(text, Style::default().fg(color)))
}
