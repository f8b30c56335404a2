//! Script preview: the timed blocks of the narration stage.

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use sr_protocol::PipelineState;

/// Render the timed script, newest narration first out of view.
pub fn render(frame: &mut Frame, area: Rect, state: &PipelineState) {
    let block = Block::default().borders(Borders::ALL).title("Script");

    let Some(blocks) = state.outputs.blocks() else {
        let placeholder = Paragraph::new("No script yet.").block(block);
        frame.render_widget(placeholder, area);
        return;
    };

    let lines: Vec<Line> = blocks
        .iter()
        .map(|b| {
            Line::from(vec![
                Span::styled(
                    format!("{} ", b.timecode()),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(
                    format!("{:<10} ", b.block_type.as_str()),
                    Style::default().fg(Color::Magenta),
                ),
                Span::raw(b.raw_text.clone()),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
