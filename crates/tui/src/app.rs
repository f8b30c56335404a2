//! TUI application state and event loop.

use anyhow::Result;
use crossterm::event::KeyEvent;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use tokio::select;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio_stream::StreamExt;

use sr_protocol::{Event, Op, PipelineState};

use crate::event_handler;
use crate::tui::{Tui, TuiEvent};
use crate::widgets;

/// Main TUI application state.
pub struct App {
    /// Latest authoritative state snapshot from the core.
    pub state: PipelineState,
    /// Topic being typed by the operator.
    pub topic_input: String,
    /// One-line status derived from the most recent event.
    pub status_line: String,
    /// Channel to send operations to the core.
    pub op_tx: UnboundedSender<Op>,
    /// Channel receiving events from the core.
    pub event_rx: UnboundedReceiver<Event>,
    /// Set when the application should exit.
    pub should_exit: bool,
}

impl App {
    pub fn new(op_tx: UnboundedSender<Op>, event_rx: UnboundedReceiver<Event>) -> Self {
        Self {
            state: PipelineState::default(),
            topic_input: String::new(),
            status_line: "type a topic and press Enter".to_string(),
            op_tx,
            event_rx,
            should_exit: false,
        }
    }

    /// Main event loop: core events and keyboard input, redraw after each.
    pub async fn run(&mut self, tui: &mut Tui) -> Result<()> {
        let mut tui_events = tui.event_stream();

        tui.draw(|frame| self.render(frame))?;

        while !self.should_exit {
            select! {
                Some(event) = self.event_rx.recv() => {
                    self.handle_core_event(event);
                }
                Some(tui_event) = tui_events.next() => {
                    match tui_event {
                        TuiEvent::Key(key_event) => self.handle_key_event(key_event),
                        TuiEvent::Resize => {}
                    }
                }
                else => break,
            }
            tui.draw(|frame| self.render(frame))?;
        }

        Ok(())
    }

    fn handle_core_event(&mut self, event: Event) {
        event_handler::handle_core_event(&mut self.state, &mut self.status_line, event);
    }

    fn handle_key_event(&mut self, key_event: KeyEvent) {
        self.should_exit = event_handler::handle_key_event(
            key_event,
            &mut self.topic_input,
            &self.state,
            &self.op_tx,
        );
    }

    /// Render the full frame.
    pub(crate) fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(8),    // body
                Constraint::Length(3), // topic input
                Constraint::Length(1), // status + key hints
            ])
            .split(area);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(28), Constraint::Min(30)])
            .split(rows[0]);

        widgets::dashboard::render(frame, body[0], &self.state);
        self.render_right(frame, body[1]);
        self.render_input(frame, rows[1]);
        self.render_status(frame, rows[2]);
    }

    fn render_right(&self, frame: &mut Frame, area: Rect) {
        let panes = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);

        self.render_logs(frame, panes[0]);
        widgets::script_view::render(frame, panes[1], &self.state);
    }

    fn render_logs(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Log");

        // Show the tail that fits the pane.
        let visible = area.height.saturating_sub(2) as usize;
        let start = self.state.logs.len().saturating_sub(visible);
        let text = if self.state.logs.is_empty() {
            "No log lines yet.".to_string()
        } else {
            self.state.logs[start..].join("\n")
        };

        frame.render_widget(Paragraph::new(text).block(block), area);
    }

    fn render_input(&self, frame: &mut Frame, area: Rect) {
        let title = if self.state.topic.is_empty() {
            "Topic".to_string()
        } else {
            format!("Topic (current run: {})", self.state.topic)
        };
        let block = Block::default().borders(Borders::ALL).title(title);
        let paragraph = Paragraph::new(format!("> {}", self.topic_input))
            .block(block)
            .style(Style::default().fg(Color::Yellow));
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let hints = "Enter start/approve | Tab step mode | Esc cancel | Ctrl+Q quit";
        let text = format!("{} | {hints}", self.status_line);
        frame.render_widget(
            Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
            area,
        );
    }
}
