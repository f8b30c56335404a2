//! Terminal initialization and event plumbing.
//!
//! Wraps ratatui's terminal with raw-mode setup, a panic hook that
//! restores the screen, and an async stream of input events.

use std::io::{stdout, Stdout};
use std::pin::Pin;

use anyhow::Result;
use crossterm::event::{Event, KeyEvent};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio_stream::{Stream, StreamExt};

/// Type alias for the terminal backend in use.
pub type TerminalBackend = CrosstermBackend<Stdout>;

/// Input events surfaced to the application loop.
#[derive(Debug)]
pub enum TuiEvent {
    /// Keyboard input.
    Key(KeyEvent),
    /// The terminal was resized; redraw.
    Resize,
}

/// Terminal wrapper owning raw mode for its lifetime.
pub struct Tui {
    terminal: Terminal<TerminalBackend>,
}

impl Tui {
    /// Enter raw mode and the alternate screen.
    pub fn init() -> Result<Self> {
        enable_raw_mode()?;
        execute!(stdout(), EnterAlternateScreen)?;
        set_panic_hook();

        let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
        Ok(Self { terminal })
    }

    /// Restore the terminal to its original state.
    pub fn restore(&mut self) -> Result<()> {
        disable_raw_mode()?;
        execute!(stdout(), LeaveAlternateScreen)?;
        Ok(())
    }

    /// Async stream of input events.
    pub fn event_stream(&self) -> Pin<Box<dyn Stream<Item = TuiEvent> + Send + 'static>> {
        let mut crossterm_events = crossterm::event::EventStream::new();
        let stream = async_stream::stream! {
            while let Some(Ok(event)) = crossterm_events.next().await {
                match event {
                    Event::Key(key_event) => yield TuiEvent::Key(key_event),
                    Event::Resize(_, _) => yield TuiEvent::Resize,
                    _ => {}
                }
            }
        };
        Box::pin(stream)
    }

    /// Draw one frame.
    pub fn draw<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut ratatui::Frame),
    {
        self.terminal.draw(f)?;
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// Restore the terminal before surfacing a panic.
fn set_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));
}
