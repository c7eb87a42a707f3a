//! Terminal driver for the TUI.
//!
//! Implements the [`Driver`] trait for terminal I/O using crossterm for
//! keyboard events and ratatui for rendering. Remote calls never pass through
//! here; the runtime hands them to the bridge.

use std::{
    io::{self, Stdout, stdout},
    time::Duration,
};

use crossterm::{
    ExecutableCommand,
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use sociogram_app::{App, AppEvent, Driver, KeyInput};
use thiserror::Error;

use crate::ui;

/// How long a poll waits for terminal input before yielding a tick.
const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Terminal driver implementing the [`Driver`] trait.
///
/// Owns the raw-mode terminal for its whole lifetime; dropping it restores
/// the screen.
pub struct TerminalDriver {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_stream: EventStream,
    stopped: bool,
}

impl TerminalDriver {
    /// Enter raw mode and the alternate screen.
    pub fn new() -> Result<Self, TerminalError> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;

        Ok(Self { terminal, event_stream: EventStream::new(), stopped: false })
    }

    /// Convert a crossterm key press to `KeyInput`.
    ///
    /// Ctrl-C quits like Esc.
    fn convert_key(key: KeyEvent) -> Option<KeyInput> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return matches!(key.code, KeyCode::Char('c')).then_some(KeyInput::Esc);
        }

        match key.code {
            KeyCode::Char(c) => Some(KeyInput::Char(c)),
            KeyCode::Enter => Some(KeyInput::Enter),
            KeyCode::Backspace => Some(KeyInput::Backspace),
            KeyCode::Delete => Some(KeyInput::Delete),
            KeyCode::Tab => Some(KeyInput::Tab),
            KeyCode::Esc => Some(KeyInput::Esc),
            KeyCode::Left => Some(KeyInput::Left),
            KeyCode::Right => Some(KeyInput::Right),
            KeyCode::Up => Some(KeyInput::Up),
            KeyCode::Down => Some(KeyInput::Down),
            KeyCode::Home => Some(KeyInput::Home),
            KeyCode::End => Some(KeyInput::End),
            _ => None,
        }
    }

    fn convert_event(event: Event) -> Option<AppEvent> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                Self::convert_key(key).map(AppEvent::Key)
            },
            Event::Resize(cols, rows) => Some(AppEvent::Resize(cols, rows)),
            _ => None,
        }
    }
}

impl Driver for TerminalDriver {
    type Error = TerminalError;

    async fn poll_event(&mut self) -> Result<Option<AppEvent>, Self::Error> {
        tokio::select! {
            biased;

            maybe_event = self.event_stream.next() => match maybe_event {
                Some(Ok(event)) => Ok(Self::convert_event(event)),
                Some(Err(e)) => Err(TerminalError::Io(e)),
                // Input closed: quit instead of spinning on an exhausted stream.
                None => Ok(Some(AppEvent::Key(KeyInput::Esc))),
            },

            () = tokio::time::sleep(TICK_INTERVAL) => Ok(Some(AppEvent::Tick)),
        }
    }

    fn render(&mut self, app: &App) -> Result<(), Self::Error> {
        self.terminal.draw(|frame| ui::render(frame, app))?;
        Ok(())
    }

    fn open_url(&mut self, url: &str) -> Result<(), Self::Error> {
        // The status bar shows the wallet URL while the session awaits the
        // redirect; the terminal has no browser to hand it to.
        tracing::info!(%url, "wallet sign-in page ready");
        Ok(())
    }

    fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyEventState;

    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    #[test]
    fn printable_keys_map_to_chars() {
        let event = TerminalDriver::convert_event(press(KeyCode::Char('x'), KeyModifiers::NONE));
        assert!(matches!(event, Some(AppEvent::Key(KeyInput::Char('x')))));

        let shifted = TerminalDriver::convert_event(press(KeyCode::Char('X'), KeyModifiers::SHIFT));
        assert!(matches!(shifted, Some(AppEvent::Key(KeyInput::Char('X')))));
    }

    #[test]
    fn ctrl_c_quits_and_other_chords_are_ignored() {
        let quit = TerminalDriver::convert_event(press(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(matches!(quit, Some(AppEvent::Key(KeyInput::Esc))));

        let chord = TerminalDriver::convert_event(press(KeyCode::Char('a'), KeyModifiers::CONTROL));
        assert!(chord.is_none());
    }

    #[test]
    fn releases_are_ignored() {
        let release = Event::Key(KeyEvent {
            code: KeyCode::Enter,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        });
        assert!(TerminalDriver::convert_event(release).is_none());
    }

    #[test]
    fn resize_is_forwarded() {
        let event = TerminalDriver::convert_event(Event::Resize(120, 40));
        assert!(matches!(event, Some(AppEvent::Resize(120, 40))));
    }
}
