//! Status bar
//!
//! Displays session state, pending calls and the latest status message.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use sociogram_app::{App, InFlight, SessionState};

/// Render the status bar.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let session = match app.session() {
        SessionState::Disconnected => Span::styled("Disconnected", Style::default().fg(Color::Red)),
        SessionState::Connecting => {
            Span::styled("Connecting...", Style::default().fg(Color::Yellow))
        },
        SessionState::SignedOut => Span::styled("Signed out", Style::default().fg(Color::Yellow)),
        SessionState::AwaitingRedirect { .. } => {
            Span::styled("Awaiting wallet", Style::default().fg(Color::Yellow))
        },
        SessionState::SignedIn { account_id } => Span::styled(
            format!("Signed in as {account_id}"),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
    };

    let mut pending = Vec::new();
    if app.is_sending() {
        pending.push("sending…");
    }
    if app.is_pending(&InFlight::Register) {
        pending.push("registering…");
    }
    if app.is_pending(&InFlight::SignIn) {
        pending.push("signing in…");
    }

    let mut spans = vec![Span::raw(" "), session];
    if !pending.is_empty() {
        spans.push(Span::styled(
            format!(" | {}", pending.join(" ")),
            Style::default().fg(Color::Yellow),
        ));
    }
    if let Some(message) = app.status_message() {
        spans.push(Span::styled(format!(" | {message}"), Style::default().fg(Color::Gray)));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(paragraph, area);
}
