//! Chat area
//!
//! Displays the thread with the selected contact, or a hint for whatever the
//! session needs next.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use sociogram_app::{App, Delivery, InFlight, SessionState};

const BORDER_SIZE: u16 = 2;
const OPTIMISTIC_MARKER: &str = " …";

/// Render the chat area.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let title = app.selected_user().map_or_else(
        || " No contact ".to_string(),
        |user| format!(" {} ({}) ", user.display_name, user.account_id),
    );
    let block = Block::default().borders(Borders::ALL).title(title);

    match (app.session(), app.selected_peer()) {
        (SessionState::SignedIn { .. }, Some(_)) => render_thread(frame, app, block, area),
        (session, _) => {
            let paragraph = Paragraph::new(hint(app, session))
                .style(Style::default().fg(Color::DarkGray))
                .wrap(Wrap { trim: false })
                .block(block);
            frame.render_widget(paragraph, area);
        },
    }
}

fn hint(app: &App, session: &SessionState) -> Vec<Line<'static>> {
    let mut lines = session_hint(app, session);
    if !matches!(session, SessionState::SignedIn { .. })
        && let Some(notice) = app.sign_in_notice()
    {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(notice.to_owned(), Style::default().fg(Color::Yellow))));
    }
    lines
}

fn session_hint(app: &App, session: &SessionState) -> Vec<Line<'static>> {
    match session {
        SessionState::Disconnected => vec![Line::from("Not connected. Type /signin to retry.")],
        SessionState::Connecting => vec![Line::from("Connecting to the contract…")],
        SessionState::SignedOut => vec![Line::from("Type /signin to connect your wallet.")],
        SessionState::AwaitingRedirect { url } => vec![
            Line::from("Open this page to approve access:"),
            Line::from(Span::styled(url.clone(), Style::default().fg(Color::Cyan))),
            Line::from("then paste the address you land on: /callback <url>"),
        ],
        SessionState::SignedIn { .. } => {
            let mut lines = vec![Line::from("Select a contact with Tab or /select <account>.")];
            if !app.is_registered() {
                lines.push(Line::from("Not registered yet: /register <name>"));
            }
            lines
        },
    }
}

fn render_thread(frame: &mut Frame, app: &App, block: Block<'_>, area: Rect) {
    let own = app.account();

    let mut items: Vec<ListItem> = app
        .thread()
        .iter()
        .map(|entry| {
            let sender_style = if Some(&entry.message.sender) == own {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            };

            let mut spans = vec![
                Span::styled(format!("<{}>", entry.message.sender.short_name()), sender_style),
                Span::raw(" "),
                Span::raw(entry.message.content.clone()),
            ];
            if entry.delivery == Delivery::Optimistic {
                spans.push(Span::styled(OPTIMISTIC_MARKER, Style::default().fg(Color::DarkGray)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let loading = app
        .selected_peer()
        .is_some_and(|peer| app.is_pending(&InFlight::LoadMessages { peer: peer.clone() }));
    if items.is_empty() {
        let text = if loading { "Loading messages…" } else { "No messages yet. Say hi!" };
        items.push(ListItem::new(Line::from(Span::styled(text, Style::default().fg(Color::DarkGray)))));
    }

    let visible_height = area.height.saturating_sub(BORDER_SIZE) as usize;
    let skip = items.len().saturating_sub(visible_height);
    let visible_items: Vec<_> = items.into_iter().skip(skip).collect();

    frame.render_widget(List::new(visible_items).block(block), area);
}
