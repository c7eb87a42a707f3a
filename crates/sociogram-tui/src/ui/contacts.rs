//! Contacts sidebar
//!
//! Lists every registered user except the signed-in account.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};
use sociogram_app::{App, InFlight};

const ACTIVE_PREFIX: &str = ">";
const INACTIVE_PREFIX: &str = " ";

/// Render the contacts sidebar.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Contacts ");

    let items: Vec<ListItem> = if app.contacts().is_empty() {
        let hint = if app.is_pending(&InFlight::LoadUsers) { "loading…" } else { "" };
        vec![ListItem::new(Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray))))]
    } else {
        app.contacts()
            .iter()
            .map(|user| {
                let active = app.selected_peer() == Some(&user.account_id);
                let (prefix, style) = if active {
                    (ACTIVE_PREFIX, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
                } else {
                    (INACTIVE_PREFIX, Style::default())
                };

                ListItem::new(Line::from(vec![
                    Span::raw(prefix),
                    Span::styled(user.display_name.clone(), style),
                ]))
            })
            .collect()
    };

    frame.render_widget(List::new(items).block(block), area);
}
