//! Input line
//!
//! Displays the compose buffer with cursor.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
};
use sociogram_app::App;

const PROMPT_WIDTH: u16 = 2; // "> "
const BORDER_WIDTH: u16 = 1;
const INPUT_LINE_OFFSET_Y: u16 = 1; // inside top border
const RIGHT_PADDING: u16 = 1; // inside right border

/// Render the input line.
#[allow(clippy::cast_possible_truncation)]
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let title = app
        .selected_user()
        .map_or_else(String::new, |user| format!(" to {} ", user.display_name));
    let block = Block::default().borders(Borders::ALL).title(title);

    let input_text = format!("> {}", app.input_buffer());
    let paragraph =
        Paragraph::new(input_text).style(Style::default().fg(Color::White)).block(block);

    frame.render_widget(paragraph, area);

    let available_width = area.width.saturating_sub(BORDER_WIDTH + PROMPT_WIDTH + RIGHT_PADDING);
    let cursor_offset = (app.input_cursor() as u16).min(available_width);

    let cursor_x = area
        .x
        .saturating_add(BORDER_WIDTH + PROMPT_WIDTH)
        .saturating_add(cursor_offset);
    let cursor_y = area.y.saturating_add(INPUT_LINE_OFFSET_Y);
    let max_x = area.x.saturating_add(area.width).saturating_sub(RIGHT_PADDING);

    frame.set_cursor_position((cursor_x.min(max_x), cursor_y));
}
