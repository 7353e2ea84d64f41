pub mod header;
pub mod help;
pub mod process_table;
pub mod statusbar;
pub mod theme;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};

use crate::app::App;

pub fn draw(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    header::render(
        frame,
        chunks[0],
        &app.sample.summary,
        &app.theme,
        &app.cpu_history,
    );

    app.page_size = process_table::page_size(chunks[1]);
    let rows = app.visible_rows();
    process_table::render(frame, chunks[1], &rows, app.selected_index, &app.theme);

    let status = statusbar::StatusLine {
        input_mode: app.input_mode,
        filter_text: &app.filter_text,
        match_count: rows.len(),
        status_message: app.status_message.as_ref(),
        keybinds: &app.keybinds,
    };
    statusbar::render(frame, chunks[2], &status, &app.theme);

    // Help overlay: rendered last to appear on top
    if app.show_help() {
        help::render(frame, frame.area(), &app.help_entries(), &app.theme);
    }
}
