use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, BorderType, Borders, Cell, Row, Table, TableState};

use crate::format::{elapsed_time, format_percent, truncate_unicode};
use crate::system::table::ProcessRecord;
use crate::ui::theme::Theme;

const USER_WIDTH: u16 = 10;

/// Rows that fit inside `area` once borders and the header row are drawn.
pub fn page_size(area: Rect) -> usize {
    area.height.saturating_sub(3) as usize
}

pub fn render(
    frame: &mut Frame,
    area: Rect,
    rows: &[&ProcessRecord],
    selected: usize,
    theme: &Theme,
) {
    let header = Row::new(["PID", "USER", "CPU%", "RAM[MB]", "TIME+", "COMMAND"])
        .style(
            Style::default()
                .fg(theme.table_header_fg)
                .add_modifier(Modifier::BOLD),
        );

    let widths = [
        Constraint::Length(7),
        Constraint::Length(USER_WIDTH),
        Constraint::Length(6),
        Constraint::Length(8),
        Constraint::Length(9),
        Constraint::Min(10),
    ];
    // Fixed columns plus one space of spacing between each of the six.
    let command_width = (area.width as usize).saturating_sub(7 + 10 + 6 + 8 + 9 + 5 + 2);

    let body = rows.iter().map(|r| {
        let command = if r.command.is_empty() {
            "[kernel]".to_string()
        } else {
            truncate_unicode(&r.command, command_width.max(1))
        };
        Row::new(vec![
            Cell::from(r.pid.to_string()),
            Cell::from(truncate_unicode(&r.user, USER_WIDTH as usize)),
            Cell::from(Span::styled(
                format_percent(r.cpu_fraction),
                Style::default().fg(theme.cpu_color(r.cpu_fraction)),
            )),
            Cell::from(r.resident_memory_display.clone()),
            Cell::from(elapsed_time(r.uptime_seconds)),
            Cell::from(command),
        ])
        .style(Style::default().fg(theme.text_primary))
    });

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.overlay_border))
        .title(Span::styled(
            format!(" Processes ({}) ", rows.len()),
            Style::default()
                .fg(theme.text_secondary)
                .add_modifier(Modifier::BOLD),
        ));

    let table = Table::new(body, widths)
        .header(header)
        .block(block)
        .column_spacing(1)
        .row_highlight_style(
            Style::default()
                .bg(theme.selected_bg)
                .fg(theme.selected_fg)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = TableState::default();
    if !rows.is_empty() {
        state.select(Some(selected.min(rows.len() - 1)));
    }
    frame.render_stateful_widget(table, area, &mut state);
}
