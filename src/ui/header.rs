use std::collections::VecDeque;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Gauge, Paragraph, Sparkline};

use crate::format::{elapsed_time, format_kb, format_percent};
use crate::system::snapshot::SystemSummary;
use crate::ui::theme::Theme;

pub fn render(
    frame: &mut Frame,
    area: Rect,
    summary: &SystemSummary,
    theme: &Theme,
    cpu_history: &VecDeque<u64>,
) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(30),
            Constraint::Percentage(30),
        ])
        .split(area);

    render_system_info(frame, chunks[0], summary, theme);
    render_cpu_sparkline(frame, chunks[1], summary, theme, cpu_history);
    render_memory_gauge(frame, chunks[2], summary, theme);
}

fn bordered(theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.overlay_border))
}

fn render_system_info(frame: &mut Frame, area: Rect, summary: &SystemSummary, theme: &Theme) {
    let block = bordered(theme);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let os_name = if summary.os_name.is_empty() {
        "Linux"
    } else {
        summary.os_name.as_str()
    };

    let first = Line::from(vec![
        Span::styled(
            " proctop ",
            Style::default()
                .fg(theme.header_accent_fg)
                .bg(theme.header_accent_bg)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(os_name.to_string(), Style::default().fg(theme.text_primary)),
        Span::raw(" "),
        Span::styled(
            summary.kernel_version.clone(),
            Style::default().fg(theme.text_secondary),
        ),
    ]);

    let second = Line::from(vec![
        Span::styled(" Up ", Style::default().fg(theme.text_secondary)),
        Span::styled(
            elapsed_time(summary.uptime_seconds),
            Style::default()
                .fg(theme.accent_mauve)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(
                "  Procs {}  Running {}",
                summary.total_processes, summary.running_processes
            ),
            Style::default().fg(theme.text_secondary),
        ),
    ]);

    frame.render_widget(Paragraph::new(vec![first, second]), inner);
}

fn render_cpu_sparkline(
    frame: &mut Frame,
    area: Rect,
    summary: &SystemSummary,
    theme: &Theme,
    cpu_history: &VecDeque<u64>,
) {
    let cpu_block = bordered(theme).title(Span::styled(
        format!(" CPU {}% ", format_percent(summary.cpu_fraction)),
        Style::default()
            .fg(theme.text_secondary)
            .add_modifier(Modifier::BOLD),
    ));

    let cpu_data: Vec<u64> = cpu_history.iter().copied().collect();
    let sparkline = Sparkline::default()
        .block(cpu_block)
        .data(&cpu_data)
        .max(10_000)
        .style(Style::default().fg(theme.sparkline_color));

    frame.render_widget(sparkline, area);
}

fn render_memory_gauge(frame: &mut Frame, area: Rect, summary: &SystemSummary, theme: &Theme) {
    let ratio = if summary.memory_fraction.is_finite() {
        summary.memory_fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };

    let mem_block = bordered(theme).title(Span::styled(
        " Memory ",
        Style::default()
            .fg(theme.text_secondary)
            .add_modifier(Modifier::BOLD),
    ));

    let gauge = Gauge::default()
        .block(mem_block)
        .gauge_style(
            Style::default()
                .fg(theme.gauge_filled)
                .bg(theme.gauge_unfilled),
        )
        .ratio(ratio)
        .label(format!(
            "{}/{} ({}%)",
            format_kb(summary.memory_used_kb),
            format_kb(summary.memory_total_kb),
            format_percent(ratio)
        ));

    frame.render_widget(gauge, area);
}
