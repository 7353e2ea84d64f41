use std::time::Instant;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::app::{InputMode, ResolvedKeybinds, key_label};
use crate::ui::theme::Theme;

/// What the bottom line needs to know about the app.
pub struct StatusLine<'a> {
    pub input_mode: InputMode,
    pub filter_text: &'a str,
    pub match_count: usize,
    pub status_message: Option<&'a (String, Instant)>,
    pub keybinds: &'a ResolvedKeybinds,
}

pub fn render(frame: &mut Frame, area: Rect, status: &StatusLine, theme: &Theme) {
    let line = match status.status_message {
        Some((msg, _)) => Line::from(Span::styled(
            format!(" {msg}"),
            Style::default()
                .fg(theme.status_ok)
                .add_modifier(Modifier::BOLD),
        )),
        None => Line::from(mode_spans(status, theme)),
    };
    frame.render_widget(
        Paragraph::new(line).style(Style::default().bg(theme.statusbar_bg)),
        area,
    );
}

fn mode_spans<'a>(status: &StatusLine<'a>, theme: &Theme) -> Vec<Span<'a>> {
    let kb = status.keybinds;
    let mut spans = Vec::new();

    match status.input_mode {
        InputMode::Filter => {
            spans.push(key_span(key_label(kb.filter), theme));
            spans.push(Span::styled(
                format!(" {}", status.filter_text),
                Style::default().fg(theme.pill_desc_fg),
            ));
            spans.push(Span::styled("\u{2588}", Style::default().fg(theme.pill_key_bg)));
            push_pill(&mut spans, "Esc".to_string(), "Cancel", theme);
            push_pill(&mut spans, "Enter".to_string(), "Apply", theme);
        }
        InputMode::Normal | InputMode::Help if !status.filter_text.is_empty() => {
            spans.push(Span::styled(
                " Filter: ",
                Style::default()
                    .fg(theme.pill_key_bg)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(
                format!("{} ({} matching)", status.filter_text, status.match_count),
                Style::default().fg(theme.pill_desc_fg),
            ));
            push_pill(&mut spans, "Esc".to_string(), "Clear", theme);
            push_pill(&mut spans, key_label(kb.filter), "Edit", theme);
        }
        InputMode::Normal | InputMode::Help => {
            push_pill(&mut spans, key_label(kb.quit), "Quit", theme);
            push_pill(&mut spans, key_label(kb.filter), "Filter", theme);
            push_pill(&mut spans, key_label(kb.refresh), "Refresh", theme);
            push_pill(&mut spans, key_label(kb.cycle_theme), "Theme", theme);
            push_pill(&mut spans, key_label(kb.help), "Help", theme);
            push_pill(&mut spans, "\u{2191}\u{2193}".to_string(), "Select", theme);
        }
    }
    spans
}

fn key_span<'a>(key: String, theme: &Theme) -> Span<'a> {
    Span::styled(
        format!(" {key} "),
        Style::default()
            .fg(theme.pill_key_fg)
            .bg(theme.pill_key_bg)
            .add_modifier(Modifier::BOLD),
    )
}

fn push_pill<'a>(spans: &mut Vec<Span<'a>>, key: String, desc: &'a str, theme: &Theme) {
    spans.push(Span::raw(" "));
    spans.push(key_span(key, theme));
    spans.push(Span::styled(
        format!(" {desc}"),
        Style::default().fg(theme.pill_desc_fg).bg(theme.surface_bg),
    ));
}
