//! Note table and trigger history widget

use super::App;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub(crate) fn draw_note_panel(f: &mut Frame, area: Rect, app: &App) {
    let active = app.session.edge_index();
    let playing_view = app.session.is_playing() || app.session.current_note().is_some();

    let mut lines: Vec<Line> = Vec::new();
    for i in 0..app.session.sides() {
        let selected = i == app.selected;
        let marker = if selected { "▸ " } else { "  " };

        let text = match (&app.editing, selected) {
            (Some(buffer), true) => format!("{buffer}_"),
            _ => app.session.note(i).to_string(),
        };

        let mut style = if app.session.is_muted(i) {
            Style::default().fg(Color::DarkGray)
        } else if playing_view && i == active {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        if selected {
            style = style.add_modifier(Modifier::REVERSED);
        }

        let mute_tag = if app.session.is_muted(i) { " (M)" } else { "" };
        lines.push(Line::from(vec![
            Span::styled(marker, Style::default().fg(Color::Cyan)),
            Span::styled(format!("{i}: {text:<8}{mute_tag}"), style),
        ]));
    }

    lines.push(Line::raw(""));
    lines.push(Line::from(vec![
        Span::styled("Now: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            app.session.current_note().unwrap_or("-").to_string(),
            Style::default().fg(Color::Yellow),
        ),
    ]));

    if !app.history.is_empty() {
        lines.push(Line::styled("Recent:", Style::default().fg(Color::DarkGray)));
        for entry in &app.history {
            // Annotate raw-frequency entries with the nearest note name
            let label = match &entry.label {
                Some(name) if name != &entry.note => format!(" (~{name})"),
                _ => String::new(),
            };
            let suffix = if entry.muted { "  muted" } else { "" };
            lines.push(Line::styled(
                format!(
                    "  e{}  {:<6} {:7.1} Hz{label}{suffix}",
                    entry.edge, entry.note, entry.frequency
                ),
                if entry.muted {
                    Style::default().fg(Color::DarkGray)
                } else {
                    Style::default().fg(Color::Green)
                },
            ));
        }
    }

    let panel =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Notes "));
    f.render_widget(panel, area);
}
