use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::{AppState, Pane};

fn hints(state: &AppState, narrow: bool) -> &'static [(&'static str, &'static str)] {
    match (state.pane, narrow) {
        _ if state.has_detail_overlay() => &[("d/q/Esc", "close")],
        (Pane::Runs, true) => &[
            ("j/k", "nav"),
            ("/", "find"),
            ("d", "info"),
            ("Tab", "events"),
            ("q", "quit"),
        ],
        (Pane::Runs, false) => &[
            ("↑↓/jk", "navigate"),
            ("/", "search"),
            ("t", "tag"),
            ("g", "group"),
            ("a", "active"),
            ("d", "details"),
            ("r", "refresh"),
            ("Tab", "events"),
            ("q", "quit"),
        ],
        (Pane::Events, true) => &[
            ("j/k", "nav"),
            ("d", "info"),
            ("Tab", "runs"),
            ("q", "quit"),
        ],
        (Pane::Events, false) => &[
            ("↑↓/jk", "navigate"),
            ("d", "details"),
            ("r", "refresh"),
            ("Tab", "runs"),
            ("q", "quit"),
        ],
    }
}

/// Right-hand list status: pagination progress of the pane on screen.
pub fn list_status(state: &AppState) -> Option<&'static str> {
    let snapshot_flags = match state.pane {
        Pane::Runs => (
            state.runs.snapshot.is_loading_more,
            state.runs.snapshot.exhausted,
            state.runs.snapshot.data.is_empty(),
        ),
        Pane::Events => (
            state.events.snapshot.is_loading_more,
            state.events.snapshot.exhausted,
            state.events.snapshot.data.is_empty(),
        ),
    };
    match snapshot_flags {
        (true, _, _) => Some("loading more…"),
        (false, true, false) => Some("end of list"),
        _ => None,
    }
}

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let narrow = area.width < crate::app::NARROW_WIDTH_THRESHOLD;

    let mut spans: Vec<Span> = Vec::new();
    if let Some(query) = &state.search_input {
        spans.push(Span::styled(
            "/",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(query.as_str(), Style::default().fg(Color::White)));
        spans.push(Span::styled("▏", Style::default().fg(Color::Cyan)));
        spans.push(Span::styled(
            "  Enter apply  Esc clear",
            Style::default().fg(Color::DarkGray),
        ));
    } else {
        for (i, (key, desc)) in hints(state, narrow).iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            spans.push(Span::styled(*key, Style::default().fg(Color::Cyan)));
            spans.push(Span::styled(
                format!(" {desc}"),
                Style::default().fg(Color::DarkGray),
            ));
        }
    }

    if let Some(status) = list_status(state) {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(status, Style::default().fg(Color::Yellow)));
    }

    let footer = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(footer, area);
}
