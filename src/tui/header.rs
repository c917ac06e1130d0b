use crate::app::{AppState, Pane};
use crate::tui::spinner;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

fn tab(label: &'static str, active: bool) -> Span<'static> {
    if active {
        Span::styled(
            format!(" {label} "),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(format!(" {label} "), Style::default().fg(Color::DarkGray))
    }
}

/// Filter badges for the pane on screen.
pub fn filter_badges(state: &AppState) -> Vec<String> {
    let mut badges = Vec::new();
    match state.pane {
        Pane::Runs => {
            if state.only_active {
                badges.push("[active]".to_string());
            }
            if !state.grouped {
                badges.push("[flat]".to_string());
            }
            if let Some(tag) = &state.row_filter.tag {
                badges.push(format!("[tag:{tag}]"));
            }
            let query = state.row_filter.search.trim();
            if !query.is_empty() && !state.is_searching() {
                badges.push(format!("[/{query}]"));
            }
        }
        Pane::Events => {
            if !state.config.event_filter.is_empty() {
                badges.push(format!("[{}]", state.config.event_filter));
            }
        }
    }
    badges
}

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let mut spans = vec![
        Span::styled(
            format!(" {} ", state.config.version_string),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("│ "),
        Span::styled(
            &state.config.project,
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        tab("Runs", state.pane == Pane::Runs),
        tab("Events", state.pane == Pane::Events),
    ];

    for badge in filter_badges(state) {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(badge, Style::default().fg(Color::Magenta)));
    }

    if state.is_loading() {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            spinner::frame(state.spinner_frame).to_string(),
            Style::default().fg(Color::Yellow),
        ));
    }

    // Error indicator
    if state.error_message().is_some() {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            "!",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray)),
    );

    f.render_widget(header, area);
}
