use crate::app::{truncate, AppState, Pane, RunLine};
use crate::event_list::EventRecord;
use crate::run::format_age;
use crate::status::{RunStatus, StatusTone};
use chrono::{DateTime, Utc};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let now = Utc::now();
    let narrow = area.width < crate::app::NARROW_WIDTH_THRESHOLD;
    let width = area.width as usize;
    let height = area.height as usize;

    let lines: Vec<Line> = match state.pane {
        Pane::Runs => {
            let all = state.run_lines();
            if all.is_empty() {
                return render_empty(f, area, state, empty_runs_message(state));
            }
            all.iter()
                .enumerate()
                .skip(state.runs.offset)
                .take(height)
                .map(|(i, line)| run_line(line, i == state.runs.cursor, narrow, width, now))
                .collect()
        }
        Pane::Events => {
            let events = &state.events.snapshot.data;
            if events.is_empty() {
                return render_empty(f, area, state, "No events found");
            }
            events
                .iter()
                .enumerate()
                .skip(state.events.offset)
                .take(height)
                .map(|(i, ev)| event_line(ev, i == state.events.cursor, narrow, width))
                .collect()
        }
    };

    let list = Paragraph::new(lines).block(Block::default().borders(Borders::NONE));
    f.render_widget(list, area);
}

fn empty_runs_message(state: &AppState) -> &'static str {
    if !state.row_filter.is_empty() {
        "No loaded runs match the filter"
    } else if state.only_active {
        "No active runs"
    } else {
        "No runs found"
    }
}

fn render_empty(f: &mut Frame, area: Rect, state: &AppState, msg: &'static str) {
    let line = if state.is_loading() {
        Line::from(vec![
            Span::styled(
                format!(" {} ", crate::tui::spinner::frame(state.spinner_frame)),
                Style::default().fg(Color::Yellow),
            ),
            Span::styled("Loading…", Style::default().fg(Color::DarkGray)),
        ])
    } else {
        Line::styled(msg, Style::default().fg(Color::DarkGray))
    };
    f.render_widget(Paragraph::new(line), area);
}

pub fn status_icon(status: RunStatus) -> (&'static str, Color) {
    match status.tone() {
        StatusTone::Success => ("✓", Color::Green),
        StatusTone::Error => ("✗", Color::Red),
        StatusTone::Warning => ("⊘", Color::Yellow),
        StatusTone::InProgress => ("⟳", Color::Yellow),
        StatusTone::Neutral => ("·", Color::DarkGray),
    }
}

fn select_style(is_selected: bool) -> Style {
    if is_selected {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    }
}

fn run_line(
    line: &RunLine<'_>,
    is_selected: bool,
    narrow: bool,
    max_width: usize,
    now: DateTime<Utc>,
) -> Line<'static> {
    match line {
        RunLine::Group {
            run_name,
            status,
            workflows,
        } => {
            let (icon, color) = status_icon(*status);
            let prefix = format!(" {icon} ");
            let count = format!(" ({workflows})");
            let name_max = max_width
                .saturating_sub(UnicodeWidthStr::width(prefix.as_str()) + count.len());
            Line::from(vec![
                Span::styled(prefix, Style::default().fg(color)),
                Span::styled(
                    truncate(run_name, name_max),
                    select_style(is_selected).add_modifier(Modifier::BOLD),
                ),
                Span::styled(count, Style::default().fg(Color::DarkGray)),
            ])
        }
        RunLine::Workflow { row, nested } => {
            let (icon, color) = status_icon(row.status);
            let indent = if *nested { "    " } else { " " };
            let prefix = format!("{indent}{icon} ");
            let title = if *nested {
                row.workflow_name.clone().unwrap_or_else(|| row.run_name.clone())
            } else {
                match &row.workflow_name {
                    Some(w) => format!("{}/{w}", row.run_name),
                    None => row.run_name.clone(),
                }
            };

            let mut suffix: Vec<Span<'static>> = Vec::new();
            if !narrow {
                suffix.push(Span::styled(
                    format!(" {}", row.status),
                    Style::default().fg(color),
                ));
                if let Some(tag) = &row.tag_name {
                    suffix.push(Span::styled(
                        format!(" #{tag}"),
                        Style::default().fg(Color::Magenta),
                    ));
                }
                suffix.push(Span::styled(
                    format!(" {}", format_age(row.submitted_at, now)),
                    Style::default().fg(Color::DarkGray),
                ));
                suffix.push(Span::styled(
                    format!(" {}", row.hub_user_name),
                    Style::default().fg(Color::Blue),
                ));
            }
            let suffix_width: usize = suffix.iter().map(Span::width).sum();
            let title_max = max_width
                .saturating_sub(UnicodeWidthStr::width(prefix.as_str()) + suffix_width);

            let mut spans = vec![
                Span::styled(prefix, Style::default().fg(color)),
                Span::styled(truncate(&title, title_max), select_style(is_selected)),
            ];
            spans.extend(suffix);
            Line::from(spans)
        }
    }
}

fn event_line(ev: &EventRecord, is_selected: bool, narrow: bool, max_width: usize) -> Line<'static> {
    let time = if narrow {
        ev.recorded_at.format("%H:%M").to_string()
    } else {
        ev.recorded_at.format("%Y-%m-%d %H:%M:%S").to_string()
    };
    let actor = ev.actor_user.clone().unwrap_or_else(|| "-".to_string());
    let prefix = format!(" {time} ");
    let actor_part = format!("{actor} ");
    let msg_max = max_width.saturating_sub(prefix.len() + UnicodeWidthStr::width(actor_part.as_str()));

    Line::from(vec![
        Span::styled(prefix, Style::default().fg(Color::DarkGray)),
        Span::styled(actor_part, Style::default().fg(Color::Blue)),
        Span::styled(truncate(&ev.message, msg_max), select_style(is_selected)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::Workflow;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn row() -> Workflow {
        Workflow {
            run_name: "fast-cat".to_string(),
            workflow_name: Some("train".to_string()),
            hub_user_name: "alice".to_string(),
            runner_name: String::new(),
            status: RunStatus::Running,
            submitted_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            tag_name: Some("v1".to_string()),
            variables: BTreeMap::new(),
            repo_url: None,
        }
    }

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn icon_per_tone() {
        assert_eq!(status_icon(RunStatus::Done), ("✓", Color::Green));
        assert_eq!(status_icon(RunStatus::Failed), ("✗", Color::Red));
        assert_eq!(status_icon(RunStatus::Aborted), ("⊘", Color::Yellow));
        assert_eq!(status_icon(RunStatus::Queued), ("⟳", Color::Yellow));
        assert_eq!(status_icon(RunStatus::Stopped), ("·", Color::DarkGray));
        assert_eq!(status_icon(RunStatus::Unknown), ("·", Color::DarkGray));
    }

    #[test]
    fn flat_workflow_line_shows_full_title() {
        let r = row();
        let now = r.submitted_at + chrono::Duration::seconds(90);
        let line = run_line(
            &RunLine::Workflow {
                row: &r,
                nested: false,
            },
            false,
            false,
            120,
            now,
        );
        assert_eq!(text(&line), " ⟳ fast-cat/train running #v1 1m 30s alice");
    }

    #[test]
    fn nested_narrow_line_drops_suffix() {
        let r = row();
        let line = run_line(
            &RunLine::Workflow {
                row: &r,
                nested: true,
            },
            false,
            true,
            40,
            r.submitted_at,
        );
        assert_eq!(text(&line), "    ⟳ train");
    }

    #[test]
    fn group_line_counts_workflows() {
        let line = run_line(
            &RunLine::Group {
                run_name: "fast-cat",
                status: RunStatus::Done,
                workflows: 3,
            },
            true,
            false,
            80,
            Utc::now(),
        );
        assert_eq!(text(&line), " ✓ fast-cat (3)");
    }

    #[test]
    fn long_titles_fit_width() {
        let mut r = row();
        r.run_name = "x".repeat(200);
        r.workflow_name = None;
        let line = run_line(
            &RunLine::Workflow {
                row: &r,
                nested: false,
            },
            false,
            false,
            60,
            r.submitted_at,
        );
        assert!(line.width() <= 60);
    }

    #[test]
    fn event_line_shows_actor() {
        let ev = EventRecord {
            id: "1".to_string(),
            message: "Run fast-cat submitted".to_string(),
            recorded_at: Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap(),
            actor_user: Some("alice".to_string()),
            targets: vec![],
        };
        assert_eq!(
            text(&event_line(&ev, false, true, 80)),
            " 10:00 alice Run fast-cat submitted"
        );
    }
}
