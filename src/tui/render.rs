use crate::app::AppState;
use crate::tui::{detail_overlay, footer, header, list};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

/// Rows left for the list once header and footer are drawn.
pub fn list_rows(screen_height: u16) -> u16 {
    screen_height.saturating_sub(crate::app::CHROME_ROWS).max(1)
}

pub fn render(f: &mut Frame, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // header
            Constraint::Min(1),    // list
            Constraint::Length(2), // footer
        ])
        .split(f.area());

    header::render(f, chunks[0], state);
    list::render(f, chunks[1], state);
    footer::render(f, chunks[2], state);

    // Error toast
    if let Some(err) = state.error_message() {
        let area = f.area();
        if area.height > 6 && area.width >= 4 {
            let err_area = Rect {
                x: area.x + 1,
                y: area.y + area.height.saturating_sub(5),
                width: area.width.saturating_sub(2),
                height: 3,
            };
            let err_widget = Paragraph::new(err.to_owned())
                .style(Style::default().fg(Color::Red))
                .block(
                    Block::default()
                        .title(" Error ")
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::Red)),
                )
                .wrap(Wrap { trim: true });
            f.render_widget(err_widget, err_area);
        }
    }

    if let Some(overlay) = &state.detail {
        detail_overlay::render(f, overlay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_list::EventListFilter;
    use crate::loader::ListSnapshot;
    use crate::run::Workflow;
    use crate::status::RunStatus;
    use chrono::{TimeZone, Utc};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn screen_text(state: &AppState, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| render(f, state)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    fn state() -> AppState {
        let mut s = AppState::new(
            "main".to_string(),
            "http://localhost".to_string(),
            EventListFilter::default(),
        );
        s.config.version_string = "runboard v0".to_string();
        s
    }

    fn row(run: &str) -> Workflow {
        Workflow {
            run_name: run.to_string(),
            workflow_name: None,
            hub_user_name: "alice".to_string(),
            runner_name: String::new(),
            status: RunStatus::Done,
            submitted_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            tag_name: None,
            variables: Default::default(),
            repo_url: None,
        }
    }

    #[test]
    fn list_rows_subtracts_chrome() {
        assert_eq!(list_rows(24), 20);
        assert_eq!(list_rows(3), 1);
    }

    #[test]
    fn draws_project_and_rows() {
        let mut s = state();
        s.grouped = false;
        s.apply_runs(ListSnapshot {
            data: vec![row("fast-cat"), row("slow-dog")],
            generation: 1,
            exhausted: true,
            ..ListSnapshot::default()
        });
        let text = screen_text(&s, 100, 12);
        assert!(text.contains("main"));
        assert!(text.contains("fast-cat"));
        assert!(text.contains("slow-dog"));
        assert!(text.contains("end of list"));
    }

    #[test]
    fn empty_list_message() {
        let text = screen_text(&state(), 80, 10);
        assert!(text.contains("No runs found"));
    }

    #[test]
    fn error_toast_and_overlay_drawn() {
        let mut s = state();
        s.apply_runs(ListSnapshot {
            data: vec![row("fast-cat")],
            generation: 1,
            ..ListSnapshot::default()
        });
        s.set_error("API error (500)".to_string());
        s.open_details();
        let text = screen_text(&s, 100, 20);
        assert!(text.contains("API error (500)"));
        assert!(text.contains("Workflows"));
    }

    #[test]
    fn tiny_terminal_does_not_panic() {
        let mut s = state();
        s.set_error("boom".to_string());
        s.open_details();
        let _ = screen_text(&s, 5, 3);
    }
}
