//! Application state: the two list panes, client-side filters, overlay and
//! transient UI.

use crate::event_list::{EventListFilter, EventRecord};
use crate::loader::ListSnapshot;
use crate::run::{self, FullName, RowFilter, Workflow};
use crate::status::RunStatus;
use chrono::{DateTime, Utc};

/// Length of the spinner animation in `tui::spinner`.
pub const SPINNER_FRAME_COUNT: usize = 10;
/// Below 60 cols, hints and ages don't fit: compact layout.
pub const NARROW_WIDTH_THRESHOLD: u16 = 60;
/// Long enough to read; short enough to not permanently obscure the list.
pub const ERROR_TTL_SECS: u64 = 10;
/// Header and footer take two rows each.
pub const CHROME_ROWS: u16 = 4;

/// Unicode-width-aware truncation with ellipsis.
/// Returns `""` when `max_width` is 0.
pub fn truncate(s: &str, max_width: usize) -> String {
    use unicode_width::UnicodeWidthStr;
    if max_width == 0 {
        return String::new();
    }
    if UnicodeWidthStr::width(s) <= max_width {
        s.to_string()
    } else {
        let mut result = String::new();
        let mut width = 0;
        for c in s.chars() {
            let cw = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
            if width + cw + 1 > max_width {
                result.push('\u{2026}');
                break;
            }
            result.push(c);
            width += cw;
        }
        result
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Runs,
    Events,
}

/// One rendered line of the runs pane.
#[derive(Debug, Clone, PartialEq)]
pub enum RunLine<'a> {
    Group {
        run_name: &'a str,
        status: RunStatus,
        workflows: usize,
    },
    Workflow {
        row: &'a Workflow,
        nested: bool,
    },
}

/// A loaded list plus the cursor and scroll position over its lines.
#[derive(Debug)]
pub struct ListPane<T> {
    pub snapshot: ListSnapshot<T>,
    pub cursor: usize,
    pub offset: usize,
    pub visible_rows: u16,
}

impl<T> Default for ListPane<T> {
    fn default() -> Self {
        Self {
            snapshot: ListSnapshot::default(),
            cursor: 0,
            offset: 0,
            visible_rows: 0,
        }
    }
}

impl<T> ListPane<T> {
    /// Installs a new snapshot. A new generation means a different list, so
    /// the position starts over.
    pub fn apply(&mut self, snapshot: ListSnapshot<T>) {
        if snapshot.generation != self.snapshot.generation {
            self.cursor = 0;
            self.offset = 0;
        }
        self.snapshot = snapshot;
    }

    pub fn move_up(&mut self, amount: usize) {
        self.cursor = self.cursor.saturating_sub(amount);
        self.scroll_to_cursor();
    }

    pub fn move_down(&mut self, amount: usize, lines: usize) {
        if lines == 0 {
            return;
        }
        self.cursor = (self.cursor + amount).min(lines - 1);
        self.scroll_to_cursor();
    }

    pub fn move_to_top(&mut self) {
        self.cursor = 0;
        self.offset = 0;
    }

    pub fn move_to_bottom(&mut self, lines: usize) {
        self.cursor = lines.saturating_sub(1);
        self.scroll_to_cursor();
    }

    /// Keeps the cursor inside `0..lines` after the line set shrank.
    pub fn clamp(&mut self, lines: usize) {
        if lines == 0 {
            self.cursor = 0;
            self.offset = 0;
        } else if self.cursor >= lines {
            self.cursor = lines - 1;
        }
        self.scroll_to_cursor();
    }

    pub fn page(&self) -> usize {
        usize::from(self.visible_rows.max(1))
    }

    fn scroll_to_cursor(&mut self) {
        let visible = self.page();
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + visible {
            self.offset = self.cursor + 1 - visible;
        }
    }
}

/// Immutable configuration set at startup.
pub struct AppConfig {
    pub project: String,
    pub api_url: String,
    pub event_filter: EventListFilter,
    pub version_string: String,
}

pub struct DetailOverlay {
    pub title: String,
    pub lines: Vec<(String, String)>,
}

pub struct AppState {
    pub config: AppConfig,
    pub pane: Pane,
    pub runs: ListPane<Workflow>,
    pub events: ListPane<EventRecord>,

    // Client-side filtering of the runs pane
    pub row_filter: RowFilter,
    /// `Some` while the search prompt is open.
    pub search_input: Option<String>,
    pub grouped: bool,
    /// Server-side filter: a change resets the runs loader.
    pub only_active: bool,
    /// `user/run[/workflow]` to select once it has been loaded.
    pub pending_focus: Option<String>,

    pub detail: Option<DetailOverlay>,
    pub error: Option<(String, std::time::Instant)>,
    pub spinner_frame: usize,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(project: String, api_url: String, event_filter: EventListFilter) -> Self {
        Self {
            config: AppConfig {
                project,
                api_url,
                event_filter,
                version_string: String::new(),
            },
            pane: Pane::Runs,
            runs: ListPane::default(),
            events: ListPane::default(),
            row_filter: RowFilter::default(),
            search_input: None,
            grouped: true,
            only_active: false,
            pending_focus: None,
            detail: None,
            error: None,
            spinner_frame: 0,
            should_quit: false,
        }
    }

    pub fn visible_runs(&self) -> Vec<&Workflow> {
        run::filter_rows(&self.runs.snapshot.data, &self.row_filter)
    }

    pub fn run_lines(&self) -> Vec<RunLine<'_>> {
        let rows = self.visible_runs();
        if !self.grouped {
            return rows
                .into_iter()
                .map(|row| RunLine::Workflow { row, nested: false })
                .collect();
        }
        let mut lines = Vec::new();
        for group in run::group_by_run(rows) {
            let status = group.status();
            let workflows = group.workflows;
            let first = workflows[0];
            let run_name = first.run_name.as_str();
            lines.push(RunLine::Group {
                run_name,
                status,
                workflows: workflows.len(),
            });
            lines.extend(
                workflows
                    .into_iter()
                    .map(|row| RunLine::Workflow { row, nested: true }),
            );
        }
        lines
    }

    pub fn line_count(&self, pane: Pane) -> usize {
        match pane {
            Pane::Runs => self.run_lines().len(),
            Pane::Events => self.events.snapshot.data.len(),
        }
    }

    pub fn apply_runs(&mut self, snapshot: ListSnapshot<Workflow>) {
        if let Some(err) = new_error(&self.runs.snapshot, &snapshot) {
            self.set_error(err);
        }
        self.runs.apply(snapshot);
        if let Some(key) = self.pending_focus.clone() {
            if let Some(line) = self.find_full_name(&key) {
                self.runs.cursor = line;
                self.pending_focus = None;
            }
        }
        self.reclamp_runs();
    }

    pub fn apply_events(&mut self, snapshot: ListSnapshot<EventRecord>) {
        if let Some(err) = new_error(&self.events.snapshot, &snapshot) {
            self.set_error(err);
        }
        self.events.apply(snapshot);
        let lines = self.line_count(Pane::Events);
        self.events.clamp(lines);
    }

    /// Index of the first workflow line matching a `user/run[/workflow]` key.
    pub fn find_full_name(&self, key: &str) -> Option<usize> {
        let wanted = FullName::parse(key)?;
        self.run_lines().iter().position(|line| match line {
            RunLine::Workflow { row, .. } => {
                row.hub_user_name == wanted.user
                    && row.run_name == wanted.run
                    && (wanted.workflow.is_none() || row.workflow_name == wanted.workflow)
            }
            RunLine::Group { .. } => false,
        })
    }

    /// Resizes both panes, keeping each cursor on screen.
    pub fn set_visible_rows(&mut self, rows: u16) {
        self.runs.visible_rows = rows;
        self.events.visible_rows = rows;
        self.reclamp_runs();
        let lines = self.line_count(Pane::Events);
        self.events.clamp(lines);
    }

    pub fn switch_pane(&mut self) {
        self.pane = match self.pane {
            Pane::Runs => Pane::Events,
            Pane::Events => Pane::Runs,
        };
    }

    pub fn move_cursor_up(&mut self, amount: usize) {
        match self.pane {
            Pane::Runs => self.runs.move_up(amount),
            Pane::Events => self.events.move_up(amount),
        }
    }

    pub fn move_cursor_down(&mut self, amount: usize) {
        let lines = self.line_count(self.pane);
        match self.pane {
            Pane::Runs => self.runs.move_down(amount, lines),
            Pane::Events => self.events.move_down(amount, lines),
        }
    }

    pub fn move_to_top(&mut self) {
        match self.pane {
            Pane::Runs => self.runs.move_to_top(),
            Pane::Events => self.events.move_to_top(),
        }
    }

    pub fn move_to_bottom(&mut self) {
        let lines = self.line_count(self.pane);
        match self.pane {
            Pane::Runs => self.runs.move_to_bottom(lines),
            Pane::Events => self.events.move_to_bottom(lines),
        }
    }

    pub fn page_size(&self) -> usize {
        match self.pane {
            Pane::Runs => self.runs.page(),
            Pane::Events => self.events.page(),
        }
    }

    pub fn toggle_grouped(&mut self) {
        self.grouped = !self.grouped;
        let lines = self.line_count(Pane::Runs);
        self.runs.clamp(lines);
    }

    pub fn toggle_only_active(&mut self) {
        self.only_active = !self.only_active;
    }

    /// Cycles through the tags present in the loaded rows, then back to none.
    pub fn cycle_tag(&mut self) {
        let tags = run::distinct_tags(&self.runs.snapshot.data);
        self.row_filter.tag = match &self.row_filter.tag {
            None => tags.first().cloned(),
            Some(current) => tags
                .iter()
                .position(|t| t == current)
                .and_then(|i| tags.get(i + 1))
                .cloned(),
        };
        self.reclamp_runs();
    }

    pub fn start_search(&mut self) {
        self.search_input = Some(self.row_filter.search.clone());
    }

    pub fn search_push(&mut self, c: char) {
        if let Some(input) = &mut self.search_input {
            input.push(c);
            self.row_filter.search = input.clone();
            self.reclamp_runs();
        }
    }

    pub fn search_pop(&mut self) {
        if let Some(input) = &mut self.search_input {
            input.pop();
            self.row_filter.search = input.clone();
            self.reclamp_runs();
        }
    }

    pub fn commit_search(&mut self) {
        self.search_input = None;
    }

    pub fn cancel_search(&mut self) {
        self.search_input = None;
        self.row_filter.search.clear();
        self.reclamp_runs();
    }

    pub fn is_searching(&self) -> bool {
        self.search_input.is_some()
    }

    fn reclamp_runs(&mut self) {
        let lines = self.line_count(Pane::Runs);
        self.runs.clamp(lines);
    }

    pub fn current_run_line(&self) -> Option<RunLine<'_>> {
        self.run_lines().into_iter().nth(self.runs.cursor)
    }

    pub fn current_event(&self) -> Option<&EventRecord> {
        self.events.snapshot.data.get(self.events.cursor)
    }

    /// Whether the pane on screen has a fetch outstanding.
    pub fn is_loading(&self) -> bool {
        let (loading, more) = match self.pane {
            Pane::Runs => (self.runs.snapshot.is_loading, self.runs.snapshot.is_loading_more),
            Pane::Events => (
                self.events.snapshot.is_loading,
                self.events.snapshot.is_loading_more,
            ),
        };
        loading || more
    }

    pub fn open_details(&mut self) {
        self.detail = match self.pane {
            Pane::Runs => self.current_run_line().map(|line| run_details(&line, Utc::now())),
            Pane::Events => self.current_event().map(event_details),
        };
    }

    pub fn close_details(&mut self) {
        self.detail = None;
    }

    pub fn has_detail_overlay(&self) -> bool {
        self.detail.is_some()
    }

    pub fn advance_spinner(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAME_COUNT;
    }

    pub fn set_error(&mut self, msg: String) {
        self.error = Some((msg, std::time::Instant::now()));
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn prune_error(&mut self) {
        if let Some((_, ts)) = &self.error {
            if ts.elapsed().as_secs() >= ERROR_TTL_SECS {
                self.error = None;
            }
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|(msg, _)| msg.as_str())
    }
}

fn yes_no(b: bool) -> String {
    if b { "yes" } else { "no" }.to_string()
}

pub fn run_details(line: &RunLine<'_>, now: DateTime<Utc>) -> DetailOverlay {
    match line {
        RunLine::Group {
            run_name,
            status,
            workflows,
        } => DetailOverlay {
            title: (*run_name).to_string(),
            lines: vec![
                ("Run".to_string(), (*run_name).to_string()),
                ("Status".to_string(), status.to_string()),
                ("Workflows".to_string(), workflows.to_string()),
            ],
        },
        RunLine::Workflow { row, .. } => {
            let full_name = row.full_name().to_string();
            let mut lines = vec![
                ("Name".to_string(), full_name.clone()),
                ("Status".to_string(), row.status.to_string()),
                ("Running".to_string(), yes_no(row.status.is_running())),
                ("Finished".to_string(), yes_no(row.status.is_finished())),
                ("Failed".to_string(), yes_no(row.status.is_failed())),
                ("Resumable".to_string(), yes_no(row.status.is_resumable())),
                ("Runner".to_string(), row.runner_name.clone()),
                (
                    "Submitted".to_string(),
                    format!(
                        "{} ({} ago)",
                        row.submitted_at.format("%Y-%m-%d %H:%M:%S UTC"),
                        run::format_age(row.submitted_at, now)
                    ),
                ),
            ];
            if let Some(tag) = &row.tag_name {
                lines.push(("Tag".to_string(), tag.clone()));
            }
            if let Some(repo) = &row.repo_url {
                lines.push(("Repo".to_string(), repo.clone()));
            }
            lines.extend(
                row.variables
                    .iter()
                    .map(|(k, v)| (format!("${k}"), v.clone())),
            );
            DetailOverlay {
                title: full_name,
                lines,
            }
        }
    }
}

pub fn event_details(event: &EventRecord) -> DetailOverlay {
    let mut lines = vec![
        ("Id".to_string(), event.id.clone()),
        ("Message".to_string(), event.message.clone()),
        (
            "Recorded".to_string(),
            event.recorded_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        ),
        (
            "Actor".to_string(),
            event.actor_user.clone().unwrap_or_else(|| "-".to_string()),
        ),
    ];
    for target in &event.targets {
        let value = match &target.project_name {
            Some(project) => format!("{project}/{}", target.name),
            None => target.name.clone(),
        };
        lines.push((format!("Target {}", target.kind), value));
    }
    DetailOverlay {
        title: event.message.clone(),
        lines,
    }
}

/// A first-page error that was not present in the previous snapshot.
fn new_error<T>(old: &ListSnapshot<T>, new: &ListSnapshot<T>) -> Option<String> {
    match &new.error {
        Some(err) if old.error.as_ref() != Some(err) => Some(err.clone()),
        _ => None,
    }
}
