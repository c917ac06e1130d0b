use runboard::api::{ApiClient, EventsSource, RunListFilter, RunsSource};
use runboard::app::{AppState, Pane};
use runboard::cli::{self, Cli};
use runboard::event_list::EventListFilter;
use runboard::events::{AppEvent, EventHandler};
use runboard::input::{self, Action, InputContext};
use runboard::loader::{InfiniteLoader, LoaderConfig, LoaderHandle};
use runboard::tui;
use runboard::viewport::TerminalViewport;

use clap::Parser;
use color_eyre::eyre::{eyre, Result};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen, SetTitle};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};

fn setup_verbose_logging() -> Result<()> {
    let state_dir = dirs_next_or_fallback();
    std::fs::create_dir_all(&state_dir)
        .map_err(|e| eyre!("Failed to create log directory {state_dir:?}: {e}"))?;
    let log_path = state_dir.join("debug.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| eyre!("Failed to open log file {log_path:?}: {e}"))?;
    tracing_subscriber::fmt()
        .with_writer(file)
        .with_ansi(false)
        .init();
    tracing::info!("runboard v{} starting with verbose logging", cli::VERSION);
    Ok(())
}

fn dirs_next_or_fallback() -> std::path::PathBuf {
    if let Some(state) = std::env::var_os("XDG_STATE_HOME") {
        std::path::PathBuf::from(state).join("runboard")
    } else if let Some(home) = std::env::var_os("HOME") {
        std::path::PathBuf::from(home)
            .join(".local")
            .join("state")
            .join("runboard")
    } else {
        std::path::PathBuf::from("/tmp/runboard")
    }
}

fn spawn_monitored(
    tx: mpsc::UnboundedSender<AppEvent>,
    label: &'static str,
    fut: impl Future<Output = ()> + Send + 'static,
) {
    tokio::spawn(async move {
        let handle = tokio::spawn(fut);
        if let Err(join_err) = handle.await {
            let msg = if join_err.is_panic() {
                match join_err.into_panic().downcast::<String>() {
                    Ok(s) => *s,
                    Err(payload) => match payload.downcast::<&str>() {
                        Ok(s) => s.to_string(),
                        Err(_) => "unknown panic".to_string(),
                    },
                }
            } else {
                "task cancelled".to_string()
            };
            tracing::error!("{label} panicked: {msg}");
            if tx
                .send(AppEvent::Error(format!("{label} crashed: {msg}")))
                .is_err()
            {
                tracing::warn!("{label}: channel closed while reporting panic");
            }
        }
    });
}

/// Turns every snapshot publish into one wake-up of the main loop.
fn forward_changes<T: Send + Sync + 'static>(
    tx: mpsc::UnboundedSender<AppEvent>,
    label: &'static str,
    mut rx: watch::Receiver<T>,
    event: fn() -> AppEvent,
) {
    let tx2 = tx.clone();
    spawn_monitored(tx, label, async move {
        while rx.changed().await.is_ok() {
            if tx2.send(event()).is_err() {
                break;
            }
        }
        tracing::debug!("{label}: loader stopped");
    });
}

/// Everything the main loop needs besides the terminal and state.
struct Session {
    runs: LoaderHandle<RunsSource>,
    events: LoaderHandle<EventsSource>,
    runs_viewport: Arc<TerminalViewport>,
    events_viewport: Arc<TerminalViewport>,
    project: String,
    repo_url: Option<String>,
}

impl Session {
    fn run_filter(&self, only_active: bool) -> RunListFilter {
        RunListFilter {
            project: self.project.clone(),
            repo_url: self.repo_url.clone(),
            only_active,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    // Setup verbose logging
    if args.verbose {
        setup_verbose_logging()?;
    }

    // Fail on bad input before touching the terminal
    let event_filter = EventListFilter::from_tokens(&args.event_filter)?;
    let client = ApiClient::new(&args.url, args.token.clone())?;
    let config = LoaderConfig {
        limit: usize::try_from(args.limit).unwrap_or(usize::MAX),
        scroll_threshold: args.threshold,
    };
    tracing::info!(
        url = %client.base_url(),
        project = %args.project,
        limit = config.limit,
        "starting"
    );

    let mut state = AppState::new(args.project.clone(), args.url.clone(), event_filter.clone());
    state.config.version_string = format!("runboard v{}", cli::VERSION);
    state.grouped = !args.flat;
    state.only_active = args.active;
    state.row_filter.tag = args.tag.clone();
    state.row_filter.search = args.search.clone().unwrap_or_default();
    state.pending_focus = args.focus.clone();

    // Setup terminal with panic hook early, before any data fetching
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        if let Err(e) = terminal::disable_raw_mode() {
            eprintln!("Failed to disable raw mode during panic: {e}");
        }
        if let Err(e) = execute!(io::stdout(), LeaveAlternateScreen, SetTitle("")) {
            eprintln!("Failed to leave alternate screen during panic: {e}");
        }
        original_hook(panic_info);
    }));

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        SetTitle(format!("runboard {}", args.project))
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Event handler
    let events = EventHandler::new(Duration::from_millis(100));
    let tx = events.sender();

    let runs_viewport = Arc::new(TerminalViewport::new());
    let events_viewport = Arc::new(TerminalViewport::new());

    let (runs_loader, runs) = InfiniteLoader::new(
        Arc::new(RunsSource::new(client.clone())),
        runs_viewport.clone(),
        RunListFilter {
            project: args.project.clone(),
            repo_url: args.repo_url.clone(),
            only_active: args.active,
        },
        config,
    );
    spawn_monitored(tx.clone(), "runs loader", runs_loader.run());

    let (events_loader, events_handle) = InfiniteLoader::new(
        Arc::new(EventsSource::new(client)),
        events_viewport.clone(),
        event_filter,
        config,
    );
    spawn_monitored(tx.clone(), "events loader", events_loader.run());

    forward_changes(tx.clone(), "runs watch", runs.subscribe(), || {
        AppEvent::RunsChanged
    });
    forward_changes(
        tx.clone(),
        "events watch",
        events_handle.subscribe(),
        || AppEvent::EventsChanged,
    );

    let session = Session {
        runs,
        events: events_handle,
        runs_viewport,
        events_viewport,
        project: args.project.clone(),
        repo_url: args.repo_url.clone(),
    };

    let result = run_app(&mut terminal, &mut state, events, &session).await;

    // Restore terminal
    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, SetTitle(""))?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState,
    mut events: EventHandler,
    session: &Session,
) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        let size = terminal.size()?;
        state.set_visible_rows(tui::render::list_rows(size.height));

        // Render
        terminal.draw(|f| tui::render::render(f, state))?;

        // Report list geometry: a changed offset is a scroll for the loader
        session.runs_viewport.report(
            state.runs.snapshot.data.len(),
            state.line_count(Pane::Runs),
            state.runs.visible_rows,
            state.runs.offset,
        );
        session.events_viewport.report(
            state.events.snapshot.data.len(),
            state.line_count(Pane::Events),
            state.events.visible_rows,
            state.events.offset,
        );

        state.prune_error();

        let Some(event) = events.next().await else {
            return Ok(());
        };
        match event {
            AppEvent::Key(key) => {
                let ctx = InputContext {
                    has_error: state.error.is_some(),
                    is_loading: state.is_loading(),
                    searching: state.is_searching(),
                    overlay: state.has_detail_overlay(),
                    on_runs: state.pane == Pane::Runs,
                };
                handle_action(state, session, input::map_key(key, &ctx));
            }
            AppEvent::Resize => {}
            AppEvent::Tick => {
                if last_tick.elapsed() >= Duration::from_millis(100) {
                    state.advance_spinner();
                    last_tick = Instant::now();
                }
            }
            AppEvent::RunsChanged => state.apply_runs(session.runs.snapshot()),
            AppEvent::EventsChanged => state.apply_events(session.events.snapshot()),
            AppEvent::Error(e) => state.set_error(e),
        }

        if state.should_quit {
            return Ok(());
        }
    }
}

fn handle_action(state: &mut AppState, session: &Session, action: Action) {
    match action {
        Action::Quit => state.should_quit = true,
        Action::DismissError => state.clear_error(),
        Action::MoveUp => state.move_cursor_up(1),
        Action::MoveDown => state.move_cursor_down(1),
        Action::PageUp => {
            let n = state.page_size();
            state.move_cursor_up(n);
        }
        Action::PageDown => {
            let n = state.page_size();
            state.move_cursor_down(n);
        }
        Action::Top => state.move_to_top(),
        Action::Bottom => {
            state.move_to_bottom();
            match state.pane {
                Pane::Runs => session.runs.load_more(),
                Pane::Events => session.events.load_more(),
            };
        }
        Action::SwitchPane => state.switch_pane(),
        Action::Refresh => {
            tracing::info!(pane = ?state.pane, "refresh");
            match state.pane {
                Pane::Runs => session.runs.refresh(),
                Pane::Events => session.events.refresh(),
            };
        }
        Action::ToggleActive => {
            state.toggle_only_active();
            session
                .runs
                .set_filter(session.run_filter(state.only_active));
        }
        Action::ToggleGrouped => state.toggle_grouped(),
        Action::CycleTag => state.cycle_tag(),
        Action::StartSearch => state.start_search(),
        Action::SearchInput(c) => state.search_push(c),
        Action::SearchBackspace => state.search_pop(),
        Action::SearchCommit => state.commit_search(),
        Action::SearchCancel => state.cancel_search(),
        Action::ShowDetails => state.open_details(),
        Action::CloseOverlay => state.close_details(),
        Action::None => {}
    }
}
