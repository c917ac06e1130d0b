use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    Quit,
    DismissError,
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    Top,
    Bottom,
    SwitchPane,
    Refresh,
    ToggleActive,
    ToggleGrouped,
    CycleTag,
    StartSearch,
    SearchInput(char),
    SearchBackspace,
    SearchCommit,
    SearchCancel,
    ShowDetails,
    CloseOverlay,
    None,
}

/// Captures the UI state needed to interpret a key press.
#[derive(Debug, Clone, Default)]
pub struct InputContext {
    pub has_error: bool,
    pub is_loading: bool,
    /// Search prompt open: printable keys edit the query.
    pub searching: bool,
    pub overlay: bool,
    /// Runs-only keys (`g`, `t`, `a`, `/`) are ignored on the events pane.
    pub on_runs: bool,
}

pub fn map_key(key: KeyEvent, ctx: &InputContext) -> Action {
    if key.kind != KeyEventKind::Press {
        return Action::None;
    }

    // Ctrl+C always quits
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }

    if ctx.overlay {
        return match key.code {
            KeyCode::Char('q' | 'd') | KeyCode::Esc | KeyCode::Enter => Action::CloseOverlay,
            _ => Action::None,
        };
    }

    if ctx.searching {
        return match key.code {
            KeyCode::Enter => Action::SearchCommit,
            KeyCode::Esc => Action::SearchCancel,
            KeyCode::Backspace => Action::SearchBackspace,
            KeyCode::Char(c) => Action::SearchInput(c),
            _ => Action::None,
        };
    }

    match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Esc => {
            if ctx.has_error {
                Action::DismissError
            } else {
                Action::Quit
            }
        }
        KeyCode::Up | KeyCode::Char('k') => Action::MoveUp,
        KeyCode::Down | KeyCode::Char('j') => Action::MoveDown,
        KeyCode::PageUp => Action::PageUp,
        KeyCode::PageDown | KeyCode::Char(' ') => Action::PageDown,
        KeyCode::Home => Action::Top,
        KeyCode::End | KeyCode::Char('G') => Action::Bottom,
        KeyCode::Tab | KeyCode::BackTab => Action::SwitchPane,
        KeyCode::Char('r') if !ctx.is_loading => Action::Refresh,
        KeyCode::Char('d') | KeyCode::Enter => Action::ShowDetails,
        KeyCode::Char('a') if ctx.on_runs => Action::ToggleActive,
        KeyCode::Char('g') if ctx.on_runs => Action::ToggleGrouped,
        KeyCode::Char('t') if ctx.on_runs => Action::CycleTag,
        KeyCode::Char('/') if ctx.on_runs => Action::StartSearch,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn press_with(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn release(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        }
    }

    fn ctx() -> InputContext {
        InputContext { on_runs: true, ..Default::default() }
    }

    fn ctx_events() -> InputContext {
        InputContext::default()
    }

    fn ctx_error() -> InputContext {
        InputContext { has_error: true, ..ctx() }
    }

    fn ctx_loading() -> InputContext {
        InputContext { is_loading: true, ..ctx() }
    }

    fn ctx_search() -> InputContext {
        InputContext { searching: true, ..ctx() }
    }

    fn ctx_overlay() -> InputContext {
        InputContext { overlay: true, ..ctx() }
    }

    #[test]
    fn quit_on_q() {
        assert_eq!(map_key(press(KeyCode::Char('q')), &ctx()), Action::Quit);
    }

    #[test]
    fn esc_quits_without_error() {
        assert_eq!(map_key(press(KeyCode::Esc), &ctx()), Action::Quit);
    }

    #[test]
    fn esc_dismisses_error_when_present() {
        assert_eq!(map_key(press(KeyCode::Esc), &ctx_error()), Action::DismissError);
    }

    #[test]
    fn ctrl_c_quits() {
        assert_eq!(
            map_key(press_with(KeyCode::Char('c'), KeyModifiers::CONTROL), &ctx()),
            Action::Quit
        );
    }

    #[test]
    fn vertical_movement() {
        assert_eq!(map_key(press(KeyCode::Up), &ctx()), Action::MoveUp);
        assert_eq!(map_key(press(KeyCode::Char('k')), &ctx()), Action::MoveUp);
        assert_eq!(map_key(press(KeyCode::Down), &ctx()), Action::MoveDown);
        assert_eq!(map_key(press(KeyCode::Char('j')), &ctx()), Action::MoveDown);
    }

    #[test]
    fn paging_and_jumps() {
        assert_eq!(map_key(press(KeyCode::PageUp), &ctx()), Action::PageUp);
        assert_eq!(map_key(press(KeyCode::PageDown), &ctx()), Action::PageDown);
        assert_eq!(map_key(press(KeyCode::Char(' ')), &ctx()), Action::PageDown);
        assert_eq!(map_key(press(KeyCode::Home), &ctx()), Action::Top);
        assert_eq!(map_key(press(KeyCode::End), &ctx()), Action::Bottom);
        assert_eq!(map_key(press(KeyCode::Char('G')), &ctx()), Action::Bottom);
    }

    #[test]
    fn tab_switches_pane() {
        assert_eq!(map_key(press(KeyCode::Tab), &ctx()), Action::SwitchPane);
        assert_eq!(map_key(press(KeyCode::Tab), &ctx_events()), Action::SwitchPane);
    }

    #[test]
    fn refresh_r() {
        assert_eq!(map_key(press(KeyCode::Char('r')), &ctx()), Action::Refresh);
    }

    #[test]
    fn refresh_blocked_while_loading() {
        assert_eq!(map_key(press(KeyCode::Char('r')), &ctx_loading()), Action::None);
    }

    #[test]
    fn runs_pane_keys() {
        assert_eq!(map_key(press(KeyCode::Char('a')), &ctx()), Action::ToggleActive);
        assert_eq!(map_key(press(KeyCode::Char('g')), &ctx()), Action::ToggleGrouped);
        assert_eq!(map_key(press(KeyCode::Char('t')), &ctx()), Action::CycleTag);
        assert_eq!(map_key(press(KeyCode::Char('/')), &ctx()), Action::StartSearch);
    }

    #[test]
    fn runs_pane_keys_ignored_on_events() {
        for c in ['a', 'g', 't', '/'] {
            assert_eq!(map_key(press(KeyCode::Char(c)), &ctx_events()), Action::None);
        }
    }

    #[test]
    fn show_details_d_or_enter() {
        assert_eq!(map_key(press(KeyCode::Char('d')), &ctx()), Action::ShowDetails);
        assert_eq!(map_key(press(KeyCode::Enter), &ctx_events()), Action::ShowDetails);
    }

    #[test]
    fn unbound_key_returns_none() {
        assert_eq!(map_key(press(KeyCode::Char('z')), &ctx()), Action::None);
    }

    #[test]
    fn non_press_event_filtered() {
        assert_eq!(map_key(release(KeyCode::Char('q')), &ctx()), Action::None);
    }

    // --- Search prompt ---

    #[test]
    fn search_captures_printable_keys() {
        assert_eq!(map_key(press(KeyCode::Char('q')), &ctx_search()), Action::SearchInput('q'));
        assert_eq!(map_key(press(KeyCode::Char('j')), &ctx_search()), Action::SearchInput('j'));
    }

    #[test]
    fn search_editing_keys() {
        assert_eq!(map_key(press(KeyCode::Backspace), &ctx_search()), Action::SearchBackspace);
        assert_eq!(map_key(press(KeyCode::Enter), &ctx_search()), Action::SearchCommit);
        assert_eq!(map_key(press(KeyCode::Esc), &ctx_search()), Action::SearchCancel);
        assert_eq!(map_key(press(KeyCode::Down), &ctx_search()), Action::None);
    }

    #[test]
    fn search_ctrl_c_quits() {
        assert_eq!(
            map_key(press_with(KeyCode::Char('c'), KeyModifiers::CONTROL), &ctx_search()),
            Action::Quit
        );
    }

    // --- Detail overlay ---

    #[test]
    fn overlay_close_keys() {
        for code in [KeyCode::Char('d'), KeyCode::Char('q'), KeyCode::Esc, KeyCode::Enter] {
            assert_eq!(map_key(press(code), &ctx_overlay()), Action::CloseOverlay);
        }
    }

    #[test]
    fn overlay_swallows_navigation() {
        assert_eq!(map_key(press(KeyCode::Char('j')), &ctx_overlay()), Action::None);
        assert_eq!(map_key(press(KeyCode::Tab), &ctx_overlay()), Action::None);
    }

    #[test]
    fn overlay_ctrl_c_quits() {
        assert_eq!(
            map_key(press_with(KeyCode::Char('c'), KeyModifiers::CONTROL), &ctx_overlay()),
            Action::Quit
        );
    }
}
