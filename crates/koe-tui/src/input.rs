// Keyboard input handling and command dispatch.
//
// Translates crossterm key events into UserCommand messages for the app
// orchestrator, or into local ViewState mutations (draft editing, selection).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use koe_core::comment::is_blank;
use koe_core::protocol::UserCommand;

use crate::ViewState;

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to the
/// app orchestrator. Returns `None` when it was handled locally or ignored
/// because the matching control is disabled.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // Only process key press events. On Windows, crossterm emits both
    // Press and Release events for each physical keypress.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    // Ctrl+C always quits, even while editing.
    if key_event.modifiers.contains(KeyModifiers::CONTROL)
        && key_event.code == KeyCode::Char('c')
    {
        return Some(UserCommand::Quit);
    }

    if view_state.edit_mode {
        return handle_edit_mode(key_event, view_state);
    }

    match key_event.code {
        KeyCode::Char('i') => {
            view_state.edit_mode = true;
            None
        }
        KeyCode::Char('e') => {
            if is_blank(&view_state.draft) || view_state.composer.is_extracting() {
                return None;
            }
            Some(UserCommand::Extract {
                content: view_state.draft.clone(),
            })
        }
        KeyCode::Char('s') => {
            if !view_state.composer.submit_offered || view_state.composer.is_submitting() {
                return None;
            }
            Some(UserCommand::Submit {
                content: view_state.draft.clone(),
            })
        }
        KeyCode::Char('p') => Some(UserCommand::ToggleFilter),
        KeyCode::Char('r') => Some(UserCommand::Refresh),

        // Board selection
        KeyCode::Down | KeyCode::Char('j') => {
            select_next(view_state);
            None
        }
        KeyCode::Up | KeyCode::Char('k') => {
            view_state.selected = view_state.selected.saturating_sub(1);
            None
        }
        KeyCode::Char('v') | KeyCode::Char(' ') => {
            if view_state.comments.is_empty() {
                return None;
            }
            Some(UserCommand::ToggleVisibility {
                index: view_state.selected,
            })
        }

        KeyCode::Char('q') => Some(UserCommand::Quit),
        _ => None,
    }
}

/// Keys while the draft editor has focus: characters and Enter go into the
/// buffer, Backspace deletes, Esc returns to normal mode.
fn handle_edit_mode(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Esc => view_state.edit_mode = false,
        KeyCode::Enter => view_state.draft.push('\n'),
        KeyCode::Backspace => {
            view_state.draft.pop();
        }
        KeyCode::Char(c) => view_state.draft.push(c),
        _ => {}
    }
    None
}

fn select_next(view_state: &mut ViewState) {
    let last = view_state.comments.len().saturating_sub(1);
    view_state.selected = (view_state.selected + 1).min(last);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;
    use koe_core::comment::Comment;
    use koe_core::protocol::{ComposerPhase, ComposerSnapshot};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn ctrl_key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn comment(content: &str) -> Comment {
        Comment {
            id: None,
            content: content.to_string(),
            key_points: vec![],
            is_public: true,
        }
    }

    fn with_comments(n: usize) -> ViewState {
        let mut state = ViewState::default();
        state.comments = (0..n).map(|i| comment(&format!("c{}", i))).collect();
        state
    }

    fn points_ready() -> ComposerSnapshot {
        ComposerSnapshot {
            phase: ComposerPhase::PointsReady,
            extracted_points: vec!["traffic safety".into()],
            submit_offered: true,
        }
    }

    // -- Edit mode --

    #[test]
    fn i_enters_edit_mode() {
        let mut state = ViewState::default();
        assert!(handle_key(key(KeyCode::Char('i')), &mut state).is_none());
        assert!(state.edit_mode);
    }

    #[test]
    fn edit_mode_captures_text() {
        let mut state = ViewState::default();
        state.edit_mode = true;
        for c in "road q".chars() {
            assert!(handle_key(key(KeyCode::Char(c)), &mut state).is_none());
        }
        handle_key(key(KeyCode::Enter), &mut state);
        handle_key(key(KeyCode::Char('x')), &mut state);
        assert_eq!(state.draft, "road q\nx");
    }

    #[test]
    fn edit_mode_backspace_removes_char() {
        let mut state = ViewState::default();
        state.edit_mode = true;
        state.draft = "ab".into();
        handle_key(key(KeyCode::Backspace), &mut state);
        assert_eq!(state.draft, "a");
        handle_key(key(KeyCode::Backspace), &mut state);
        handle_key(key(KeyCode::Backspace), &mut state);
        assert!(state.draft.is_empty());
    }

    #[test]
    fn esc_leaves_edit_mode_keeping_text() {
        let mut state = ViewState::default();
        state.edit_mode = true;
        state.draft = "keep me".into();
        handle_key(key(KeyCode::Esc), &mut state);
        assert!(!state.edit_mode);
        assert_eq!(state.draft, "keep me");
    }

    #[test]
    fn edit_mode_ctrl_c_still_quits() {
        let mut state = ViewState::default();
        state.edit_mode = true;
        assert_eq!(
            handle_key(ctrl_key(KeyCode::Char('c')), &mut state),
            Some(UserCommand::Quit)
        );
    }

    // -- Composer controls --

    #[test]
    fn e_sends_draft_for_extraction() {
        let mut state = ViewState::default();
        state.draft = "road widening concerns".into();
        assert_eq!(
            handle_key(key(KeyCode::Char('e')), &mut state),
            Some(UserCommand::Extract {
                content: "road widening concerns".into()
            })
        );
    }

    #[test]
    fn e_ignored_for_blank_draft() {
        let mut state = ViewState::default();
        state.draft = "   \n".into();
        assert!(handle_key(key(KeyCode::Char('e')), &mut state).is_none());
    }

    #[test]
    fn e_ignored_while_extracting() {
        let mut state = ViewState::default();
        state.draft = "x".into();
        state.composer.phase = ComposerPhase::Extracting;
        assert!(handle_key(key(KeyCode::Char('e')), &mut state).is_none());
    }

    #[test]
    fn s_ignored_until_submit_offered() {
        let mut state = ViewState::default();
        state.draft = "road widening concerns".into();
        assert!(handle_key(key(KeyCode::Char('s')), &mut state).is_none());

        state.composer = points_ready();
        assert_eq!(
            handle_key(key(KeyCode::Char('s')), &mut state),
            Some(UserCommand::Submit {
                content: "road widening concerns".into()
            })
        );
    }

    #[test]
    fn s_ignored_while_submitting() {
        let mut state = ViewState::default();
        state.draft = "x".into();
        state.composer = points_ready();
        state.composer.phase = ComposerPhase::Submitting;
        assert!(handle_key(key(KeyCode::Char('s')), &mut state).is_none());
    }

    // -- Board controls --

    #[test]
    fn p_toggles_filter_and_r_refreshes() {
        let mut state = ViewState::default();
        assert_eq!(
            handle_key(key(KeyCode::Char('p')), &mut state),
            Some(UserCommand::ToggleFilter)
        );
        assert_eq!(
            handle_key(key(KeyCode::Char('r')), &mut state),
            Some(UserCommand::Refresh)
        );
    }

    #[test]
    fn selection_moves_within_bounds() {
        let mut state = with_comments(3);
        handle_key(key(KeyCode::Char('j')), &mut state);
        handle_key(key(KeyCode::Down), &mut state);
        handle_key(key(KeyCode::Down), &mut state);
        assert_eq!(state.selected, 2);

        handle_key(key(KeyCode::Char('k')), &mut state);
        assert_eq!(state.selected, 1);
        handle_key(key(KeyCode::Up), &mut state);
        handle_key(key(KeyCode::Up), &mut state);
        assert_eq!(state.selected, 0);
    }

    #[test]
    fn v_and_space_toggle_selected_comment() {
        let mut state = with_comments(2);
        state.selected = 1;
        assert_eq!(
            handle_key(key(KeyCode::Char('v')), &mut state),
            Some(UserCommand::ToggleVisibility { index: 1 })
        );
        assert_eq!(
            handle_key(key(KeyCode::Char(' ')), &mut state),
            Some(UserCommand::ToggleVisibility { index: 1 })
        );
    }

    #[test]
    fn v_ignored_on_empty_board() {
        let mut state = ViewState::default();
        assert!(handle_key(key(KeyCode::Char('v')), &mut state).is_none());
    }

    #[test]
    fn q_quits_in_normal_mode() {
        let mut state = ViewState::default();
        assert_eq!(
            handle_key(key(KeyCode::Char('q')), &mut state),
            Some(UserCommand::Quit)
        );
    }

    #[test]
    fn release_events_are_ignored() {
        let mut state = ViewState::default();
        let mut event = key(KeyCode::Char('q'));
        event.kind = KeyEventKind::Release;
        assert!(handle_key(event, &mut state).is_none());
    }
}
