// Terminal UI: layout, input handling, and widget rendering.
//
// The TUI owns a `ViewState` that mirrors what the app orchestrator reports,
// plus view-local state (the draft buffer, edit mode, the selected comment).
// The orchestrator pushes `UiUpdate` messages over an mpsc channel; the TUI
// applies them to `ViewState` and re-renders at ~30 fps.

pub mod input;
pub mod layout;
pub mod widgets;

use std::time::Duration;

use chrono::{DateTime, Local};
use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use koe_core::comment::{Comment, VisibilityFilter};
use koe_core::protocol::{ComposerSnapshot, ConnectionStatus, Notice, UiUpdate, UserCommand};

use layout::{build_layout, AppLayout};

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// TUI-local state that mirrors the application state for rendering.
#[derive(Debug, Default)]
pub struct ViewState {
    /// The draft being composed. Owned by the view; sent with each
    /// extract/submit command.
    pub draft: String,
    /// Whether keystrokes go into the draft.
    pub edit_mode: bool,
    pub composer: ComposerSnapshot,
    pub comments: Vec<Comment>,
    pub filter: VisibilityFilter,
    pub refreshed_at: Option<DateTime<Local>>,
    /// Index of the highlighted card on the board.
    pub selected: usize,
    /// Most recent notice; replaced by the next one.
    pub notice: Option<Notice>,
    pub connection_status: ConnectionStatus,
}

// ---------------------------------------------------------------------------
// UiUpdate processing
// ---------------------------------------------------------------------------

/// Apply a single UiUpdate to the ViewState.
pub fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::Composer(snapshot) => {
            state.composer = snapshot;
        }
        UiUpdate::DraftCleared => {
            state.draft.clear();
            state.edit_mode = false;
        }
        UiUpdate::Comments {
            comments,
            filter,
            refreshed_at,
        } => {
            state.comments = comments;
            state.filter = filter;
            state.refreshed_at = Some(refreshed_at);
            // Keep the selection on a card that still exists.
            state.selected = state.selected.min(state.comments.len().saturating_sub(1));
        }
        UiUpdate::Filter(filter) => {
            state.filter = filter;
        }
        UiUpdate::Notice(notice) => {
            state.notice = Some(notice);
        }
        UiUpdate::ConnectionStatus(status) => {
            state.connection_status = status;
        }
    }
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

/// Render the complete frame.
pub fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area());

    widgets::status_bar::render(frame, layout.status_bar, state);
    widgets::draft::render(frame, layout.draft, state, state.edit_mode);
    widgets::key_points::render(frame, layout.key_points, state);
    widgets::board::render(frame, layout.board, state);
    render_help_bar(frame, &layout, state);
}

fn render_help_bar(frame: &mut Frame, layout: &AppLayout, state: &ViewState) {
    let paragraph = Paragraph::new(Line::from(vec![Span::styled(
        help_text(state),
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::DIM),
    )]))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, layout.help_bar);
}

pub fn help_text(state: &ViewState) -> &'static str {
    if state.edit_mode {
        " Esc:Done | Enter:Newline | Backspace:Delete | Ctrl+C:Quit"
    } else {
        " i:Edit | e:Extract | s:Submit | j/k:Select | v:Visibility | p:Private | r:Refresh | q:Quit"
    }
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop.
///
/// 1. Initializes the terminal (raw mode, alternate screen).
/// 2. Installs a panic hook to restore the terminal on crash.
/// 3. Runs an async select loop: UI updates, keyboard input, render ticks.
/// 4. Restores the terminal on exit.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = ratatui::restore();
        original_hook(panic_info);
    }));

    let mut view_state = ViewState::default();
    let mut event_stream = EventStream::new();

    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let result = loop {
        tokio::select! {
            // UI updates from the app orchestrator
            update = ui_rx.recv() => {
                match update {
                    Some(ui_update) => apply_ui_update(&mut view_state, ui_update),
                    None => {
                        debug!("UI channel closed");
                        break Ok(());
                    }
                }
            }

            // Keyboard input
            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(cmd) = input::handle_key(key_event, &mut view_state) {
                            let quit = cmd == UserCommand::Quit;
                            let _ = cmd_tx.send(cmd).await;
                            if quit {
                                break Ok(());
                            }
                        }
                    }
                    Some(Ok(_)) => {
                        // Mouse and resize events: the next tick redraws.
                    }
                    Some(Err(e)) => {
                        warn!("Terminal input error: {}", e);
                        break Err(e.into());
                    }
                    None => break Ok(()),
                }
            }

            _ = render_tick.tick() => {
                if let Err(e) = terminal.draw(|frame| render_frame(frame, &view_state)) {
                    break Err(e.into());
                }
            }
        }
    };

    ratatui::restore();
    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
