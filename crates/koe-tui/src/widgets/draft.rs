// Draft editor widget: the comment being composed.

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::ViewState;

const PLACEHOLDER: &str =
    "Press i to write a comment. Comments are published; do not include personal information.";

/// Render the draft editor.
///
/// When `focused` is true (edit mode) the border is highlighted and a cursor
/// marker follows the text.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState, focused: bool) {
    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let title = if focused { "Draft (editing, Esc to stop)" } else { "Draft" };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(title);

    let paragraph = if state.draft.is_empty() && !focused {
        Paragraph::new(PLACEHOLDER).style(Style::default().fg(Color::DarkGray))
    } else {
        Paragraph::new(draft_text(&state.draft, focused))
    };

    frame.render_widget(paragraph.block(block).wrap(Wrap { trim: false }), area);
}

/// Draft text as displayed, with a trailing cursor marker while editing.
pub fn draft_text(draft: &str, focused: bool) -> String {
    if focused {
        format!("{}_", draft)
    } else {
        draft.to_string()
    }
}
