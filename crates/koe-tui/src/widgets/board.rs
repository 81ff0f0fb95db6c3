// Comment board widget: one card per comment.
//
// Each card: "[Public] {content}" followed by one bullet per key point.
// Public cards are green-tagged, private ones yellow.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use koe_core::comment::Comment;

use crate::widgets::status_bar::filter_label;
use crate::ViewState;

/// Render the comment board.
///
/// The selected card is highlighted; the list scrolls to keep it visible.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let title = format!(
        "Comments ({}, {})",
        state.comments.len(),
        filter_label(state.filter)
    );
    let block = Block::default().borders(Borders::ALL).title(title);

    if state.comments.is_empty() {
        let paragraph = Paragraph::new("  No comments yet.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = state
        .comments
        .iter()
        .map(|c| ListItem::new(card_lines(c)))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    let mut list_state = ListState::default().with_selected(Some(state.selected));
    frame.render_stateful_widget(list, area, &mut list_state);
}

/// Tag text and color for a comment's visibility.
pub fn visibility_tag(is_public: bool) -> (&'static str, Color) {
    if is_public {
        ("[Public]", Color::Green)
    } else {
        ("[Private]", Color::Yellow)
    }
}

/// Lines making up one card. Multi-line content keeps its line breaks.
pub fn card_lines(comment: &Comment) -> Vec<Line<'static>> {
    let (tag, color) = visibility_tag(comment.is_public);
    let mut content = comment.content.lines();

    let mut lines = vec![Line::from(vec![
        Span::styled(tag, Style::default().fg(color)),
        Span::raw(" "),
        Span::raw(content.next().unwrap_or_default().to_string()),
    ])];
    lines.extend(content.map(|l| Line::from(format!("  {}", l))));
    lines.extend(comment.key_points.iter().map(|point| {
        Line::from(Span::styled(
            format!("  • {}", point),
            Style::default().fg(Color::Gray),
        ))
    }));
    lines
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
