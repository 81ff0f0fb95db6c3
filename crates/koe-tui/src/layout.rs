// Screen layout: panel arrangement and sizing.
//
// +--------------------------------------------------+
// | Status Bar (1 row)                                |
// +-------------------------+------------------------+
// | Draft (60%)              | Key Points (40%)       |
// | (9 rows)                 |                        |
// +-------------------------+------------------------+
// | Comment Board (fill)                              |
// +--------------------------------------------------+
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Height of the composer row, borders included.
const COMPOSER_HEIGHT: u16 = 9;

/// Resolved screen areas for each zone.
#[derive(Debug, Clone)]
pub struct AppLayout {
    /// Top row: connection, filter, last refresh, latest notice.
    pub status_bar: Rect,
    /// Draft editing buffer.
    pub draft: Rect,
    /// Extracted key points and the submit hint.
    pub key_points: Rect,
    /// Published comments.
    pub board: Rect,
    /// Bottom row: keyboard shortcut hints.
    pub help_bar: Rect,
}

pub fn build_layout(area: Rect) -> AppLayout {
    // Vertical: status(1) | composer(9) | board(fill) | help(1)
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(COMPOSER_HEIGHT),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    let composer = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(vertical[1]);

    AppLayout {
        status_bar: vertical[0],
        draft: composer[0],
        key_points: composer[1],
        board: vertical[2],
        help_bar: vertical[3],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
