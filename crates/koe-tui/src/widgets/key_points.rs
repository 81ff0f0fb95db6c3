// Key points widget: extraction progress, extracted points, submit hint.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use koe_core::protocol::{ComposerPhase, ComposerSnapshot};

use crate::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let paragraph = Paragraph::new(key_point_lines(&state.composer))
        .block(Block::default().borders(Borders::ALL).title("Key Points"))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

/// Lines for the panel, driven entirely by the composer snapshot.
pub fn key_point_lines(snapshot: &ComposerSnapshot) -> Vec<Line<'static>> {
    let dim = Style::default().fg(Color::DarkGray);

    if snapshot.is_extracting() {
        return vec![Line::from(Span::styled("Extracting key points...", dim))];
    }

    let mut lines: Vec<Line<'static>> = snapshot
        .extracted_points
        .iter()
        .map(|point| Line::from(format!("• {}", point)))
        .collect();

    if lines.is_empty() {
        lines.push(Line::from(Span::styled("Press e to check key points", dim)));
        return lines;
    }

    if snapshot.submit_offered {
        lines.push(Line::default());
        let hint = match snapshot.phase {
            ComposerPhase::Submitting => Span::styled("Submitting...", dim),
            _ => Span::styled(
                "Press s to submit",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
        };
        lines.push(Line::from(hint));
    }
    lines
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
