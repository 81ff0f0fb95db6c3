// Status bar widget: connection, board filter, last refresh, latest notice.

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use koe_core::comment::VisibilityFilter;
use koe_core::protocol::{ConnectionStatus, Notice, NoticeLevel};

use crate::ViewState;

/// Render the status bar into the given area.
///
/// Layout: [connection] [filter] [last refresh] [notice]
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let (dot, dot_color, label) = connection_indicator(state.connection_status);
    let mut spans = vec![
        Span::styled(format!(" {} ", dot), Style::default().fg(dot_color)),
        Span::styled(label, Style::default().fg(Color::White)),
        Span::styled(" | ", Style::default().fg(Color::Gray)),
        Span::styled(filter_label(state.filter), Style::default().fg(Color::White)),
    ];

    if let Some(at) = state.refreshed_at {
        spans.push(Span::styled(" | ", Style::default().fg(Color::Gray)));
        spans.push(Span::styled(
            format!("updated {}", at.format("%H:%M:%S")),
            Style::default().fg(Color::Gray),
        ));
    }

    if let Some(notice) = &state.notice {
        spans.push(Span::styled(" | ", Style::default().fg(Color::Gray)));
        spans.push(notice_span(notice));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

/// Return the connection dot, its color, and a short label.
pub fn connection_indicator(status: ConnectionStatus) -> (&'static str, Color, &'static str) {
    match status {
        ConnectionStatus::Connected => ("●", Color::Green, "connected"),
        ConnectionStatus::Unreachable => ("●", Color::Red, "unreachable"),
        ConnectionStatus::Unknown => ("○", Color::DarkGray, "connecting"),
    }
}

pub fn filter_label(filter: VisibilityFilter) -> &'static str {
    match filter {
        VisibilityFilter::PublicOnly => "public only",
        VisibilityFilter::IncludePrivate => "showing private",
    }
}

fn notice_span(notice: &Notice) -> Span<'static> {
    let color = match notice.level {
        NoticeLevel::Info => Color::Cyan,
        NoticeLevel::Error => Color::Red,
    };
    Span::styled(notice.text.clone(), Style::default().fg(color))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
