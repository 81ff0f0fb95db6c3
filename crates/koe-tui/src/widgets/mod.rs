// TUI widget modules for each screen zone.

pub mod board;
pub mod draft;
pub mod key_points;
pub mod status_bar;
