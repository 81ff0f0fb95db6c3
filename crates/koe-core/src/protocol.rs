// Message types passed between the TUI, the app orchestrator, and the
// service tasks it spawns.

use chrono::{DateTime, Local};

use crate::comment::{Comment, CommentId, VisibilityFilter};

// ---------------------------------------------------------------------------
// Composer state shared with the view
// ---------------------------------------------------------------------------

/// Where a draft is in its extract-then-submit lifecycle.
///
/// Success path: `Idle -> Extracting -> PointsReady -> Submitting -> Idle`.
/// A failed call returns to the stable state it started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComposerPhase {
    #[default]
    Idle,
    Extracting,
    PointsReady,
    Submitting,
}

/// What the view needs to draw the composer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComposerSnapshot {
    pub phase: ComposerPhase,
    pub extracted_points: Vec<String>,
    /// Whether the submit control is shown.
    pub submit_offered: bool,
}

impl ComposerSnapshot {
    pub fn is_extracting(&self) -> bool {
        self.phase == ComposerPhase::Extracting
    }

    pub fn is_submitting(&self) -> bool {
        self.phase == ComposerPhase::Submitting
    }
}

// ---------------------------------------------------------------------------
// Status indicators
// ---------------------------------------------------------------------------

/// Reachability of the comment service as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Unknown,
    Connected,
    Unreachable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A one-line message for the status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// TUI -> app
// ---------------------------------------------------------------------------

/// Actions requested by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// Ask the extraction service for key points of the current draft.
    Extract { content: String },
    /// Publish the current draft.
    Submit { content: String },
    /// Flip between public-only and all comments.
    ToggleFilter,
    /// Flip `is_public` of the comment displayed at `index`.
    ToggleVisibility { index: usize },
    /// Re-fetch the comment list.
    Refresh,
    Quit,
}

// ---------------------------------------------------------------------------
// app -> TUI
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    Composer(ComposerSnapshot),
    /// The draft was published; the editing buffer should be emptied.
    DraftCleared,
    Comments {
        comments: Vec<Comment>,
        filter: VisibilityFilter,
        refreshed_at: DateTime<Local>,
    },
    Filter(VisibilityFilter),
    Notice(Notice),
    ConnectionStatus(ConnectionStatus),
}

// ---------------------------------------------------------------------------
// service task -> app
// ---------------------------------------------------------------------------

/// Why a service call failed, reduced to what the app reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFailure {
    pub message: String,
    /// Transport error or timeout, as opposed to a rejected request.
    pub unreachable: bool,
}

/// Completion of a spawned service call.
///
/// `generation` identifies the task that produced the event so results from
/// superseded tasks can be discarded.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceEvent {
    Extracted {
        result: Result<Vec<String>, CallFailure>,
        generation: u64,
    },
    Submitted {
        result: Result<(), CallFailure>,
        generation: u64,
    },
    Listed {
        filter: VisibilityFilter,
        result: Result<Vec<Comment>, CallFailure>,
        generation: u64,
    },
    VisibilityChanged {
        id: CommentId,
        is_public: bool,
        result: Result<(), CallFailure>,
        generation: u64,
    },
    Health {
        result: Result<(), CallFailure>,
        generation: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_snapshot_is_idle_without_submit() {
        let snap = ComposerSnapshot::default();
        assert_eq!(snap.phase, ComposerPhase::Idle);
        assert!(snap.extracted_points.is_empty());
        assert!(!snap.submit_offered);
        assert!(!snap.is_extracting());
        assert!(!snap.is_submitting());
    }

    #[test]
    fn notice_constructors_set_level() {
        assert_eq!(Notice::info("ok").level, NoticeLevel::Info);
        assert_eq!(Notice::error("bad").level, NoticeLevel::Error);
        assert_eq!(Notice::error("bad").text, "bad");
    }
}
