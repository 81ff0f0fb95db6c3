// Comment board: the displayed list and its visibility filter.

use chrono::{DateTime, Local};
use koe_core::comment::{Comment, CommentId, VisibilityFilter};

#[derive(Debug, Default)]
pub struct Board {
    comments: Vec<Comment>,
    filter: VisibilityFilter,
    refreshed_at: Option<DateTime<Local>>,
}

impl Board {
    pub fn new(filter: VisibilityFilter) -> Self {
        Board {
            comments: Vec::new(),
            filter,
            refreshed_at: None,
        }
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn filter(&self) -> VisibilityFilter {
        self.filter
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Local>> {
        self.refreshed_at
    }

    /// Flip the filter and return the new value.
    pub fn toggle_filter(&mut self) -> VisibilityFilter {
        self.filter = self.filter.toggled();
        self.filter
    }

    /// Replace the whole list with a fetch made under `filter`.
    ///
    /// Returns false, leaving the list alone, if the filter has changed since
    /// the fetch was issued.
    pub fn replace(
        &mut self,
        filter: VisibilityFilter,
        comments: Vec<Comment>,
        at: DateTime<Local>,
    ) -> bool {
        if filter != self.filter {
            return false;
        }
        self.comments = comments;
        self.refreshed_at = Some(at);
        true
    }

    /// Target id and the flipped visibility for the comment at `index`.
    pub fn visibility_target(&self, index: usize) -> Option<(CommentId, bool)> {
        self.comments
            .get(index)
            .map(|c| (c.target_id(index), !c.is_public))
    }
}
