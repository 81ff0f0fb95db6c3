// The comment service capability consumed by the app orchestrator.

use async_trait::async_trait;
use koe_core::comment::{Comment, CommentId, VisibilityFilter};
use serde::Serialize;

use crate::error::ServiceError;

/// Body of `POST /api/comments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewComment {
    pub content: String,
    /// Previewed key points. Omitted from the payload when `None`; the store
    /// derives its own in that case.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_points: Option<Vec<String>>,
}

impl NewComment {
    pub fn new(content: impl Into<String>) -> Self {
        NewComment {
            content: content.into(),
            key_points: None,
        }
    }

    pub fn with_key_points(mut self, key_points: Vec<String>) -> Self {
        self.key_points = Some(key_points);
        self
    }
}

/// Operations the composer and board need from the backend.
///
/// Implementations report any non-success outcome as a `ServiceError`; the
/// caller never inspects response bodies beyond the documented shapes.
#[async_trait]
pub trait CommentService: Send + Sync {
    /// `POST /extract`: derive key points from draft text.
    async fn extract(&self, content: &str) -> Result<Vec<String>, ServiceError>;

    /// `GET /api/comments?show_private=..`
    async fn list_comments(&self, filter: VisibilityFilter) -> Result<Vec<Comment>, ServiceError>;

    /// `POST /api/comments`
    async fn create_comment(&self, comment: &NewComment) -> Result<(), ServiceError>;

    /// `PATCH /api/comments/{id}/visibility`
    async fn set_visibility(&self, id: CommentId, is_public: bool) -> Result<(), ServiceError>;

    /// `GET /healthz`
    async fn health(&self) -> Result<(), ServiceError>;
}
