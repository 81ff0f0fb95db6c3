// Comment domain types as exchanged with the comment store.

use std::fmt;

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// CommentId
// ---------------------------------------------------------------------------

/// Identifier used in `PATCH /api/comments/{id}/visibility`.
///
/// The store currently addresses comments by their position in its own list,
/// so this is either a server-assigned id or a client-side list index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(pub u64);

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

/// A published comment as returned by `GET /api/comments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Server-assigned identifier. Some backends omit it.
    ///
    /// Only integer ids (or strings holding one) are kept. Any other id is
    /// dropped rather than failing the whole list, and the comment is then
    /// addressed by its list position.
    #[serde(
        default,
        deserialize_with = "lenient_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<CommentId>,
    pub content: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    pub is_public: bool,
}

impl Comment {
    /// The identifier to address this comment with when it is displayed at
    /// `index` in the current list.
    ///
    /// Prefers the server id; falls back to the list position.
    pub fn target_id(&self, index: usize) -> CommentId {
        self.id.unwrap_or(CommentId(index as u64))
    }
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<CommentId>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Option::<RawId>::deserialize(deserializer)? {
        Some(RawId::Number(n)) => Some(CommentId(n)),
        Some(RawId::Text(text)) => text.trim().parse().ok().map(CommentId),
        Some(RawId::Other(_)) | None => None,
    })
}

/// Returns true when `content` has no non-whitespace characters.
pub fn is_blank(content: &str) -> bool {
    content.trim().is_empty()
}

// ---------------------------------------------------------------------------
// VisibilityFilter
// ---------------------------------------------------------------------------

/// Which comments the board asks the store for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VisibilityFilter {
    /// `show_private=false`: the store omits non-public comments.
    #[default]
    PublicOnly,
    /// `show_private=true`: every comment is returned.
    IncludePrivate,
}

impl VisibilityFilter {
    pub fn from_show_private(show_private: bool) -> Self {
        if show_private {
            VisibilityFilter::IncludePrivate
        } else {
            VisibilityFilter::PublicOnly
        }
    }

    /// Value of the `show_private` query parameter.
    pub fn show_private(self) -> bool {
        matches!(self, VisibilityFilter::IncludePrivate)
    }

    pub fn toggled(self) -> Self {
        match self {
            VisibilityFilter::PublicOnly => VisibilityFilter::IncludePrivate,
            VisibilityFilter::IncludePrivate => VisibilityFilter::PublicOnly,
        }
    }

    /// Whether a comment with the given visibility passes this filter.
    pub fn admits(self, is_public: bool) -> bool {
        is_public || self.show_private()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
