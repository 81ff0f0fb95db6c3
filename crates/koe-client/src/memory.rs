// In-process comment store used for offline runs and as a test double.
//
// Behaves like the HTTP backend: sequential ids, new comments are public,
// `show_private` filtering, 400 on empty content, 404 on unknown ids.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use koe_core::comment::{Comment, CommentId, VisibilityFilter};

use crate::error::ServiceError;
use crate::service::{CommentService, NewComment};

/// Maximum number of points the built-in extractor returns.
const MAX_POINTS: usize = 2;

type Extractor = Box<dyn Fn(&str) -> Vec<String> + Send + Sync>;

/// Which trait method a recorded call or injected failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Extract,
    List,
    Create,
    SetVisibility,
    Health,
}

/// A call received by the store, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Extract(String),
    List(VisibilityFilter),
    Create(NewComment),
    SetVisibility(CommentId, bool),
    Health,
}

#[derive(Default)]
struct Inner {
    comments: Vec<Comment>,
    calls: Vec<Call>,
    failures: HashMap<Operation, VecDeque<ServiceError>>,
}

pub struct MemoryCommentService {
    inner: Mutex<Inner>,
    extractor: Extractor,
}

impl Default for MemoryCommentService {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCommentService {
    pub fn new() -> Self {
        Self::with_extractor(naive_key_points)
    }

    /// Use `extractor` in place of the sentence splitter.
    pub fn with_extractor<F>(extractor: F) -> Self
    where
        F: Fn(&str) -> Vec<String> + Send + Sync + 'static,
    {
        MemoryCommentService {
            inner: Mutex::new(Inner::default()),
            extractor: Box::new(extractor),
        }
    }

    /// Store a comment directly, bypassing extraction. Returns its id.
    pub fn seed(&self, content: &str, key_points: &[&str], is_public: bool) -> CommentId {
        let mut inner = self.lock();
        let id = CommentId(inner.comments.len() as u64);
        inner.comments.push(Comment {
            id: Some(id),
            content: content.to_string(),
            key_points: key_points.iter().map(|p| p.to_string()).collect(),
            is_public,
        });
        id
    }

    /// Make the next call to `op` fail with `err`. Failures queue up per
    /// operation and are consumed in order.
    pub fn fail_next(&self, op: Operation, err: ServiceError) {
        self.lock().failures.entry(op).or_default().push_back(err);
    }

    /// Every call received so far.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Number of calls received for `op`.
    pub fn call_count(&self, op: Operation) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.operation() == op)
            .count()
    }

    /// Snapshot of the stored comments, private ones included.
    pub fn comments(&self) -> Vec<Comment> {
        self.lock().comments.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `call` and return the injected failure for it, if any.
    fn record(&self, inner: &mut Inner, call: Call) -> Result<(), ServiceError> {
        let op = call.operation();
        inner.calls.push(call);
        match inner.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Call {
    pub fn operation(&self) -> Operation {
        match self {
            Call::Extract(_) => Operation::Extract,
            Call::List(_) => Operation::List,
            Call::Create(_) => Operation::Create,
            Call::SetVisibility(..) => Operation::SetVisibility,
            Call::Health => Operation::Health,
        }
    }
}

#[async_trait]
impl CommentService for MemoryCommentService {
    async fn extract(&self, content: &str) -> Result<Vec<String>, ServiceError> {
        {
            let mut inner = self.lock();
            self.record(&mut inner, Call::Extract(content.to_string()))?;
        }
        Ok((self.extractor)(content))
    }

    async fn list_comments(&self, filter: VisibilityFilter) -> Result<Vec<Comment>, ServiceError> {
        let mut inner = self.lock();
        self.record(&mut inner, Call::List(filter))?;
        Ok(inner
            .comments
            .iter()
            .filter(|c| filter.admits(c.is_public))
            .cloned()
            .collect())
    }

    async fn create_comment(&self, comment: &NewComment) -> Result<(), ServiceError> {
        {
            let mut inner = self.lock();
            self.record(&mut inner, Call::Create(comment.clone()))?;
        }
        if comment.content.is_empty() {
            return Err(ServiceError::Status {
                operation: "create comment",
                status: 400,
                body: "comment content is required".to_string(),
            });
        }

        let key_points = match &comment.key_points {
            Some(points) => points.clone(),
            None => (self.extractor)(&comment.content),
        };

        let mut inner = self.lock();
        let id = CommentId(inner.comments.len() as u64);
        inner.comments.push(Comment {
            id: Some(id),
            content: comment.content.clone(),
            key_points,
            is_public: true,
        });
        Ok(())
    }

    async fn set_visibility(&self, id: CommentId, is_public: bool) -> Result<(), ServiceError> {
        let mut inner = self.lock();
        self.record(&mut inner, Call::SetVisibility(id, is_public))?;
        match inner.comments.get_mut(id.0 as usize) {
            Some(comment) => {
                comment.is_public = is_public;
                Ok(())
            }
            None => Err(ServiceError::Status {
                operation: "set visibility",
                status: 404,
                body: "comment not found".to_string(),
            }),
        }
    }

    async fn health(&self) -> Result<(), ServiceError> {
        let mut inner = self.lock();
        self.record(&mut inner, Call::Health)
    }
}

/// Split `content` into sentences and keep the first few as key points.
pub fn naive_key_points(content: &str) -> Vec<String> {
    content
        .split(['.', '!', '?', '\n', '。', '！', '？'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(MAX_POINTS)
        .map(str::to_string)
        .collect()
}
