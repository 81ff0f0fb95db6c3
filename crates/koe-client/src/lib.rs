// Clients for the comment service: the `CommentService` capability, its
// HTTP implementation, and an in-process store.

pub mod error;
pub mod http;
pub mod memory;
pub mod service;

pub use error::ServiceError;
pub use http::HttpCommentService;
pub use memory::MemoryCommentService;
pub use service::{CommentService, NewComment};
