pub mod comments;
pub mod projects;
pub mod thread;

pub use comments::CommentService;
pub use projects::{ProjectService, SentinelUser};
