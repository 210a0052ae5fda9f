pub mod comment;
pub mod project;
pub mod user;

pub use comment::*;
pub use project::*;
pub use user::*;
