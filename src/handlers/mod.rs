pub mod comments;
pub mod projects;
pub mod stats;
