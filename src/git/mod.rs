mod client;
mod types;

pub use client::GitClient;
pub use types::{FileStatus, RepoStats, StatusEntry};
