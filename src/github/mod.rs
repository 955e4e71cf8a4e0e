pub mod client;
pub mod types;

pub use client::GitHubClient;
pub use types::{GitHubRepo, GitHubSecret, GitHubUser, RepoOwner, SecretList};
