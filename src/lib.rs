pub mod auth;
pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod github;
pub mod web;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
