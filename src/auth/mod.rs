//! Sign-in and sessions: GitHub OAuth, user accounts and login sessions.

pub mod accounts;
pub mod oauth;
pub mod session;

pub use accounts::{AccountService, User, UserProfile};
pub use oauth::GitHubOAuth;
pub use session::{AuthenticatedSession, SessionManager};
