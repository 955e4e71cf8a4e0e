pub mod models;
pub mod queries;

pub use models::{NewUser, Session, SessionUserRow, UserRow, SESSION_DURATION_DAYS};
pub use queries::{connect, init_db, DbPool, SessionRepo, UserRepo};
