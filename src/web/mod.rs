pub mod auth_routes;
pub mod cookies;
pub mod extract;
pub mod routes;
pub mod secrets_routes;
pub mod state;

pub use extract::CurrentUser;
pub use routes::create_router;
pub use state::AppState;
