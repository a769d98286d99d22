pub mod admin;
pub mod auth;
pub mod landing;
pub mod responses;
pub mod router;
pub mod session;
pub mod state;
pub mod templates;

pub use state::AppState;
