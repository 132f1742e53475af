//! HTTP API for Tubegate.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::build_app;
pub use state::{ApiConfig, AppState};
