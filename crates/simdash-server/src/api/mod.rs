//! JSON API surface: request/response bodies and route handlers.

pub mod model;
pub mod routes;

pub use routes::{build_router, AppState};
