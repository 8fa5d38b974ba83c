//! Simdash HTTP server — field catalog, export generation, and bundled notices over a JSON API.

pub mod api;
pub mod error;
pub mod generator;
pub mod metadata;
pub mod notices;
pub mod resources;
pub mod settings;
pub mod source_model;

pub use api::{build_router, AppState};
pub use error::{ServerError, ServerResult};
pub use settings::Settings;
