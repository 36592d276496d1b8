//! HTTP API for the design assistant.
//!
//! ## Endpoints
//!
//! - `POST /run` - Answer a query given the prior conversation
//! - `GET /api/health` - Health check

mod routes;
pub mod types;

pub use routes::{router, serve, AppState};
pub use types::*;
