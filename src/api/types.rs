//! API request and response types.

use serde::{Deserialize, Serialize};

use crate::conversation::Turn;

/// Request to answer one user message.
#[derive(Debug, Clone, Deserialize)]
pub struct RunRequest {
    /// The user's latest message
    pub query: String,

    /// Prior turns, oldest first
    #[serde(default)]
    pub conversation: Vec<Turn>,
}

/// Answer to a `RunRequest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResponse {
    /// User-facing text (the system error message on failure)
    pub result: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,

    /// Model used for every agent call
    pub model: String,

    /// Reasoning iteration ceiling (from MAX_ITERATIONS env var)
    pub max_iterations: usize,

    /// Whether grounding passages are fetched
    pub retrieval_enabled: bool,
}
