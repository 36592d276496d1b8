//! # Design Reasoner
//!
//! Adaptive reasoning service for an interior design assistant.
//!
//! This library provides:
//! - Routing between a quick conversational reply and verified reasoning
//! - A bounded plan/execute/verify loop with a direct-answer fallback
//! - Optional grounding from a hosted vector index fed by a document folder
//! - An HTTP API exposing the pipeline
//!
//! ## Architecture
//!
//! ```text
//!        ┌──────────────────────────────────┐
//!        │          QueryPipeline           │
//!        │ (history, grounding, routing)    │
//!        └───────┬──────────────────┬───────┘
//!                │ casual           │ reasoning
//!                ▼                  ▼
//!      ┌─────────────────┐  ┌──────────────────────┐
//!      │ CasualResponder │  │ ReasoningController  │
//!      └─────────────────┘  │ Planner → Reasoner → │
//!                           │ Verifier (≤ N times) │
//!                           │ → FallbackAnswerer   │
//!                           └──────────────────────┘
//! ```
//!
//! ## Modules
//! - `agents`: single-shot agents and the reasoning controller
//! - `llm`: chat completions gateway with retry
//! - `retrieval`: grounding passages and corpus ingestion
//! - `pipeline`: the query entry point

pub mod agents;
pub mod api;
pub mod config;
pub mod conversation;
pub mod llm;
pub mod pipeline;
pub mod retrieval;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use conversation::{Turn, TurnRole};
pub use pipeline::{QueryOutcome, QueryPipeline, SYSTEM_ERROR_MESSAGE};
