//! Leaf agents - one model call each.
//!
//! - `RouteClassifier`: labels a query `casual` or `reasoning`
//! - `CasualResponder`: conversational reply
//! - `Planner`: numbered plan, no solution
//! - `Reasoner`: worked solution ending in a final-answer line
//! - `Verifier`: accept with an answer, or reject with corrections
//! - `FallbackAnswerer`: direct best-effort answer

mod casual;
mod fallback;
mod planner;
mod reasoner;
mod router;
mod verifier;

pub use casual::CasualResponder;
pub use fallback::FallbackAnswerer;
pub use planner::Planner;
pub use reasoner::{extract_final_answer, Reasoner, FINAL_ANSWER_MARKER};
pub use router::RouteClassifier;
pub use verifier::{Verifier, ACCEPT_MARKER};
