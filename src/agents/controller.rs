//! Reasoning controller - bounded plan/execute/verify loop.
//!
//! # Flow
//! ```text
//! for iteration in 0..max_iterations:
//!     plan    = Planner(question, context)
//!     trace   = Reasoner(plan, question, context, feedback)
//!     verdict = Verifier(trace, question, context)
//!     Accepted(answer)  -> return answer
//!     Rejected(text)    -> feedback = text
//! return FallbackAnswerer(question, context)
//! ```
//!
//! Each iteration plans from scratch. Only the latest rejection text is carried
//! forward. The first accepted verdict wins; the fallback answer is final.

use serde::Serialize;

use crate::agents::leaf::{FallbackAnswerer, Planner, Reasoner, Verifier};
use crate::agents::{AgentContext, AgentError, Verdict};

/// How the controller produced its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resolution {
    /// Accepted by the verifier in this 1-based iteration.
    Verified { iteration: usize },
    /// Every iteration was rejected; the fallback answered.
    Fallback { attempts: usize },
}

/// Result of a reasoning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasoningOutcome {
    pub answer: String,
    pub resolution: Resolution,
}

/// Per-query loop state. Never outlives one `run` call.
#[derive(Debug, Default)]
struct IterationState {
    iteration: usize,
    feedback: Option<String>,
}

pub struct ReasoningController {
    planner: Planner,
    reasoner: Reasoner,
    verifier: Verifier,
    fallback: FallbackAnswerer,
    max_iterations: usize,
}

impl ReasoningController {
    /// Create a controller with the given iteration ceiling.
    pub fn new(max_iterations: usize) -> Self {
        Self {
            planner: Planner::new(),
            reasoner: Reasoner::new(),
            verifier: Verifier::new(),
            fallback: FallbackAnswerer::new(),
            max_iterations,
        }
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Answer `question` through verified reasoning, falling back on exhaustion.
    ///
    /// # Errors
    /// Any agent's gateway failure is returned as-is; the loop does not retry it.
    pub async fn run(
        &self,
        ctx: &AgentContext,
        question: &str,
        context: &str,
    ) -> Result<ReasoningOutcome, AgentError> {
        let mut state = IterationState::default();

        while state.iteration < self.max_iterations {
            tracing::info!(
                "Reasoning iteration {}/{}",
                state.iteration + 1,
                self.max_iterations
            );

            let plan = self.planner.plan(ctx, question, context).await?;
            let trace = self
                .reasoner
                .reason(ctx, &plan, question, context, state.feedback.as_deref())
                .await?;

            match self.verifier.verify(ctx, &trace, question, context).await? {
                Verdict::Accepted(answer) => {
                    tracing::info!("Verifier accepted iteration {}", state.iteration + 1);
                    return Ok(ReasoningOutcome {
                        answer,
                        resolution: Resolution::Verified {
                            iteration: state.iteration + 1,
                        },
                    });
                }
                Verdict::Rejected(feedback) => {
                    tracing::debug!(
                        "Verifier rejected iteration {}: {}",
                        state.iteration + 1,
                        feedback
                    );
                    state.feedback = Some(feedback);
                    state.iteration += 1;
                }
            }
        }

        tracing::warn!(
            "No verified answer after {} iterations, using direct fallback",
            self.max_iterations
        );
        let answer = self.fallback.answer(ctx, question, context).await?;
        Ok(ReasoningOutcome {
            answer,
            resolution: Resolution::Fallback {
                attempts: self.max_iterations,
            },
        })
    }
}

impl Default for ReasoningController {
    fn default() -> Self {
        Self::new(3)
    }
}
