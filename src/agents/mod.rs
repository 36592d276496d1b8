//! Agents module - single-shot model agents and the reasoning loop.
//!
//! # Agent Types
//! - **RouteClassifier**: casual vs reasoning decision
//! - **CasualResponder**: short conversational reply
//! - **Planner** / **Reasoner** / **Verifier**: one plan/execute/verify round
//! - **FallbackAnswerer**: direct answer when no round is accepted
//! - **ReasoningController**: bounded loop over the three reasoning agents
//!
//! # Design Principles
//! - Every agent makes exactly one gateway call per invocation and never retries
//! - Gateway failures propagate unchanged as [`AgentError`]
//! - Model output is parsed into typed values ([`Route`], [`Verdict`]) at the agent boundary

mod context;
pub mod controller;
pub mod leaf;
mod types;

pub use context::AgentContext;
pub use controller::{ReasoningController, ReasoningOutcome, Resolution};
pub use leaf::{CasualResponder, FallbackAnswerer, Planner, Reasoner, RouteClassifier, Verifier};
pub use types::{AgentError, AgentType, Route, Verdict};

use async_trait::async_trait;

use crate::llm::ChatMessage;

/// Base trait for all single-shot agents.
///
/// # Invariants
/// - `invoke()` issues exactly one gateway call
/// - `invoke()` returns the model text trimmed of surrounding whitespace
#[async_trait]
pub trait Agent: Send + Sync {
    /// Get the type/role of this agent.
    fn agent_type(&self) -> AgentType;

    /// Instruction sent as the system message.
    fn system_prompt(&self) -> &str;

    /// Get a human-readable description of this agent.
    fn description(&self) -> &str {
        "Generic agent"
    }

    /// Send the system prompt plus `content` as the human message.
    ///
    /// # Errors
    /// Returns `AgentError::Llm` if the gateway call fails.
    async fn invoke(&self, ctx: &AgentContext, content: String) -> Result<String, AgentError> {
        let agent = self.agent_type();
        let messages = [
            ChatMessage::system(self.system_prompt()),
            ChatMessage::human(content),
        ];

        let response = ctx
            .llm
            .chat_completion_with_options(&ctx.model, &messages, ctx.options.clone())
            .await
            .map_err(|e| AgentError::Llm {
                agent,
                message: e.to_string(),
            })?;

        if let Some(usage) = &response.usage {
            tracing::debug!(
                agent = %agent,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "model call finished"
            );
        }

        Ok(response.content.unwrap_or_default().trim().to_string())
    }
}

/// Human message layout shared by the context-aware agents.
pub(crate) fn context_block(context: &str) -> String {
    format!("Context from Conversation:\n{}\n\n", context)
}
