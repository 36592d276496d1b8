//! Verification agent - checks a reasoning trace.
//!
//! # Wire contract
//! The model answers either `VERIFIED: <final answer>` when the trace is fully
//! correct, or free-form correction instructions. The response is parsed into a
//! [`Verdict`] here so nothing downstream inspects model text again.
//!
//! # Checks requested
//! - Logical errors
//! - Computational errors
//! - Missing context
//! - Violations of design principles

use async_trait::async_trait;

use crate::agents::{context_block, Agent, AgentContext, AgentError, AgentType, Verdict};

/// Prefix that marks an accepted trace.
pub const ACCEPT_MARKER: &str = "VERIFIED:";

pub(crate) const SYSTEM_PROMPT: &str = "You are a critical interior design verification expert. \
Review the reasoning for logical errors, calculation mistakes, missing context, and design principle violations. \
If it is completely correct, respond EXACTLY: 'VERIFIED: [final answer]'. \
If it is flawed, give specific correction instructions and list the missing considerations.";

/// Agent that accepts or rejects a reasoning trace.
pub struct Verifier;

impl Verifier {
    pub fn new() -> Self {
        Self
    }

    /// Parse a trimmed verifier response.
    ///
    /// Accepted only if the text starts with [`ACCEPT_MARKER`]; rejections
    /// keep the full text unmodified.
    pub fn parse_verdict(response: &str) -> Verdict {
        match response.strip_prefix(ACCEPT_MARKER) {
            Some(answer) => Verdict::Accepted(answer.trim().to_string()),
            None => Verdict::Rejected(response.to_string()),
        }
    }

    pub async fn verify(
        &self,
        ctx: &AgentContext,
        trace: &str,
        question: &str,
        context: &str,
    ) -> Result<Verdict, AgentError> {
        let content = format!(
            "{}Original Question: {}\n\nReasoning to Verify:\n{}",
            context_block(context),
            question,
            trace
        );
        let response = self.invoke(ctx, content).await?;
        Ok(Self::parse_verdict(&response))
    }
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for Verifier {
    fn agent_type(&self) -> AgentType {
        AgentType::Verifier
    }

    fn system_prompt(&self) -> &str {
        SYSTEM_PROMPT
    }

    fn description(&self) -> &str {
        "Accepts a correct trace with its answer or returns corrections"
    }
}
