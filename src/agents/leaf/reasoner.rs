//! Reasoning agent - works a plan into a full solution trace.

use async_trait::async_trait;

use crate::agents::{context_block, Agent, AgentContext, AgentError, AgentType};

/// Marker that ends every reasoning trace.
pub const FINAL_ANSWER_MARKER: &str = "Final Answer:";

pub(crate) const SYSTEM_PROMPT: &str = "You are a meticulous interior design reasoning expert. \
Follow the EXACT plan provided and show all of your work step by step. \
Use the conversation context, and address any verification feedback you are given. \
End with a line of the form: 'Final Answer: [answer]'";

/// Agent that executes a plan.
///
/// # Output
/// The whole trimmed trace, not just the final line; locating the
/// final-answer marker is the verifier's job.
pub struct Reasoner;

impl Reasoner {
    pub fn new() -> Self {
        Self
    }

    /// Build the single instruction block; feedback is appended only when non-empty.
    fn build_content(plan: &str, question: &str, context: &str, feedback: Option<&str>) -> String {
        let mut content = format!(
            "{}Current Question: {}\n\nPlan:\n{}",
            context_block(context),
            question,
            plan
        );
        if let Some(feedback) = feedback.filter(|f| !f.is_empty()) {
            content.push_str("\n\nPrevious Verification Feedback:\n");
            content.push_str(feedback);
        }
        content
    }

    pub async fn reason(
        &self,
        ctx: &AgentContext,
        plan: &str,
        question: &str,
        context: &str,
        feedback: Option<&str>,
    ) -> Result<String, AgentError> {
        let content = Self::build_content(plan, question, context, feedback);
        let trace = self.invoke(ctx, content).await?;

        match extract_final_answer(&trace) {
            Some(answer) => tracing::debug!("Reasoner final answer: {}", answer),
            None => tracing::debug!("Reasoner trace has no '{}' line", FINAL_ANSWER_MARKER),
        }
        Ok(trace)
    }
}

impl Default for Reasoner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for Reasoner {
    fn agent_type(&self) -> AgentType {
        AgentType::Reasoner
    }

    fn system_prompt(&self) -> &str {
        SYSTEM_PROMPT
    }

    fn description(&self) -> &str {
        "Follows a plan with shown work and a final-answer line"
    }
}

/// Text after the last final-answer marker in `trace`, if any.
pub fn extract_final_answer(trace: &str) -> Option<&str> {
    trace.lines().rev().find_map(|line| {
        line.split_once(FINAL_ANSWER_MARKER)
            .map(|(_, answer)| answer.trim())
    })
}
