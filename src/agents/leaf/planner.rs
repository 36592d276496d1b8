//! Planning agent.

use async_trait::async_trait;

use crate::agents::{context_block, Agent, AgentContext, AgentError, AgentType};

pub(crate) const SYSTEM_PROMPT: &str = "You are an expert interior design problem decomposer. \
Create a clear, logical step-by-step plan that takes all context into account, \
including relevant details from the conversation history. \
Format the plan as numbered steps. DO NOT solve the problem - only outline the plan.";

/// Agent that turns a question into a numbered plan.
///
/// The plan is free text and is not expected to be stable across calls.
pub struct Planner;

impl Planner {
    pub fn new() -> Self {
        Self
    }

    pub async fn plan(
        &self,
        ctx: &AgentContext,
        question: &str,
        context: &str,
    ) -> Result<String, AgentError> {
        let content = format!("{}Current Question: {}", context_block(context), question);
        self.invoke(ctx, content).await
    }
}

impl Default for Planner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for Planner {
    fn agent_type(&self) -> AgentType {
        AgentType::Planner
    }

    fn system_prompt(&self) -> &str {
        SYSTEM_PROMPT
    }

    fn description(&self) -> &str {
        "Outlines numbered steps without solving"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_context, ScriptedLlm};

    #[tokio::test]
    async fn prompt_carries_context_and_question() {
        let llm = ScriptedLlm::new().reply(AgentType::Planner, " 1. Measure walls\n2. Compare finishes \n");
        let ctx = test_context(&llm);

        let plan = Planner::new()
            .plan(&ctx, "Which finish for 12x10 ft?", "User: north-facing room")
            .await
            .unwrap();

        assert_eq!(plan, "1. Measure walls\n2. Compare finishes");
        assert_eq!(
            llm.inputs(AgentType::Planner)[0],
            "Context from Conversation:\nUser: north-facing room\n\nCurrent Question: Which finish for 12x10 ft?"
        );
    }
}
