//! Fallback agent - direct answer used once the verification budget is spent.

use async_trait::async_trait;

use crate::agents::{Agent, AgentContext, AgentError, AgentType};

pub(crate) const SYSTEM_PROMPT: &str = "You are an expert interior design assistant. \
Give a concise, reasonable, and helpful answer to the user's question from your own knowledge. \
Do not mention uncertainty or hedge - just give the best possible answer.";

pub struct FallbackAnswerer;

impl FallbackAnswerer {
    pub fn new() -> Self {
        Self
    }

    pub async fn answer(
        &self,
        ctx: &AgentContext,
        question: &str,
        context: &str,
    ) -> Result<String, AgentError> {
        let content = format!("Context (if any):\n{}\n\nQuestion:\n{}", context, question);
        self.invoke(ctx, content).await
    }
}

impl Default for FallbackAnswerer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for FallbackAnswerer {
    fn agent_type(&self) -> AgentType {
        AgentType::Fallback
    }

    fn system_prompt(&self) -> &str {
        SYSTEM_PROMPT
    }

    fn description(&self) -> &str {
        "Answers directly without verification"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_context, ScriptedLlm};

    #[tokio::test]
    async fn prompt_carries_context_and_question() {
        let llm = ScriptedLlm::new().reply(AgentType::Fallback, "Use a matte finish.");
        let ctx = test_context(&llm);

        let answer = FallbackAnswerer::new()
            .answer(&ctx, "Which finish?", "No prior conversation")
            .await
            .unwrap();

        assert_eq!(answer, "Use a matte finish.");
        assert_eq!(
            llm.inputs(AgentType::Fallback)[0],
            "Context (if any):\nNo prior conversation\n\nQuestion:\nWhich finish?"
        );
    }
}
