//! Route classification agent.

use async_trait::async_trait;

use crate::agents::{Agent, AgentContext, AgentError, AgentType};

pub(crate) const SYSTEM_PROMPT: &str = "You are an expert conversation router for an interior design assistant. \
Analyze the user's latest message in light of the conversation so far.\n\
- Respond 'reasoning' if the message needs calculations, design analysis, measurements, or multi-step problem solving.\n\
- Respond 'casual' for greetings, compliments, simple questions, or small talk.\n\
Respond ONLY with the single word 'reasoning' or 'casual'.";

/// Agent that labels a query `casual` or `reasoning`.
///
/// The label is lower-cased and trimmed but otherwise passed through; use
/// [`crate::agents::Route::from_label`] to interpret it.
pub struct RouteClassifier;

impl RouteClassifier {
    pub fn new() -> Self {
        Self
    }

    pub async fn classify(
        &self,
        ctx: &AgentContext,
        query: &str,
        context: &str,
    ) -> Result<String, AgentError> {
        let content = format!(
            "Conversation History:\n{}\n\nLatest User Message: {}",
            context, query
        );
        let label = self.invoke(ctx, content).await?;
        Ok(label.to_lowercase())
    }
}

impl Default for RouteClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for RouteClassifier {
    fn agent_type(&self) -> AgentType {
        AgentType::Router
    }

    fn system_prompt(&self) -> &str {
        SYSTEM_PROMPT
    }

    fn description(&self) -> &str {
        "Routes a query to the casual or reasoning path"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_context, ScriptedLlm};

    #[tokio::test]
    async fn label_is_normalized_but_not_interpreted() {
        let llm = ScriptedLlm::new()
            .reply(AgentType::Router, "  CASUAL \n")
            .reply(AgentType::Router, "Reasoning, definitely");
        let ctx = test_context(&llm);
        let router = RouteClassifier::new();

        assert_eq!(router.classify(&ctx, "Hello!", "No prior conversation").await.unwrap(), "casual");
        assert_eq!(
            router.classify(&ctx, "Hello!", "No prior conversation").await.unwrap(),
            "reasoning, definitely"
        );
    }

    #[tokio::test]
    async fn prompt_carries_history_and_query() {
        let llm = ScriptedLlm::new().reply(AgentType::Router, "reasoning");
        let ctx = test_context(&llm);

        RouteClassifier::new()
            .classify(&ctx, "How much paint?", "User: hi")
            .await
            .unwrap();

        let inputs = llm.inputs(AgentType::Router);
        assert_eq!(
            inputs[0],
            "Conversation History:\nUser: hi\n\nLatest User Message: How much paint?"
        );
    }
}
