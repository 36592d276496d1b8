//! Conversational reply agent.

use async_trait::async_trait;

use crate::agents::{Agent, AgentContext, AgentError, AgentType};

pub(crate) const SYSTEM_PROMPT: &str = "You are a friendly, knowledgeable interior design assistant with a warm personality. \
Reply conversationally while staying professional. \
Keep replies to one or two sentences, empathetic, and design-focused when relevant.";

pub struct CasualResponder;

impl CasualResponder {
    pub fn new() -> Self {
        Self
    }

    pub async fn respond(
        &self,
        ctx: &AgentContext,
        query: &str,
        context: &str,
    ) -> Result<String, AgentError> {
        let content = format!(
            "Conversation History:\n{}\n\nUser's Current Message: {}",
            context, query
        );
        self.invoke(ctx, content).await
    }
}

impl Default for CasualResponder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for CasualResponder {
    fn agent_type(&self) -> AgentType {
        AgentType::Casual
    }

    fn system_prompt(&self) -> &str {
        SYSTEM_PROMPT
    }

    fn description(&self) -> &str {
        "Answers greetings and small talk"
    }
}
