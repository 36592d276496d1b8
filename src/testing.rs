//! In-crate fakes for the model and retrieval gateways.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::agents::{
    Agent, AgentContext, AgentType, CasualResponder, FallbackAnswerer, Planner, Reasoner,
    RouteClassifier, Verifier,
};
use crate::llm::{ChatMessage, ChatResponse, LlmClient};
use crate::retrieval::{Passage, RetrievalRequest, Retriever};

/// One recorded gateway call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub agent: AgentType,
    pub content: String,
}

#[derive(Default)]
struct Script {
    replies: HashMap<AgentType, VecDeque<Result<String, String>>>,
    calls: Vec<RecordedCall>,
}

/// Model fake that answers per agent from queued replies and records every call.
///
/// The calling agent is recognised by its system prompt.
#[derive(Clone, Default)]
pub struct ScriptedLlm {
    inner: Arc<Mutex<Script>>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply for `agent`.
    pub fn reply(self, agent: AgentType, text: impl Into<String>) -> Self {
        self.push(agent, Ok(text.into()))
    }

    /// Queue a gateway failure for `agent`.
    pub fn fail(self, agent: AgentType, message: impl Into<String>) -> Self {
        self.push(agent, Err(message.into()))
    }

    fn push(self, agent: AgentType, reply: Result<String, String>) -> Self {
        self.inner
            .lock()
            .unwrap()
            .replies
            .entry(agent)
            .or_default()
            .push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn count(&self, agent: AgentType) -> usize {
        self.calls().iter().filter(|c| c.agent == agent).count()
    }

    /// Human-message contents sent by `agent`, in call order.
    pub fn inputs(&self, agent: AgentType) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.agent == agent)
            .map(|c| c.content)
            .collect()
    }
}

fn agent_for_prompt(system: &str) -> Option<AgentType> {
    let agents: [&dyn Agent; 6] = [
        &RouteClassifier,
        &CasualResponder,
        &Planner,
        &Reasoner,
        &Verifier,
        &FallbackAnswerer,
    ];
    agents
        .iter()
        .find(|agent| agent.system_prompt() == system)
        .map(|agent| agent.agent_type())
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn chat_completion(
        &self,
        _model: &str,
        messages: &[ChatMessage],
    ) -> anyhow::Result<ChatResponse> {
        let system = messages.first().map(|m| m.content.as_str()).unwrap_or_default();
        let agent = agent_for_prompt(system)
            .ok_or_else(|| anyhow::anyhow!("unrecognised system prompt"))?;
        let content = messages.get(1).map(|m| m.content.clone()).unwrap_or_default();

        let mut script = self.inner.lock().unwrap();
        script.calls.push(RecordedCall { agent, content });
        match script.replies.get_mut(&agent).and_then(|q| q.pop_front()) {
            Some(Ok(text)) => Ok(ChatResponse::text(text)),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => Err(anyhow::anyhow!("no scripted reply for {}", agent)),
        }
    }
}

type ReplyFn = dyn Fn(AgentType, &str) -> String + Send + Sync;

/// Model fake whose reply is computed from the calling agent and its input.
///
/// Each call yields to the scheduler first, so concurrent queries interleave.
#[derive(Clone)]
pub struct EchoLlm {
    respond: Arc<ReplyFn>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl EchoLlm {
    pub fn new(respond: impl Fn(AgentType, &str) -> String + Send + Sync + 'static) -> Self {
        Self {
            respond: Arc::new(respond),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn inputs(&self, agent: AgentType) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.agent == agent)
            .map(|c| c.content)
            .collect()
    }
}

#[async_trait]
impl LlmClient for EchoLlm {
    async fn chat_completion(
        &self,
        _model: &str,
        messages: &[ChatMessage],
    ) -> anyhow::Result<ChatResponse> {
        let system = messages.first().map(|m| m.content.as_str()).unwrap_or_default();
        let agent = agent_for_prompt(system)
            .ok_or_else(|| anyhow::anyhow!("unrecognised system prompt"))?;
        let content = messages.get(1).map(|m| m.content.clone()).unwrap_or_default();

        tokio::task::yield_now().await;

        let reply = (self.respond)(agent, &content);
        self.calls.lock().unwrap().push(RecordedCall { agent, content });
        Ok(ChatResponse::text(reply))
    }
}

/// Context wired to `llm` with a fixed model name.
pub fn test_context(llm: &ScriptedLlm) -> AgentContext {
    AgentContext::new(Arc::new(llm.clone()), "test-model")
}

/// Retriever returning fixed passages and recording queries.
#[derive(Clone, Default)]
pub struct StaticRetriever {
    passages: Vec<Passage>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl StaticRetriever {
    pub fn new(texts: &[&str]) -> Self {
        let passages = texts
            .iter()
            .enumerate()
            .map(|(i, text)| Passage {
                id: format!("vec{}", i + 1),
                score: None,
                text: text.to_string(),
            })
            .collect();
        Self {
            passages,
            queries: Arc::default(),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    async fn search(&self, request: &RetrievalRequest) -> anyhow::Result<Vec<Passage>> {
        self.queries.lock().unwrap().push(request.query.clone());
        Ok(self.passages.iter().take(request.top_k).cloned().collect())
    }
}

/// Retriever whose backend always errors.
pub struct FailingRetriever;

#[async_trait]
impl Retriever for FailingRetriever {
    async fn search(&self, _request: &RetrievalRequest) -> anyhow::Result<Vec<Passage>> {
        anyhow::bail!("index unreachable")
    }
}
