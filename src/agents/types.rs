//! Core types for the agent system.

use serde::{Deserialize, Serialize};

/// Role an agent plays in answering a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    /// Decides casual vs reasoning
    Router,
    /// Conversational reply
    Casual,
    /// Decomposes a question into steps
    Planner,
    /// Works the plan into a reasoning trace
    Reasoner,
    /// Accepts or rejects a reasoning trace
    Verifier,
    /// Direct answer after the retry budget is spent
    Fallback,
}

impl std::fmt::Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AgentType::Router => "router",
            AgentType::Casual => "casual",
            AgentType::Planner => "planner",
            AgentType::Reasoner => "reasoner",
            AgentType::Verifier => "verifier",
            AgentType::Fallback => "fallback",
        };
        f.write_str(name)
    }
}

/// How a query is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Casual,
    Reasoning,
}

impl Route {
    /// Interpret a classifier label. Anything but `casual` takes the reasoning path.
    pub fn from_label(label: &str) -> Self {
        if label.trim().to_lowercase() == "casual" {
            Route::Casual
        } else {
            Route::Reasoning
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Casual => "casual",
            Route::Reasoning => "reasoning",
        }
    }
}

/// Outcome of verifying a reasoning trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Trace is correct; carries the final answer.
    Accepted(String),
    /// Trace is flawed; carries the verifier's correction text verbatim.
    Rejected(String),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted(_))
    }
}

/// Errors raised by agents.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AgentError {
    #[error("{agent} model call failed: {message}")]
    Llm { agent: AgentType, message: String },
}

impl AgentError {
    pub fn agent(&self) -> AgentType {
        match self {
            AgentError::Llm { agent, .. } => *agent,
        }
    }
}
