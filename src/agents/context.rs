//! Request-scoped agent context.

use std::sync::Arc;

use uuid::Uuid;

use crate::config::Config;
use crate::llm::{ChatOptions, LlmClient};

/// Everything an agent needs for one query.
///
/// Built fresh per query; the only shared piece is the gateway handle, which
/// the agents never mutate.
#[derive(Clone)]
pub struct AgentContext {
    /// Language model gateway
    pub llm: Arc<dyn LlmClient>,

    /// Model identifier sent with every call
    pub model: String,

    /// Sampling options sent with every call
    pub options: ChatOptions,

    /// Correlates log lines of one query
    pub request_id: Uuid,
}

impl AgentContext {
    /// Create a context with default sampling options.
    pub fn new(llm: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
            options: ChatOptions::default(),
            request_id: Uuid::new_v4(),
        }
    }

    /// Create a context using the model and sampling settings from `config`.
    pub fn from_config(config: &Config, llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            model: config.default_model.clone(),
            options: ChatOptions {
                temperature: Some(config.temperature),
                top_p: None,
                max_tokens: Some(config.max_tokens),
                reasoning_format: config.reasoning_format.clone(),
            },
            request_id: Uuid::new_v4(),
        }
    }
}
