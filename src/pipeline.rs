//! Query pipeline - the single entry point for answering a user message.
//!
//! ```text
//! history ──▶ format_history ──┐
//! query ──▶ retrieve ──▶ augmented query ──▶ RouteClassifier
//!                                              │
//!                          casual ◀────────────┴────────────▶ reasoning
//!                     CasualResponder              ReasoningController
//!                              └──────────▶ strip private reasoning ──▶ text
//! ```
//!
//! Inner components fail fast. [`QueryPipeline::process`] is the only
//! recovery point and always yields user-facing text.

use std::sync::Arc;

use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::agents::{
    AgentContext, CasualResponder, ReasoningController, Resolution, Route, RouteClassifier,
};
use crate::config::{Config, RetrievalConfig};
use crate::conversation::{format_history, Turn};
use crate::llm::LlmClient;
use crate::retrieval::{Passage, RetrievalRequest, Retriever};

/// Returned to the user when answering fails for any reason.
pub const SYSTEM_ERROR_MESSAGE: &str =
    "System error: something went wrong while answering. Please try rephrasing your request.";

/// End of the model's private reasoning block.
pub const THINKING_END: &str = "</think>";

/// Everything one query produced, for callers that want diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    /// Final user-facing text
    pub text: String,
    pub route: Route,
    /// Set on the reasoning path only
    pub resolution: Option<Resolution>,
    /// Grounding passages, best first
    pub passages: Vec<Passage>,
}

pub struct QueryPipeline {
    base_context: AgentContext,
    retriever: Option<Arc<dyn Retriever>>,
    retrieval: RetrievalConfig,
    router: RouteClassifier,
    casual: CasualResponder,
    controller: ReasoningController,
}

impl QueryPipeline {
    pub fn new(
        config: &Config,
        llm: Arc<dyn LlmClient>,
        retriever: Option<Arc<dyn Retriever>>,
    ) -> Self {
        Self {
            base_context: AgentContext::from_config(config, llm),
            retriever,
            retrieval: config.retrieval.clone(),
            router: RouteClassifier::new(),
            casual: CasualResponder::new(),
            controller: ReasoningController::new(config.max_iterations),
        }
    }

    pub fn retrieval_enabled(&self) -> bool {
        self.retriever.is_some()
    }

    pub fn max_iterations(&self) -> usize {
        self.controller.max_iterations()
    }

    /// Answer `query`, never failing: errors become [`SYSTEM_ERROR_MESSAGE`].
    pub async fn process(&self, query: &str, history: &[Turn]) -> String {
        match self.run(query, history).await {
            Ok(outcome) => outcome.text,
            Err(e) => {
                tracing::error!("Query failed: {:#}", e);
                SYSTEM_ERROR_MESSAGE.to_string()
            }
        }
    }

    /// Answer `query` and report how the answer was produced.
    ///
    /// # Errors
    /// Any model gateway failure. Retrieval failures are absorbed.
    pub async fn run(&self, query: &str, history: &[Turn]) -> anyhow::Result<QueryOutcome> {
        let ctx = AgentContext {
            request_id: Uuid::new_v4(),
            ..self.base_context.clone()
        };
        let span = tracing::info_span!("query", request_id = %ctx.request_id);
        self.answer(&ctx, query, history).instrument(span).await
    }

    async fn answer(
        &self,
        ctx: &AgentContext,
        query: &str,
        history: &[Turn],
    ) -> anyhow::Result<QueryOutcome> {
        let context = format_history(history);

        let passages = match &self.retriever {
            Some(retriever) => {
                let request = RetrievalRequest::from_config(&self.retrieval, query);
                retriever.retrieve(&request).await
            }
            None => Vec::new(),
        };
        let question = build_augmented_query(&passages, query);

        let label = self.router.classify(ctx, &question, &context).await?;
        let route = Route::from_label(&label);
        tracing::info!(route = route.as_str(), label = %label, "Routed query");

        let (raw, resolution) = match route {
            Route::Casual => (self.casual.respond(ctx, &question, &context).await?, None),
            Route::Reasoning => {
                let outcome = self.controller.run(ctx, &question, &context).await?;
                (outcome.answer, Some(outcome.resolution))
            }
        };

        Ok(QueryOutcome {
            text: strip_private_reasoning(&raw).to_string(),
            route,
            resolution,
            passages,
        })
    }
}

/// Combine grounding passages and the user's message into one question.
pub fn build_augmented_query(passages: &[Passage], query: &str) -> String {
    let related = passages
        .iter()
        .enumerate()
        .map(|(i, passage)| format!("[{}] {}", i + 1, passage.text))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        "Related texts:\n{}\n\nThe following below is a message from the User:\n\n{}",
        related, query
    )
}

/// Text after the first [`THINKING_END`], or `text` unchanged if absent.
pub fn strip_private_reasoning(text: &str) -> &str {
    match text.split_once(THINKING_END) {
        Some((_, visible)) => visible,
        None => text,
    }
}
