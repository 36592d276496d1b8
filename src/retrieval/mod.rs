//! Retrieval gateway for grounding passages.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐   retrieve()   ┌──────────────────┐
//! │ QueryPipeline │──────────────▶│ PineconeRetriever │
//! └───────────────┘                └────────┬─────────┘
//!                                   ingest  │  search
//!                          ┌────────────────┼────────────────┐
//!                          ▼                                 ▼
//!                  ┌──────────────┐                 ┌────────────────┐
//!                  │ corpus folder│                 │ hosted index   │
//!                  │ (.txt/.docx) │                 │ (integrated    │
//!                  └──────────────┘                 │  embeddings)   │
//!                                                   └────────────────┘
//! ```
//!
//! Retrieval is optional: failures collapse to an empty passage list and the
//! caller answers without grounding.

pub mod ingest;
mod pinecone;

pub use pinecone::PineconeRetriever;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::RetrievalConfig;

/// A ranked text snippet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Passage {
    pub id: String,
    pub score: Option<f64>,
    pub text: String,
}

/// Parameters of one retrieval call.
#[derive(Debug, Clone)]
pub struct RetrievalRequest {
    pub query: String,
    pub index_name: String,
    pub corpus_path: PathBuf,
    pub extensions: Vec<String>,
    pub namespace: String,
    pub top_k: usize,
    pub chunk_words: usize,
}

impl RetrievalRequest {
    /// Request for `query` using the configured index and corpus.
    pub fn from_config(config: &RetrievalConfig, query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            index_name: config.index_name.clone(),
            corpus_path: config.corpus_path.clone(),
            extensions: config.extensions.clone(),
            namespace: config.namespace.clone(),
            top_k: config.top_k,
            chunk_words: config.chunk_words,
        }
    }
}

/// Trait for retrieval backends.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Search the backend; errors are reported to the caller.
    async fn search(&self, request: &RetrievalRequest) -> anyhow::Result<Vec<Passage>>;

    /// Ranked passages (best first, at most `top_k`), empty on any failure.
    async fn retrieve(&self, request: &RetrievalRequest) -> Vec<Passage> {
        match self.search(request).await {
            Ok(mut passages) => {
                passages.truncate(request.top_k);
                passages
            }
            Err(e) => {
                tracing::warn!("Retrieval failed, continuing without grounding: {:#}", e);
                Vec::new()
            }
        }
    }
}

/// Build the retrieval backend.
///
/// Returns `None` if retrieval is not configured (no index API key).
pub fn init_retrieval(config: &RetrievalConfig) -> Option<Arc<dyn Retriever>> {
    if !config.is_enabled() {
        tracing::info!("Retrieval disabled (no index API key)");
        return None;
    }

    let api_key = config.api_key.clone()?;
    match PineconeRetriever::new(api_key) {
        Ok(retriever) => {
            tracing::info!(
                "Retrieval enabled (index={}, namespace={}, corpus={})",
                config.index_name,
                config.namespace,
                config.corpus_path.display()
            );
            Some(Arc::new(retriever))
        }
        Err(e) => {
            tracing::warn!("Retrieval disabled, client setup failed: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingRetriever, StaticRetriever};

    #[tokio::test]
    async fn failures_become_empty_results() {
        let request = RetrievalRequest::from_config(&RetrievalConfig::default(), "glare");
        assert!(FailingRetriever.retrieve(&request).await.is_empty());
    }

    #[tokio::test]
    async fn results_are_capped_at_top_k() {
        let retriever = StaticRetriever::new(&["a", "b", "c", "d"]);
        let mut request = RetrievalRequest::from_config(&RetrievalConfig::default(), "paint");
        request.top_k = 2;

        let passages = retriever.retrieve(&request).await;
        let texts: Vec<_> = passages.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b"]);
        assert_eq!(retriever.queries(), vec!["paint"]);
    }

    #[test]
    fn disabled_without_key() {
        assert!(init_retrieval(&RetrievalConfig::default()).is_none());
    }
}
