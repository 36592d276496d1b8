//! Configuration management for the reasoning service.
//!
//! Configuration is read from environment variables:
//! - `LLM_API_KEY` - Required (falls back to `GROQ_API_KEY`). Bearer token for the model endpoint.
//! - `LLM_API_URL` - Optional. OpenAI-compatible chat completions URL. Defaults to Groq.
//! - `DEFAULT_MODEL` - Optional. Model used by every agent. Defaults to `qwen/qwen3-32b`.
//! - `LLM_TEMPERATURE` / `LLM_MAX_TOKENS` - Optional sampling settings (`0.2` / `2048`).
//! - `LLM_TIMEOUT_SECS` / `LLM_MAX_RETRIES` - Optional gateway bounds (`30` / `3`).
//! - `LLM_REASONING_FORMAT` - Optional provider hint for thinking models.
//! - `MAX_ITERATIONS` - Optional. Plan/execute/verify ceiling. Defaults to `3`.
//! - `HOST` / `PORT` - Optional. Server bind address. Defaults to `127.0.0.1:8000`.
//! - `PINECONE_API_KEY` - Optional (falls back to `PINECONE_DEFAULT_API_KEY`). Enables retrieval.
//! - `RETRIEVAL_INDEX`, `RETRIEVAL_NAMESPACE`, `CORPUS_PATH`, `CORPUS_EXTENSIONS`,
//!   `RETRIEVAL_TOP_K`, `CHUNK_WORDS` - Optional retrieval settings.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const DEFAULT_MODEL: &str = "qwen/qwen3-32b";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Retrieval backend and corpus settings.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Vector index API key; retrieval is disabled without one
    pub api_key: Option<String>,

    /// Index holding the corpus chunks
    pub index_name: String,

    /// Namespace inside the index
    pub namespace: String,

    /// Folder scanned for documents to ingest
    pub corpus_path: PathBuf,

    /// Lower-cased file extensions (with leading dot) accepted for ingestion
    pub extensions: Vec<String>,

    /// Passages returned per query
    pub top_k: usize,

    /// Words per ingested chunk
    pub chunk_words: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            index_name: "llama-text-embed-v2-index".to_string(),
            namespace: "example-namespace".to_string(),
            corpus_path: PathBuf::from("./uploads/"),
            extensions: vec![".txt".to_string(), ".doc".to_string(), ".docx".to_string()],
            top_k: 3,
            chunk_words: 500,
        }
    }
}

impl RetrievalConfig {
    /// Check if retrieval is enabled (backend key configured)
    pub fn is_enabled(&self) -> bool {
        self.api_key.as_deref().map_or(false, |k| !k.trim().is_empty())
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Model endpoint API key
    pub api_key: String,

    /// OpenAI-compatible chat completions URL
    pub api_url: String,

    /// Model identifier used by every agent
    pub default_model: String,

    /// Sampling temperature
    pub temperature: f64,

    /// Maximum output tokens per call
    pub max_tokens: u64,

    /// Per-attempt timeout for model calls
    pub request_timeout: Duration,

    /// Gateway retry count for transient failures
    pub max_retries: u32,

    /// Optional `reasoning_format` hint forwarded to the provider
    pub reasoning_format: Option<String>,

    /// Plan/execute/verify ceiling per query
    pub max_iterations: usize,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if no model API key is set, and
    /// `ConfigError::InvalidValue` for unparsable numbers or `MAX_ITERATIONS=0`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = env_any(&["LLM_API_KEY", "GROQ_API_KEY"])
            .ok_or_else(|| ConfigError::MissingEnvVar("LLM_API_KEY".to_string()))?;

        let api_url = std::env::var("LLM_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let default_model =
            std::env::var("DEFAULT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let max_iterations: usize = parse_env("MAX_ITERATIONS", 3)?;
        if max_iterations == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_ITERATIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let defaults = RetrievalConfig::default();
        let retrieval = RetrievalConfig {
            api_key: env_any(&["PINECONE_API_KEY", "PINECONE_DEFAULT_API_KEY"]),
            index_name: std::env::var("RETRIEVAL_INDEX").unwrap_or(defaults.index_name),
            namespace: std::env::var("RETRIEVAL_NAMESPACE").unwrap_or(defaults.namespace),
            corpus_path: std::env::var("CORPUS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.corpus_path),
            extensions: std::env::var("CORPUS_EXTENSIONS")
                .map(|raw| parse_extensions(&raw))
                .unwrap_or(defaults.extensions),
            top_k: parse_env("RETRIEVAL_TOP_K", defaults.top_k)?,
            chunk_words: parse_env("CHUNK_WORDS", defaults.chunk_words)?,
        };
        if retrieval.chunk_words == 0 {
            return Err(ConfigError::InvalidValue(
                "CHUNK_WORDS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            api_key,
            api_url,
            default_model,
            temperature: parse_env("LLM_TEMPERATURE", 0.2)?,
            max_tokens: parse_env("LLM_MAX_TOKENS", 2048)?,
            request_timeout: Duration::from_secs(parse_env("LLM_TIMEOUT_SECS", 30)?),
            max_retries: parse_env("LLM_MAX_RETRIES", 3)?,
            reasoning_format: std::env::var("LLM_REASONING_FORMAT")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            max_iterations,
            host,
            port: parse_env("PORT", 8000)?,
            retrieval,
        })
    }

    /// Create a config with default values (useful for testing).
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: DEFAULT_API_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            temperature: 0.2,
            max_tokens: 2048,
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
            reasoning_format: None,
            max_iterations: 3,
            host: "127.0.0.1".to_string(),
            port: 8000,
            retrieval: RetrievalConfig::default(),
        }
    }
}

/// First non-empty value among the given variables.
fn env_any(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|v| !v.trim().is_empty())
}

fn parse_env<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

/// Normalize a comma-separated extension list to lower-case `.ext` entries.
pub fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|ext| ext.trim().to_lowercase())
        .filter(|ext| !ext.is_empty() && ext != ".")
        .map(|ext| {
            if ext.starts_with('.') {
                ext
            } else {
                format!(".{}", ext)
            }
        })
        .collect()
}
