//! Hosted vector index client (Pinecone, integrated-embedding indexes).
//!
//! The index embeds text server-side, so records are upserted and searched as
//! plain text. Index hosts are resolved once through the control plane.
//! Every call has a per-attempt timeout and a bounded number of retries for
//! transient failures.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use super::ingest::{self, CorpusFingerprint};
use super::{Passage, RetrievalRequest, Retriever};
use crate::llm::{parse_retry_after, LlmError, RetryConfig};

const CONTROL_PLANE_URL: &str = "https://api.pinecone.io";
const API_VERSION: &str = "2025-04";

/// Maximum records per upsert request.
const UPSERT_BATCH: usize = 96;

pub struct PineconeRetriever {
    client: Client,
    api_key: String,
    control_plane_url: String,
    retry_config: RetryConfig,
    /// index name -> data-plane base URL
    hosts: RwLock<HashMap<String, String>>,
    /// (index, namespace, corpus) -> fingerprint of the last successful upsert
    ingested: Mutex<HashMap<(String, String, PathBuf), CorpusFingerprint>>,
}

impl PineconeRetriever {
    pub fn new(api_key: String) -> anyhow::Result<Self> {
        Self::with_endpoint(api_key, CONTROL_PLANE_URL.to_string(), RetryConfig::default())
    }

    /// Client for a specific control plane with its own timeout and retry bounds.
    pub fn with_endpoint(
        api_key: String,
        control_plane_url: String,
        retry_config: RetryConfig,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(retry_config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            api_key,
            control_plane_url: control_plane_url.trim_end_matches('/').to_string(),
            retry_config,
            hosts: RwLock::new(HashMap::new()),
            ingested: Mutex::new(HashMap::new()),
        })
    }

    /// Execute a single request without retry.
    async fn send_once(&self, request: RequestBuilder) -> Result<String, LlmError> {
        let response = request
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let retry_after = parse_retry_after(response.headers());
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(LlmError::from_status(status.as_u16(), &body, retry_after));
        }
        Ok(body)
    }

    /// Execute a request with automatic retry for transient errors.
    ///
    /// `build` is called once per attempt.
    async fn send_with_retry<F>(&self, action: &str, build: F) -> Result<String, LlmError>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let start = Instant::now();
        let mut attempt = 0;

        loop {
            let error = match self.send_once(build()).await {
                Ok(body) => return Ok(body),
                Err(error) => error,
            };

            let remaining = self
                .retry_config
                .max_retry_duration
                .saturating_sub(start.elapsed());
            if !self.retry_config.should_retry(&error, attempt) || remaining.is_zero() {
                return Err(error);
            }

            let delay = error.suggested_delay(attempt).min(remaining);
            tracing::warn!(
                "Index {} attempt {} failed with {}, retrying in {:?}",
                action,
                attempt + 1,
                error.kind,
                delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Resolve (and cache) the data-plane URL of `index`.
    async fn index_host(&self, index: &str) -> anyhow::Result<String> {
        if let Some(host) = self.hosts.read().await.get(index) {
            return Ok(host.clone());
        }

        let url = format!("{}/indexes/{}", self.control_plane_url, index);
        let body = self
            .send_with_retry("describe", || self.client.get(&url))
            .await
            .map_err(|e| anyhow::anyhow!("Index describe failed: {}", e))?;
        let description: IndexDescription = serde_json::from_str(&body)
            .map_err(|e| anyhow::anyhow!("Failed to parse index description: {} - {}", e, body))?;

        let host = normalize_host(&description.host);
        self.hosts
            .write()
            .await
            .insert(index.to_string(), host.clone());
        Ok(host)
    }

    /// Remove every record in `namespace`. A namespace that does not exist yet is fine.
    async fn clear_namespace(&self, host: &str, namespace: &str) -> anyhow::Result<()> {
        let url = format!("{}/vectors/delete", host);
        let body = serde_json::json!({ "deleteAll": true, "namespace": namespace });
        match self
            .send_with_retry("delete", || self.client.post(&url).json(&body))
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if e.status_code == Some(404) => Ok(()),
            Err(e) => Err(anyhow::anyhow!("Index delete failed: {}", e)),
        }
    }

    /// Replace the namespace's records if the corpus changed since the last
    /// successful ingestion.
    async fn ensure_ingested(&self, host: &str, request: &RetrievalRequest) -> anyhow::Result<()> {
        let dir = request.corpus_path.clone();
        let extensions = request.extensions.clone();
        let (files, current) = tokio::task::spawn_blocking(move || {
            let files = ingest::list_corpus_files(&dir, &extensions)?;
            let fingerprint = ingest::fingerprint(&files);
            Ok::<_, anyhow::Error>((files, fingerprint))
        })
        .await??;

        if current.is_empty() {
            tracing::debug!("No corpus files in {}", request.corpus_path.display());
            return Ok(());
        }

        let key = (
            request.index_name.clone(),
            request.namespace.clone(),
            request.corpus_path.clone(),
        );
        // Held across the upsert so concurrent queries ingest once.
        let mut ingested = self.ingested.lock().await;
        if ingested.get(&key) == Some(&current) {
            return Ok(());
        }

        let chunk_words = request.chunk_words;
        let chunks =
            tokio::task::spawn_blocking(move || ingest::collect_chunks(&files, chunk_words)).await?;
        tracing::info!("Total chunks created: {}", chunks.len());

        let records: Vec<UpsertRecord> = chunks
            .into_iter()
            .enumerate()
            .map(|(i, text)| UpsertRecord {
                id: format!("vec{}", i + 1),
                text,
            })
            .collect();

        // Ids are positional, so records of removed text must not survive.
        self.clear_namespace(host, &request.namespace).await?;

        let url = format!("{}/records/namespaces/{}/upsert", host, request.namespace);
        for batch in records.chunks(UPSERT_BATCH) {
            let body = ndjson_body(batch)?;
            self.send_with_retry("upsert", || {
                self.client
                    .post(&url)
                    .header("Content-Type", "application/x-ndjson")
                    .body(body.clone())
            })
            .await
            .map_err(|e| anyhow::anyhow!("Index upsert failed: {}", e))?;
        }

        ingested.insert(key, current);
        Ok(())
    }
}

#[async_trait]
impl Retriever for PineconeRetriever {
    async fn search(&self, request: &RetrievalRequest) -> anyhow::Result<Vec<Passage>> {
        let host = self.index_host(&request.index_name).await?;

        if let Err(e) = self.ensure_ingested(&host, request).await {
            tracing::warn!("Corpus ingestion failed, searching existing records: {:#}", e);
        }

        let url = format!("{}/records/namespaces/{}/search", host, request.namespace);
        let body = serde_json::json!({
            "query": {
                "inputs": { "text": request.query },
                "top_k": request.top_k,
            },
            "fields": ["text"],
        });
        let body = self
            .send_with_retry("search", || self.client.post(&url).json(&body))
            .await
            .map_err(|e| anyhow::anyhow!("Index search failed: {}", e))?;

        let passages = parse_hits(&body)?;
        tracing::debug!("Retrieved {} passages", passages.len());
        Ok(passages)
    }
}

fn transport_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::timeout(format!("Request timeout: {}", e))
    } else {
        LlmError::network_error(format!("Request failed: {}", e))
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

fn ndjson_body(records: &[UpsertRecord]) -> anyhow::Result<String> {
    let lines = records
        .iter()
        .map(serde_json::to_string)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(lines.join("\n"))
}

fn parse_hits(body: &str) -> anyhow::Result<Vec<Passage>> {
    let response: SearchResponse = serde_json::from_str(body)
        .map_err(|e| anyhow::anyhow!("Failed to parse search response: {} - {}", e, body))?;

    Ok(response
        .result
        .hits
        .into_iter()
        .filter_map(|hit| {
            hit.fields.text.map(|text| Passage {
                id: hit.id,
                score: hit.score,
                text,
            })
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    host: String,
}

#[derive(Debug, Serialize)]
struct UpsertRecord {
    #[serde(rename = "_id")]
    id: String,
    text: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: SearchResult,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score", default)]
    score: Option<f64>,
    #[serde(default)]
    fields: HitFields,
}

#[derive(Debug, Default, Deserialize)]
struct HitFields {
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex as StdMutex};

    use axum::extract::State;
    use axum::http::{header, Method, StatusCode, Uri};
    use axum::response::{IntoResponse, Json, Response};
    use axum::Router;
    use tempfile::tempdir;

    use crate::config::RetrievalConfig;

    /// In-process stand-in for the control and data planes.
    struct MockIndex {
        base_url: String,
        log: StdMutex<Vec<String>>,
        search_statuses: StdMutex<VecDeque<u16>>,
    }

    impl MockIndex {
        fn log(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }

        fn count(&self, suffix: &str) -> usize {
            self.log().iter().filter(|line| line.ends_with(suffix)).count()
        }
    }

    async fn handle(State(mock): State<Arc<MockIndex>>, method: Method, uri: Uri) -> Response {
        let path = uri.path().to_string();
        mock.log.lock().unwrap().push(format!("{} {}", method, path));

        if path.starts_with("/indexes/") {
            return Json(serde_json::json!({ "name": "idx", "host": mock.base_url })).into_response();
        }
        if path == "/vectors/delete" {
            return (StatusCode::NOT_FOUND, "Namespace not found").into_response();
        }
        if path.ends_with("/search") {
            let queued = mock.search_statuses.lock().unwrap().pop_front();
            if let Some(code) = queued {
                let status = StatusCode::from_u16(code).unwrap();
                return (status, [(header::RETRY_AFTER, "0")], "try later").into_response();
            }
            return Json(serde_json::json!({
                "result": { "hits": [
                    { "_id": "vec1", "_score": 0.9, "fields": { "text": "Matte paint hides flaws." } }
                ]}
            }))
            .into_response();
        }
        StatusCode::CREATED.into_response()
    }

    async fn start_mock(search_statuses: &[u16]) -> Arc<MockIndex> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mock = Arc::new(MockIndex {
            base_url: format!("http://{}", listener.local_addr().unwrap()),
            log: StdMutex::default(),
            search_statuses: StdMutex::new(search_statuses.iter().copied().collect()),
        });
        let app = Router::new().fallback(handle).with_state(Arc::clone(&mock));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        mock
    }

    fn retriever(mock: &MockIndex) -> PineconeRetriever {
        let retry_config = RetryConfig {
            max_retries: 2,
            ..RetryConfig::default()
        };
        PineconeRetriever::with_endpoint("pc-key".to_string(), mock.base_url.clone(), retry_config)
            .unwrap()
    }

    fn request(corpus: &std::path::Path) -> RetrievalRequest {
        let config = RetrievalConfig {
            index_name: "idx".to_string(),
            namespace: "ns".to_string(),
            corpus_path: corpus.to_path_buf(),
            ..RetrievalConfig::default()
        };
        RetrievalRequest::from_config(&config, "Which finish?")
    }

    #[tokio::test]
    async fn transient_search_errors_are_retried() {
        let mock = start_mock(&[503, 503]).await;
        let dir = tempdir().unwrap();

        let passages = retriever(&mock).retrieve(&request(&dir.path().join("absent"))).await;

        assert_eq!(passages.len(), 1);
        assert_eq!(passages[0].text, "Matte paint hides flaws.");
        assert_eq!(mock.count("/search"), 3);
    }

    #[tokio::test]
    async fn persistent_failure_stops_after_retry_budget() {
        let mock = start_mock(&[503, 503, 503, 503, 503]).await;
        let dir = tempdir().unwrap();

        let passages = retriever(&mock).retrieve(&request(&dir.path().join("absent"))).await;

        assert!(passages.is_empty());
        assert_eq!(mock.count("/search"), 3);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let mock = start_mock(&[400]).await;
        let dir = tempdir().unwrap();

        let passages = retriever(&mock).retrieve(&request(&dir.path().join("absent"))).await;

        assert!(passages.is_empty());
        assert_eq!(mock.count("/search"), 1);
    }

    #[tokio::test]
    async fn changed_corpus_replaces_stale_records() {
        let mock = start_mock(&[]).await;
        let dir = tempdir().unwrap();
        let file = dir.path().join("guide.txt");
        std::fs::write(&file, "north facing rooms get cool light").unwrap();
        let retriever = retriever(&mock);
        let request = request(dir.path());

        retriever.retrieve(&request).await;
        retriever.retrieve(&request).await;
        assert_eq!(
            mock.log(),
            vec![
                "GET /indexes/idx",
                "POST /vectors/delete",
                "POST /records/namespaces/ns/upsert",
                "POST /records/namespaces/ns/search",
                "POST /records/namespaces/ns/search",
            ]
        );

        std::fs::write(&file, "short").unwrap();
        retriever.retrieve(&request).await;
        assert_eq!(mock.count("/vectors/delete"), 2);
        assert_eq!(mock.count("/upsert"), 2);
        assert_eq!(mock.count("/indexes/idx"), 1);
    }

    #[test]
    fn hosts_get_https_scheme() {
        assert_eq!(
            normalize_host("idx-abc.svc.us-east-1.pinecone.io"),
            "https://idx-abc.svc.us-east-1.pinecone.io"
        );
        assert_eq!(normalize_host("http://localhost:5080/"), "http://localhost:5080");
    }

    #[test]
    fn upsert_body_is_one_record_per_line() {
        let records = vec![
            UpsertRecord { id: "vec1".to_string(), text: "first chunk".to_string() },
            UpsertRecord { id: "vec2".to_string(), text: "second \"chunk\"".to_string() },
        ];
        let body = ndjson_body(&records).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"_id":"vec1","text":"first chunk"}"#);
        assert_eq!(lines[1], r#"{"_id":"vec2","text":"second \"chunk\""}"#);
    }

    #[test]
    fn hits_keep_rank_order_and_skip_textless() {
        let body = r#"{
            "result": {"hits": [
                {"_id": "vec7", "_score": 0.91, "fields": {"text": "Matte paint hides flaws."}},
                {"_id": "vec2", "_score": 0.80, "fields": {}},
                {"_id": "vec3", "_score": 0.75, "fields": {"text": "North light is cool."}}
            ]},
            "usage": {"read_units": 6}
        }"#;
        let passages = parse_hits(body).unwrap();
        assert_eq!(passages.len(), 2);
        assert_eq!(passages[0].id, "vec7");
        assert_eq!(passages[0].score, Some(0.91));
        assert_eq!(passages[1].text, "North light is cool.");
    }

    #[test]
    fn malformed_search_response_is_error() {
        assert!(parse_hits("not json").is_err());
    }
}
