use std::path::Path;
use std::time::Duration;

use etl_retry::{retry_with_backoff, RetryPolicy};
use etl_transform::FilmDocument;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::error::{LoadError, Result};

/// Outcome of one bulk load call: how many documents the search engine
/// accepted, and the per-document rejections it reported (malformed
/// mapping, version conflict, etc). Rejections are not retried — only
/// transport-level failures are.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadOutcome {
    pub success_count: usize,
    pub errors: Vec<DocumentError>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentError {
    pub id: String,
    pub reason: String,
}

/// HTTP client for the search engine's index and bulk document APIs.
pub struct SearchIndexClient {
    http: reqwest::Client,
    base_url: String,
    retry_policy: RetryPolicy,
}

impl SearchIndexClient {
    pub fn new(host: &str, port: u16, use_tls: bool) -> Self {
        let scheme = if use_tls { "https" } else { "http" };
        let http = reqwest::Client::builder()
            .user_agent("movies-etl/0.1.0")
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("failed to construct the search index HTTP client");

        SearchIndexClient {
            http,
            base_url: format!("{scheme}://{host}:{port}"),
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Creates `index` from the on-disk JSON mapping file if it doesn't
    /// already exist. Idempotent: a pre-existing index is left untouched.
    #[instrument(skip(self, mapping_path), fields(index = %index))]
    pub async fn ensure_index(&self, index: &str, mapping_path: &Path) -> Result<()> {
        let url = format!("{}/{}", self.base_url, index);

        let exists = retry_with_backoff(self.retry_policy, "search-index:head", || async {
            self.http.head(&url).send().await.map(|resp| resp.status().is_success())
        })
        .await;

        if exists {
            return Ok(());
        }

        let raw = std::fs::read_to_string(mapping_path).map_err(|source| LoadError::MappingRead {
            path: mapping_path.display().to_string(),
            source,
        })?;
        let mapping: Value = serde_json::from_str(&raw).map_err(|source| LoadError::MappingParse {
            path: mapping_path.display().to_string(),
            source,
        })?;

        retry_with_backoff(self.retry_policy, "search-index:create", || async {
            self.http.put(&url).json(&mapping).send().await?.error_for_status()
        })
        .await;

        info!(index, "created search index from mapping file");
        Ok(())
    }

    /// Bulk-upserts `documents` by id into `index` via the search engine's
    /// newline-delimited bulk API. Each document contributes one
    /// action-and-metadata line followed by one document line.
    #[instrument(skip(self, documents), fields(index = %index, count = documents.len()))]
    pub async fn load(&self, index: &str, documents: &[FilmDocument]) -> Result<LoadOutcome> {
        if documents.is_empty() {
            return Ok(LoadOutcome::default());
        }

        let mut body = String::new();
        for document in documents {
            let action = serde_json::json!({ "index": { "_index": index, "_id": document.document_id() } });
            body.push_str(&action.to_string());
            body.push('\n');
            body.push_str(&serde_json::to_string(document)?);
            body.push('\n');
        }

        let url = format!("{}/_bulk", self.base_url);
        let response = retry_with_backoff(self.retry_policy, "search-index:bulk", || async {
            self.http
                .post(&url)
                .header("Content-Type", "application/x-ndjson")
                .body(body.clone())
                .send()
                .await
        })
        .await;

        let response = response.error_for_status().map_err(LoadError::Transport)?;
        let body: Value = response.json().await.map_err(LoadError::Transport)?;
        Ok(parse_bulk_response(&body))
    }
}

fn parse_bulk_response(body: &Value) -> LoadOutcome {
    let mut outcome = LoadOutcome::default();
    let items = body.get("items").and_then(Value::as_array).cloned().unwrap_or_default();

    for item in items {
        let Some(action) = item.get("index").or_else(|| item.get("update")) else {
            continue;
        };
        let id = action.get("_id").and_then(Value::as_str).unwrap_or_default().to_string();
        match action.get("error") {
            None => outcome.success_count += 1,
            Some(error) => {
                let reason = error
                    .get("reason")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown bulk error")
                    .to_string();
                warn!(id, reason, "search index rejected document");
                outcome.errors.push(DocumentError { id, reason });
            }
        }
    }

    outcome
}
