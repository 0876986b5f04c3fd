use std::path::PathBuf;
use std::sync::Arc;

use etl_config::{EtlExchangeSettings, Settings};
use etl_extract::extract_page;
use etl_load::SearchIndexClient;
use etl_query::{QueryBuilder, TrackedFieldQuery};
use etl_state::{Checkpoint, CheckpointStore};
use etl_transform::{ExtractedRow, Transform, TransformError, TransformKind};
use tokio_postgres::Client;
use tracing::{info, instrument, warn};

use crate::connection;
use crate::error::Result;

/// Drives the extract/transform/load cycle for every configured binding,
/// tracked field by tracked field, persisting checkpoints as it goes.
pub struct Orchestrator {
    settings: Settings,
    config_dir: PathBuf,
    state: Arc<dyn CheckpointStore>,
}

impl Orchestrator {
    pub fn new(settings: Settings, config_dir: PathBuf, state: Arc<dyn CheckpointStore>) -> Self {
        Orchestrator { settings, config_dir, state }
    }

    /// Runs the outer loop once (`once = true`) or forever, sleeping
    /// `pause_between_repeated_requests` between full passes.
    pub async fn run(&self, once: bool) -> Result<()> {
        let loader = SearchIndexClient::new(
            &self.settings.search_engine.host,
            self.settings.search_engine.port,
            self.settings.search_engine.use_tls,
        );
        let mut db = connection::connect(&self.settings.postgres).await?;

        loop {
            for binding in &self.settings.etl.bindings_elastic_to_sql {
                if let Err(err) = self.process_binding(&mut db, &loader, binding).await {
                    warn!(error = %err, index = %binding.elastic_index, "binding failed this cycle, reopening source connection");
                    db = connection::connect(&self.settings.postgres).await?;
                }
            }

            if once {
                return Ok(());
            }
            tokio::time::sleep(self.settings.pause_between_repeated_requests).await;
        }
    }

    #[instrument(skip(self, db, loader, binding), fields(index = %binding.elastic_index))]
    async fn process_binding(&self, db: &mut Client, loader: &SearchIndexClient, binding: &EtlExchangeSettings) -> Result<()> {
        if let Some(mapping_file) = &binding.mapping_file {
            let mapping_path = self.config_dir.join(mapping_file);
            loader.ensure_index(&binding.elastic_index, &mapping_path).await?;
        }

        let transform = TransformKind::parse(&binding.transform_class)?.build();
        let builder = QueryBuilder::new(binding, &self.settings.etl.sql_db);
        let queries = builder.build();

        for query in queries.values() {
            self.drain_tracked_field(db, loader, transform.as_ref(), &binding.elastic_index, query).await?;
        }
        Ok(())
    }

    #[instrument(skip(self, db, loader, transform, query), fields(index = %index, field = %query.field_full_name))]
    async fn drain_tracked_field(
        &self,
        db: &Client,
        loader: &SearchIndexClient,
        transform: &dyn Transform,
        index: &str,
        query: &TrackedFieldQuery,
    ) -> Result<()> {
        let batch_size = self.settings.etl.etl_batch_size;
        let query_limit = self.settings.etl.sql_db.query_entries_limit;

        loop {
            let checkpoint = self.load_checkpoint(index, &query.field_full_name).await?;
            let batches = extract_page(db, query, &checkpoint, batch_size).await?;
            let page_rows: usize = batches.iter().map(|batch| batch.rows.len()).sum();

            for batch in &batches {
                if batch.rows.is_empty() {
                    continue;
                }

                let rows: Vec<ExtractedRow> = batch
                    .rows
                    .iter()
                    .cloned()
                    .map(|value| serde_json::from_value(value).map_err(TransformError::Malformed))
                    .collect::<std::result::Result<_, TransformError>>()?;
                let documents = transform.transform(&rows)?;

                let outcome = loader.load(index, &documents).await?;
                if !outcome.errors.is_empty() {
                    for error in &outcome.errors {
                        warn!(document_id = %error.id, reason = %error.reason, "search index rejected a document, checkpoint not advanced this batch");
                    }
                    return Ok(());
                }

                self.save_checkpoint(index, &query.field_full_name, &batch.checkpoint).await?;
                info!(delivered = documents.len(), "batch loaded");
            }

            let page_is_full = matches!(query_limit, Some(limit) if page_rows as i64 == limit);
            if !page_is_full {
                return Ok(());
            }
        }
    }

    async fn load_checkpoint(&self, index: &str, tracked_field: &str) -> Result<Checkpoint> {
        Checkpoint::load(self.state.as_ref(), index, tracked_field).await.map_err(Into::into)
    }

    async fn save_checkpoint(&self, index: &str, tracked_field: &str, checkpoint: &Checkpoint) -> Result<()> {
        checkpoint.save(self.state.as_ref(), index, tracked_field).await.map_err(Into::into)
    }
}
