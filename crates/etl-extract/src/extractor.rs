use etl_query::{render, QueryParam, TrackedFieldQuery};
use etl_state::Checkpoint;
use tokio_postgres::types::ToSql;
use tokio_postgres::Client;
use tracing::instrument;

use crate::checkpoint::compute_checkpoint;
use crate::error::Result;
use crate::row::{row_to_json, tracked_field_value};

/// One `batch_size`-sized slice of rows extracted for a single tracked
/// field, paired with the checkpoint that should be persisted once the
/// batch has been loaded successfully.
#[derive(Debug, Clone)]
pub struct ExtractedBatch {
    pub rows: Vec<serde_json::Value>,
    pub checkpoint: Checkpoint,
}

fn bind_params(params: &[QueryParam]) -> Vec<Box<dyn ToSql + Sync + Send>> {
    params
        .iter()
        .map(|param| match param {
            QueryParam::TrackedValue(value) => Box::new(value.clone()) as Box<dyn ToSql + Sync + Send>,
            QueryParam::Offset(offset) => Box::new(*offset) as Box<dyn ToSql + Sync + Send>,
        })
        .collect()
}

/// Runs one tracked field's extraction query for a single page (bounded by
/// the binding's `query_entries_limit`), then slices the page into
/// `batch_size`-sized batches, threading the checkpoint forward across
/// them with [`compute_checkpoint`].
///
/// A page shorter than `query_entries_limit` means the source table has no
/// more matching rows this cycle; the caller (the orchestrator) only needs
/// to run another page when this one came back full.
#[instrument(skip(client, query, params_checkpoint), fields(field = %query.field_full_name))]
pub async fn extract_page(
    client: &Client,
    query: &TrackedFieldQuery,
    params_checkpoint: &Checkpoint,
    batch_size: usize,
) -> Result<Vec<ExtractedBatch>> {
    let (sql, params) = render(query, params_checkpoint.value.as_deref(), params_checkpoint.offset as i64);
    let boxed_params = bind_params(&params);
    let param_refs: Vec<&(dyn ToSql + Sync)> = boxed_params.iter().map(|p| p.as_ref() as &(dyn ToSql + Sync)).collect();

    let rows = client.query(&sql, &param_refs).await?;

    let mut batches = Vec::new();
    let mut running_value = params_checkpoint.value.clone();
    let mut running_offset = params_checkpoint.offset;

    for chunk in rows.chunks(batch_size) {
        let mut tracked_values = Vec::with_capacity(chunk.len());
        let mut documents = Vec::with_capacity(chunk.len());
        for row in chunk {
            tracked_values.push(tracked_field_value(row)?);
            documents.push(row_to_json(row)?);
        }

        let (value, offset) = compute_checkpoint(&tracked_values, batch_size, running_value.as_deref(), running_offset);
        running_value = value.clone();
        running_offset = offset;

        batches.push(ExtractedBatch {
            rows: documents,
            checkpoint: Checkpoint { value, offset },
        });
    }

    Ok(batches)
}
