//! Incremental row extraction for the movies ETL pipeline.
//!
//! [`extract_page`] runs a tracked field's query (built by `etl-query`)
//! against the source database, decodes the page of rows it returns, and
//! slices it into checkpointed batches per [`checkpoint::compute_checkpoint`].

mod checkpoint;
mod error;
mod extractor;
mod row;

pub use checkpoint::compute_checkpoint;
pub use error::{ExtractError, Result};
pub use extractor::{extract_page, ExtractedBatch};
pub use row::{row_to_json, tracked_field_value};
