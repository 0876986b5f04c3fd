//! Wires the state store, extractor, transformer and loader together into
//! the movies ETL pipeline's outer loop: for each configured binding and
//! each of its tracked fields, read a checkpoint, extract, transform,
//! load, and persist the new checkpoint — forever, or once with `--once`.

mod connection;
mod error;
mod run;

pub use error::{OrchestratorError, Result};
pub use run::Orchestrator;
