//! Bulk document upload into the configured search index.
//!
//! [`SearchIndexClient`] wraps the search engine's index-management and
//! bulk document HTTP APIs, routing transport failures through
//! `etl-retry`'s backoff harness while per-document rejections are
//! surfaced to the caller untouched.

mod client;
mod error;

pub use client::{DocumentError, LoadOutcome, SearchIndexClient};
pub use error::{LoadError, Result};
