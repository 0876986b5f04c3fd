//! Row-to-document transforms for the movies ETL pipeline.
//!
//! [`TransformKind`] is a closed registry mapping a binding's configured
//! `transform_class` name to a boxed [`Transform`]; [`MoviesTransform`] is
//! the one concrete implementation, denormalizing aggregated person rows
//! into per-role name arrays and a structured `actors` list.

mod document;
mod error;
mod movies;
mod transform;

pub use document::{ExtractedRow, FilmDocument, PersonRole, PersonRow, PersonSummary};
pub use error::{Result, TransformError};
pub use movies::MoviesTransform;
pub use transform::{Transform, TransformKind};
