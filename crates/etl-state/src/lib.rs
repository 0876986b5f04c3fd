//! Checkpoint persistence for the movies ETL pipeline.
//!
//! [`CheckpointStore`] is a flat key→string hash; [`Checkpoint`] layers the
//! pipeline's `(value, offset)` pair on top of it under the
//! `<index>_<tracked_field>_{value,offset}` key convention. [`RedisCheckpointStore`]
//! is the production backend; [`MemoryCheckpointStore`] is an in-memory fake
//! for tests.

mod checkpoint;
mod error;
mod memory;
mod redis_store;

pub use checkpoint::{Checkpoint, CheckpointStore};
pub use error::{Result, StateError};
pub use memory::MemoryCheckpointStore;
pub use redis_store::RedisCheckpointStore;
