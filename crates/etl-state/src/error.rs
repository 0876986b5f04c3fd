use thiserror::Error;

/// Errors that can occur while reading or writing pipeline checkpoints.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("state backend connection failed: {0}")]
    Connection(String),

    #[error("state backend query failed: {0}")]
    Query(String),

    #[error("failed to serialize checkpoint for '{key}': {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to deserialize checkpoint for '{key}': {source}")]
    Deserialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<redis::RedisError> for StateError {
    fn from(err: redis::RedisError) -> Self {
        StateError::Query(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StateError>;
