use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("source database query failed: {0}")]
    Query(#[from] tokio_postgres::Error),

    #[error("row '{column}' could not be decoded as JSON: {source}")]
    RowDecode {
        column: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("row is missing the tracked field column '_tracked_field'")]
    MissingTrackedField,
}

pub type Result<T> = std::result::Result<T, ExtractError>;
