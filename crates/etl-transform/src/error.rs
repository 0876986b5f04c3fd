use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("row did not match the expected document shape: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("no transform registered for transform_class '{0}'")]
    UnknownTransformKind(String),
}

pub type Result<T> = std::result::Result<T, TransformError>;
