use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("source database connection failed: {0}")]
    Connect(#[from] tokio_postgres::Error),

    #[error(transparent)]
    State(#[from] etl_state::StateError),

    #[error(transparent)]
    Extract(#[from] etl_extract::ExtractError),

    #[error(transparent)]
    Transform(#[from] etl_transform::TransformError),

    #[error(transparent)]
    Load(#[from] etl_load::LoadError),

    #[error(transparent)]
    Config(#[from] etl_config::ConfigError),
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
