use thiserror::Error;

/// Errors that can occur while loading or validating pipeline configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("missing required environment variable: {0}")]
    MissingEnv(String),

    #[error("invalid environment variable {name}: {value}")]
    InvalidEnv { name: String, value: String },

    #[error("binding '{elastic_index}': {reason}")]
    InvalidBinding { elastic_index: String, reason: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
