use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("search index transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("index mapping file '{path}' could not be read: {source}")]
    MappingRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("index mapping file '{path}' is not valid JSON: {source}")]
    MappingParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("bulk response body could not be decoded: {0}")]
    ResponseDecode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LoadError>;
