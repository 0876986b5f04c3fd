use crate::document::{ExtractedRow, FilmDocument};
use crate::error::{Result, TransformError};
use crate::movies::MoviesTransform;

/// Reshapes a batch of extracted rows into target documents.
pub trait Transform: Send + Sync {
    fn transform(&self, rows: &[ExtractedRow]) -> Result<Vec<FilmDocument>>;
}

/// The closed set of transforms a binding's `transform_class` can name,
/// resolved at config-load time rather than through a string→dyn-trait
/// registry keyed at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    Movies,
}

impl TransformKind {
    pub fn parse(transform_class: &str) -> Result<Self> {
        match transform_class {
            "movies" => Ok(TransformKind::Movies),
            other => Err(TransformError::UnknownTransformKind(other.to_string())),
        }
    }

    pub fn build(self) -> Box<dyn Transform> {
        match self {
            TransformKind::Movies => Box::new(MoviesTransform),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_movies() {
        assert_eq!(TransformKind::parse("movies").unwrap(), TransformKind::Movies);
    }

    #[test]
    fn parse_rejects_unknown_transform_class() {
        assert!(TransformKind::parse("unknown").is_err());
    }
}
