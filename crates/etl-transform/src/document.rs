use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row as assembled by the extraction query: the root film's own
/// columns plus its aggregated `genre` and `persons` arrays, still in the
/// column shape the query builder's aliases produced.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedRow {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub imdb_rating: Option<f64>,
    #[serde(default)]
    pub genre: Vec<String>,
    #[serde(default)]
    pub persons: Vec<PersonRow>,
}

/// One entry of a row's aggregated `persons` array.
#[derive(Debug, Clone, Deserialize)]
pub struct PersonRow {
    pub id: Uuid,
    pub role: PersonRole,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonRole {
    Director,
    Actor,
    Writer,
    Producer,
    #[serde(other)]
    Unknown,
}

/// Target document shape: one per film, with related persons collapsed
/// into per-role name arrays plus a structured `actors` list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilmDocument {
    pub id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_rating: Option<f64>,
    pub genre: Vec<String>,
    pub director: Vec<String>,
    pub actors_names: Vec<String>,
    pub writers_names: Vec<String>,
    pub actors: Vec<PersonSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonSummary {
    pub id: Uuid,
    pub name: String,
}

impl FilmDocument {
    /// The id the search engine's bulk API upserts by, so re-delivery of
    /// the same film is always an update rather than a duplicate.
    pub fn document_id(&self) -> String {
        self.id.to_string()
    }
}
