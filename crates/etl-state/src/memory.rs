use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::checkpoint::CheckpointStore;
use crate::error::Result;

/// In-memory [`CheckpointStore`] fake used by tests. Not durable across
/// process restarts.
#[derive(Default)]
pub struct MemoryCheckpointStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn save(&self, entries: &HashMap<String, String>) -> Result<()> {
        self.entries.lock().unwrap().extend(entries.clone());
        Ok(())
    }

    async fn retrieve(&self) -> Result<HashMap<String, String>> {
        Ok(self.entries.lock().unwrap().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::Checkpoint;

    #[tokio::test]
    async fn get_returns_default_for_unknown_key() {
        let store = MemoryCheckpointStore::new();
        assert_eq!(
            store.get("movies_modified_value", Some("origin")).await.unwrap(),
            Some("origin".to_string())
        );
    }

    #[tokio::test]
    async fn checkpoint_load_returns_origin_before_any_save() {
        let store = MemoryCheckpointStore::new();
        let checkpoint = Checkpoint::load(&store, "movies", "modified").await.unwrap();
        assert_eq!(checkpoint, Checkpoint::origin());
    }

    #[tokio::test]
    async fn checkpoint_save_then_load_round_trips() {
        let store = MemoryCheckpointStore::new();
        let checkpoint = Checkpoint {
            value: Some("2021-06-16T20:14:09.221390+00:00".to_string()),
            offset: 3,
        };
        checkpoint.save(&store, "movies", "modified").await.unwrap();

        let loaded = Checkpoint::load(&store, "movies", "modified").await.unwrap();
        assert_eq!(loaded, checkpoint);
    }

    #[tokio::test]
    async fn save_merges_without_clobbering_unrelated_keys() {
        let store = MemoryCheckpointStore::new();
        let movies = Checkpoint {
            value: Some("a".to_string()),
            offset: 0,
        };
        let genres = Checkpoint {
            value: Some("b".to_string()),
            offset: 1,
        };
        movies.save(&store, "movies", "modified").await.unwrap();
        genres.save(&store, "genres", "modified").await.unwrap();

        assert_eq!(
            Checkpoint::load(&store, "movies", "modified").await.unwrap(),
            movies
        );
        assert_eq!(
            Checkpoint::load(&store, "genres", "modified").await.unwrap(),
            genres
        );
    }
}
