use std::collections::HashMap;

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::instrument;

use crate::checkpoint::CheckpointStore;
use crate::error::{Result, StateError};

const STORAGE_HASH_KEY: &str = "storage";

/// Redis-backed [`CheckpointStore`]. All checkpoint scalars live as fields
/// of the single hash `storage`, matching the wire shape the rest of this
/// codebase's deployments expect when inspecting pipeline progress with
/// `redis-cli HGETALL storage`.
pub struct RedisCheckpointStore {
    manager: redis::aio::ConnectionManager,
}

impl RedisCheckpointStore {
    #[instrument(skip(redis_url))]
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|err| StateError::Connection(err.to_string()))?;
        let manager = client
            .get_connection_manager()
            .await
            .map_err(|err| StateError::Connection(err.to_string()))?;
        Ok(RedisCheckpointStore { manager })
    }
}

#[async_trait]
impl CheckpointStore for RedisCheckpointStore {
    #[instrument(skip(self, entries), fields(count = entries.len()))]
    async fn save(&self, entries: &HashMap<String, String>) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let mut conn = self.manager.clone();
        let pairs: Vec<(&String, &String)> = entries.iter().collect();
        conn.hset_multiple::<_, _, _, ()>(STORAGE_HASH_KEY, &pairs)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn retrieve(&self) -> Result<HashMap<String, String>> {
        let mut conn = self.manager.clone();
        let map: HashMap<String, String> = conn.hgetall(STORAGE_HASH_KEY).await?;
        Ok(map)
    }
}
