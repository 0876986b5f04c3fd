use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;

/// Persists scalar state as one flat key→string hash.
///
/// Datetimes are stored as RFC 3339 strings and integers as their decimal
/// text representation; the trait itself is opaque to those conventions —
/// encoding and decoding happen at the call site (see [`Checkpoint`]).
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Atomically merges `entries` into the persistent hash. Existing keys
    /// not present in `entries` are left untouched.
    async fn save(&self, entries: &HashMap<String, String>) -> Result<()>;

    /// Returns the entire persistent hash.
    async fn retrieve(&self) -> Result<HashMap<String, String>>;

    /// Returns the scalar stored under `key`, or `default` if absent.
    async fn get(&self, key: &str, default: Option<&str>) -> Result<Option<String>> {
        let all = self.retrieve().await?;
        Ok(all
            .get(key)
            .cloned()
            .or_else(|| default.map(str::to_string)))
    }
}

/// The `(value, offset)` pair tracked per `(index, tracked_field)`, encoded
/// as the two scalar keys `<index>_<tracked_field>_value` and
/// `<index>_<tracked_field>_offset` in the underlying [`CheckpointStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    /// The highest tracked timestamp whose rows have all been delivered.
    /// `None` before anything has ever been delivered for this field.
    pub value: Option<String>,
    /// Count of rows already delivered at exactly `value`.
    pub offset: u64,
}

impl Checkpoint {
    pub fn origin() -> Self {
        Checkpoint {
            value: None,
            offset: 0,
        }
    }

    pub fn value_key(index: &str, tracked_field: &str) -> String {
        format!("{index}_{tracked_field}_value")
    }

    pub fn offset_key(index: &str, tracked_field: &str) -> String {
        format!("{index}_{tracked_field}_offset")
    }

    /// Reads the checkpoint for `(index, tracked_field)` out of `store`,
    /// falling back to [`Checkpoint::origin`] for keys never saved.
    pub async fn load(
        store: &dyn CheckpointStore,
        index: &str,
        tracked_field: &str,
    ) -> Result<Checkpoint> {
        let value = store.get(&Self::value_key(index, tracked_field), None).await?;
        let offset = store
            .get(&Self::offset_key(index, tracked_field), Some("0"))
            .await?
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or(0);
        Ok(Checkpoint { value, offset })
    }

    /// Persists this checkpoint for `(index, tracked_field)` into `store`.
    /// `value` and `offset` are written in the same call so a reader never
    /// observes one without the other.
    pub async fn save(
        &self,
        store: &dyn CheckpointStore,
        index: &str,
        tracked_field: &str,
    ) -> Result<()> {
        let mut entries = HashMap::with_capacity(2);
        if let Some(value) = &self.value {
            entries.insert(Self::value_key(index, tracked_field), value.clone());
        }
        entries.insert(
            Self::offset_key(index, tracked_field),
            self.offset.to_string(),
        );
        store.save(&entries).await
    }
}
