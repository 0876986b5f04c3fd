use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::table::ExchangeTable;

fn default_key_field_name() -> String {
    "id".to_string()
}

fn default_schema() -> String {
    "content".to_string()
}

/// Connection and dialect defaults shared by every binding against the
/// source database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlDbSettings {
    #[serde(default = "default_schema")]
    pub default_schema: String,

    #[serde(default = "default_key_field_name")]
    pub key_field_name: String,

    /// Rows fetched per extraction batch. `None` means unbounded.
    #[serde(default)]
    pub query_entries_limit: Option<i64>,
}

impl Default for SqlDbSettings {
    fn default() -> Self {
        SqlDbSettings {
            default_schema: default_schema(),
            key_field_name: default_key_field_name(),
            query_entries_limit: None,
        }
    }
}

/// One binding between a source table tree and a destination document index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtlExchangeSettings {
    /// Name of the destination document index, e.g. `"movies"`.
    pub elastic_index: String,

    /// Registry key naming the [`TransformKind`](../etl_transform/enum.TransformKind.html)
    /// that turns assembled rows into documents for this binding.
    pub transform_class: String,

    /// Path to a JSON file describing the index mapping, applied on
    /// first use via `ensure_index`.
    #[serde(default)]
    pub mapping_file: Option<String>,

    /// The relational config tree rooted at the table this binding tracks
    /// for changes.
    pub table: ExchangeTable,
}

impl EtlExchangeSettings {
    pub fn validate(&self) -> Result<()> {
        if self.elastic_index.trim().is_empty() {
            return Err(ConfigError::InvalidBinding {
                elastic_index: self.elastic_index.clone(),
                reason: "elastic_index must not be empty".to_string(),
            });
        }
        if self.table.field_actual_state_name.is_none() {
            return Err(ConfigError::InvalidBinding {
                elastic_index: self.elastic_index.clone(),
                reason: "root table must declare field_actual_state_name to be trackable"
                    .to_string(),
            });
        }
        self.table.validate()
    }
}

fn default_batch_size() -> usize {
    100
}

/// Pipeline-wide ETL settings: the shared batch size and the full list of
/// bindings to replicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtlSettings {
    #[serde(default = "default_batch_size")]
    pub etl_batch_size: usize,

    #[serde(default)]
    pub sql_db: SqlDbSettings,

    pub bindings_elastic_to_sql: Vec<EtlExchangeSettings>,
}

impl EtlSettings {
    pub fn validate(&self) -> Result<()> {
        if self.etl_batch_size == 0 {
            return Err(ConfigError::InvalidEnv {
                name: "etl_batch_size".to_string(),
                value: "0".to_string(),
            });
        }
        for binding in &self.bindings_elastic_to_sql {
            binding.validate()?;
        }
        Ok(())
    }
}

/// Top-level process settings: the `EtlSettings` loaded from a TOML file,
/// plus connection details layered in from the environment so deployments
/// never need to write secrets into the bindings file.
#[derive(Debug, Clone)]
pub struct Settings {
    pub etl: EtlSettings,
    pub postgres: PostgresConnection,
    pub redis: RedisConnection,
    pub search_engine: SearchEngineConnection,
    /// How long to sleep between two fully-drained passes over all bindings.
    pub pause_between_repeated_requests: std::time::Duration,
}

#[derive(Debug, Clone)]
pub struct PostgresConnection {
    pub host: String,
    pub port: u16,
    pub db_name: String,
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct RedisConnection {
    pub host: String,
    pub port: u16,
    pub db: u8,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SearchEngineConnection {
    pub host: String,
    pub port: u16,
    pub use_tls: bool,
}

impl Settings {
    /// Loads `EtlSettings` from a TOML bindings file and layers connection
    /// details in from the environment.
    pub fn load(config_path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
            path: config_path.display().to_string(),
            source,
        })?;
        let etl: EtlSettings = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: config_path.display().to_string(),
            source,
        })?;
        etl.validate()?;

        let postgres = PostgresConnection {
            host: env_or("POSTGRES_HOST", "localhost")?,
            port: env_parsed_or("POSTGRES_PORT", 5432)?,
            db_name: env_or("POSTGRES_DB", "movies_database")?,
            user: env_or("POSTGRES_USER", "app")?,
            password: env_or("POSTGRES_PASSWORD", "app")?,
        };
        let redis = RedisConnection {
            host: env_or("REDIS_HOST", "localhost")?,
            port: env_parsed_or("REDIS_PORT", 6379)?,
            db: env_parsed_or("REDIS_ETL_DB", 0)?,
            password: env::var("REDIS_PASSWORD").ok(),
        };
        let search_engine = SearchEngineConnection {
            host: env_or("SEARCH_ENGINE_HOST", "localhost")?,
            port: env_parsed_or("SEARCH_ENGINE_PORT", 9200)?,
            use_tls: env_parsed_or("SEARCH_ENGINE_TLS", false)?,
        };
        let pause_secs: u64 = env_parsed_or("ETL_PAUSE_SECONDS", 5)?;

        Ok(Settings {
            etl,
            postgres,
            redis,
            search_engine,
            pause_between_repeated_requests: std::time::Duration::from_secs(pause_secs),
        })
    }
}

fn env_or(name: &str, default: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) => Ok(value),
        Err(env::VarError::NotPresent) => Ok(default.to_string()),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidEnv {
            name: name.to_string(),
            value: "<non-unicode>".to_string(),
        }),
    }
}

fn env_parsed_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(value) => value.parse().map_err(|_| ConfigError::InvalidEnv {
            name: name.to_string(),
            value,
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn sample_toml() -> &'static str {
        r#"
etl_batch_size = 50

[sql_db]
default_schema = "content"
key_field_name = "id"

[[bindings_elastic_to_sql]]
elastic_index = "movies"
transform_class = "movies"

[bindings_elastic_to_sql.table]
name = "film_work"
alias = "fw"
field_actual_state_name = "modified"
fields = ["title", "rating"]
group = "root"
"#
    }

    #[test]
    fn load_parses_bindings_and_layers_env_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(sample_toml().as_bytes()).unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.etl.etl_batch_size, 50);
        assert_eq!(settings.etl.bindings_elastic_to_sql.len(), 1);
        assert_eq!(settings.postgres.host, "localhost");
        assert_eq!(settings.postgres.port, 5432);
    }

    #[test]
    fn validate_rejects_zero_batch_size() {
        let etl = EtlSettings {
            etl_batch_size: 0,
            sql_db: SqlDbSettings::default(),
            bindings_elastic_to_sql: vec![],
        };
        assert!(etl.validate().is_err());
    }

    #[test]
    fn binding_validate_requires_tracked_field() {
        let table = ExchangeTable {
            schema: None,
            name: "film_work".to_string(),
            alias: None,
            key_field_name: None,
            fields: vec![],
            aliases: HashMap::new(),
            join: HashMap::new(),
            field_actual_state_name: None,
            group: None,
            children: vec![],
            compare_field_actual_with_parent_query: None,
            compare_field_actual_for_child_queries: None,
        };
        let binding = EtlExchangeSettings {
            elastic_index: "movies".to_string(),
            transform_class: "movies".to_string(),
            mapping_file: None,
            table,
        };
        assert!(binding.validate().is_err());
    }
}
