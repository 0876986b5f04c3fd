//! Declarative bindings configuration for the movies ETL pipeline.
//!
//! Bindings are loaded from a TOML file as [`EtlSettings`], each one
//! describing a relational table tree ([`ExchangeTable`]) to track for
//! changes and fold into a destination document. Connection details for
//! Postgres, Redis and the search engine are layered in separately from the
//! environment via [`Settings::load`].

mod error;
mod settings;
mod table;

pub use error::{ConfigError, Result};
pub use settings::{
    EtlExchangeSettings, EtlSettings, PostgresConnection, RedisConnection,
    SearchEngineConnection, Settings, SqlDbSettings,
};
pub use table::{ExchangeTable, MAX_TABLE_DEPTH};
