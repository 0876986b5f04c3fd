use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Maximum depth of the exchange table tree: root (0), joined children (1),
/// and the grandchildren joined off those children (2).
pub const MAX_TABLE_DEPTH: u8 = 2;

/// A node in the relational config tree that drives both the tracked-field
/// query and the document-assembly query for one binding.
///
/// The root node describes the table the pipeline watches for changes
/// (`film_work`, `genre`, `person`, ...). Every non-root node describes a
/// table reached by joining through `join`, and is grouped back onto its
/// parent's key via `group` (`array_agg`/`json_agg`) when it can return more
/// than one row per parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeTable {
    /// Schema the table lives in, e.g. `"content"`. Defaults to the
    /// enclosing `SQLDBSettings::default_schema` when absent.
    #[serde(default)]
    pub schema: Option<String>,

    /// Bare table name, e.g. `"film_work"`.
    pub name: String,

    /// Alias used to qualify columns from this table in generated SQL.
    /// Defaults to `name` when absent.
    #[serde(default)]
    pub alias: Option<String>,

    /// Primary key column used both for `JOIN ... ON` and for row identity
    /// when assembling documents. Defaults to `SQLDBSettings::key_field_name`.
    #[serde(default)]
    pub key_field_name: Option<String>,

    /// Columns selected from this table and exposed under `aliases`.
    #[serde(default)]
    pub fields: Vec<String>,

    /// Output field name for each entry in `fields`, keyed by column name.
    /// A column without an entry here is exposed under its own name.
    #[serde(default)]
    pub aliases: HashMap<String, String>,

    /// `{child_column: parent_column}` join predicate against the parent
    /// node. Empty only for the root node.
    #[serde(default)]
    pub join: HashMap<String, String>,

    /// Column on this table that records when a row last changed. Used to
    /// build the tracked-field subquery rooted at this node.
    #[serde(default)]
    pub field_actual_state_name: Option<String>,

    /// Output field name this node's rows are grouped under on the parent
    /// document. Required for any node that can produce more than one row
    /// per parent row.
    #[serde(default)]
    pub group: Option<String>,

    /// Child nodes joined onto this one.
    #[serde(default)]
    pub children: Vec<ExchangeTable>,

    /// Whether this node's `field_actual_state_name` should be compared
    /// against the checkpoint when re-checking the *parent's* tracked field.
    #[serde(default)]
    pub compare_field_actual_with_parent_query: Option<bool>,

    /// Whether this node's `field_actual_state_name` should be compared
    /// against the checkpoint when building each *child's* tracked-field
    /// subquery.
    #[serde(default)]
    pub compare_field_actual_for_child_queries: Option<bool>,
}

impl ExchangeTable {
    /// Alias used to qualify this table's columns in generated SQL.
    pub fn table_alias(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Fully-qualified `schema.name`, falling back to `default_schema` when
    /// this node didn't set one of its own.
    pub fn qualified_name(&self, default_schema: &str) -> String {
        let schema = self.schema.as_deref().unwrap_or(default_schema);
        format!("{schema}.{}", self.name)
    }

    pub fn key_field(&self, default_key_field: &str) -> &str {
        self.key_field_name.as_deref().unwrap_or(default_key_field)
    }

    /// Output name a selected column is exposed under.
    pub fn output_name_for(&self, column: &str) -> &str {
        self.aliases
            .get(column)
            .map(String::as_str)
            .unwrap_or(column)
    }

    /// Walks the tree depth-first, yielding `(depth, node)` pairs.
    pub fn walk(&self) -> Vec<(u8, &ExchangeTable)> {
        let mut out = Vec::new();
        self.walk_into(0, &mut out);
        out
    }

    fn walk_into<'a>(&'a self, depth: u8, out: &mut Vec<(u8, &'a ExchangeTable)>) {
        out.push((depth, self));
        for child in &self.children {
            child.walk_into(depth + 1, out);
        }
    }

    /// Validates the tree: depth must not exceed [`MAX_TABLE_DEPTH`], every
    /// non-root node must declare a join, and every node with children must
    /// declare `group` so its rows can be folded back onto the parent.
    pub fn validate(&self) -> Result<()> {
        self.validate_at(0)
    }

    fn validate_at(&self, depth: u8) -> Result<()> {
        if depth > MAX_TABLE_DEPTH {
            return Err(ConfigError::InvalidBinding {
                elastic_index: self.name.clone(),
                reason: format!(
                    "table '{}' is at depth {depth}, exceeding the maximum of {MAX_TABLE_DEPTH}",
                    self.name
                ),
            });
        }
        if depth > 0 && self.join.is_empty() {
            return Err(ConfigError::InvalidBinding {
                elastic_index: self.name.clone(),
                reason: format!("non-root table '{}' has no join predicate", self.name),
            });
        }
        if !self.children.is_empty() && self.group.is_none() {
            return Err(ConfigError::InvalidBinding {
                elastic_index: self.name.clone(),
                reason: format!(
                    "table '{}' has children but no 'group' field to fold them under",
                    self.name
                ),
            });
        }
        for child in &self.children {
            child.validate_at(depth + 1)?;
        }
        Ok(())
    }
}
