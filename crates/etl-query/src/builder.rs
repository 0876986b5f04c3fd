use std::collections::HashMap;

use etl_config::{EtlExchangeSettings, ExchangeTable, SqlDbSettings};

/// Name of the windowed tracked-rows subquery's output column.
const TRACKED_FIELD_NAME: &str = "_tracked_field";
/// Alias the tracked-rows subquery is joined under.
const TRACKED_TABLE_NAME: &str = "_tracked_table";
/// Placeholder left where the `value > ?` predicate is substituted at
/// render time. On a first run (no prior checkpoint value) it is left as a
/// no-op predicate instead.
const TRACKED_SENTINEL: &str = "IS NOT NULL /*tracked*/";
/// Placeholder for the subquery's paging offset, substituted with a real
/// bind parameter number at render time.
const OFFSET_TOKEN: &str = "$$OFFSET$$";

/// A field/column selected from a table, or `None` for a source field
/// alongside its fully-qualified SQL name and output alias. `source_field`
/// is `None` once the entry has been collapsed into an aggregate (so the
/// original per-row column name is no longer meaningful).
struct FieldEntry {
    source_field: Option<String>,
    full_name: String,
    alias: String,
}

struct TableEntry {
    table_sql: String,
    join_on: Option<Vec<String>>,
}

#[derive(Default)]
struct FieldsAndTables {
    fields: Vec<FieldEntry>,
    tables: Vec<TableEntry>,
}

/// One extraction query template, still carrying the unresolved
/// [`TRACKED_SENTINEL`]/[`OFFSET_TOKEN`] placeholders so it can be rendered
/// differently for a first run versus a resumed run without rebuilding the
/// whole query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedFieldQuery {
    /// Fully-qualified, unquoted name of the tracked column, e.g.
    /// `fw.modified`. Used as the map key so the extractor can look up the
    /// query for a configured tracked field by name.
    pub field_full_name: String,
    pub template: String,
}

/// Renders a [`TrackedFieldQuery`] template against a checkpoint, producing
/// the final SQL text and the ordered list of bind parameters the caller
/// must supply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParam {
    /// The tracked field's checkpoint value, bound as text against
    /// `> $n::timestamptz` (the server casts it to compare with the
    /// `timestamptz` tracked column).
    TrackedValue(String),
    /// The subquery's paging offset.
    Offset(i64),
}

pub fn render(query: &TrackedFieldQuery, checkpoint_value: Option<&str>, offset: i64) -> (String, Vec<QueryParam>) {
    match checkpoint_value {
        Some(value) => {
            // The tracked column is `timestamptz`; $1 arrives as text
            // (the checkpoint is stored and threaded as a string), so it
            // must be cast server-side rather than bound as a `TEXT`
            // parameter against a `timestamptz` column.
            let sql = query
                .template
                .replace(TRACKED_SENTINEL, "> $1::timestamptz")
                .replace(OFFSET_TOKEN, "$2");
            (sql, vec![QueryParam::TrackedValue(value.to_string()), QueryParam::Offset(offset)])
        }
        None => {
            let sql = query.template.replace(OFFSET_TOKEN, "$1");
            (sql, vec![QueryParam::Offset(offset)])
        }
    }
}

/// Builds the extraction query for every tracked field declared in a
/// binding's table tree.
///
/// The builder is a pure function of the configuration tree: it walks the
/// tree twice (once to collect selected fields/joins/aggregations, once to
/// collect per-tracked-field windowed subqueries) and only then renders SQL
/// text, so its behavior is testable without a database connection.
pub struct QueryBuilder<'a> {
    root: &'a ExchangeTable,
    default_schema: &'a str,
    default_key_field: &'a str,
    query_limit: Option<i64>,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(binding: &'a EtlExchangeSettings, sql_db: &'a SqlDbSettings) -> Self {
        QueryBuilder {
            root: &binding.table,
            default_schema: &sql_db.default_schema,
            default_key_field: &sql_db.key_field_name,
            query_limit: sql_db.query_entries_limit,
        }
    }

    fn full_field_name(table_alias: &str, field: &str, quoted: bool) -> String {
        if quoted {
            format!("\"{table_alias}\".\"{field}\"")
        } else {
            format!("{table_alias}.{field}")
        }
    }

    fn field_alias(&self, table: &ExchangeTable, field: &str) -> String {
        table
            .aliases
            .get(field)
            .cloned()
            .unwrap_or_else(|| format!("{}__{}", table.table_alias(), field))
    }

    fn full_table_name(&self, table: &ExchangeTable) -> String {
        let schema = table.schema.as_deref().unwrap_or(self.default_schema);
        let table_name = if schema.is_empty() {
            table.name.clone()
        } else {
            format!("\"{schema}\".\"{}\"", table.name)
        };
        format!("{table_name} AS \"{}\"", table.table_alias())
    }

    fn table_with_joins(&self, table: &ExchangeTable, parent: Option<&ExchangeTable>) -> TableEntry {
        let join_on = match parent {
            Some(parent) if !table.join.is_empty() => Some(
                table
                    .join
                    .iter()
                    .map(|(child_col, parent_col)| {
                        format!(
                            "{} = {}",
                            Self::full_field_name(parent.table_alias(), parent_col, true),
                            Self::full_field_name(table.table_alias(), child_col, true),
                        )
                    })
                    .collect(),
            ),
            _ => None,
        };
        TableEntry {
            table_sql: self.full_table_name(table),
            join_on,
        }
    }

    fn table_key_field<'t>(&self, table: &'t ExchangeTable) -> &'t str {
        table.key_field_name.as_deref().unwrap_or(self.default_key_field)
    }

    fn fields_and_tables(
        &self,
        current: &ExchangeTable,
        parent: Option<&ExchangeTable>,
        depth: u8,
    ) -> FieldsAndTables {
        let mut result = FieldsAndTables::default();
        let table_alias = current.table_alias();

        for field in &current.fields {
            let alias = if parent.is_none() {
                current.output_name_for(field).to_string()
            } else {
                self.field_alias(current, field)
            };
            let full_name = Self::full_field_name(table_alias, field, true);
            result.fields.push(FieldEntry {
                source_field: Some(field.clone()),
                full_name,
                alias,
            });
        }

        result.tables.push(self.table_with_joins(current, parent));

        if depth < etl_config::MAX_TABLE_DEPTH {
            for child in &current.children {
                let child_result = self.fields_and_tables(child, Some(current), depth + 1);
                result.fields.extend(child_result.fields);
                result.tables.extend(child_result.tables);
            }
        }

        if depth == 1 {
            if let Some(group) = &current.group {
                match result.fields.len() {
                    0 => {}
                    1 => {
                        let field = &result.fields[0];
                        let agg = format!("array_agg(DISTINCT {})", field.full_name);
                        result.fields = vec![FieldEntry {
                            source_field: None,
                            full_name: agg,
                            alias: group.clone(),
                        }];
                    }
                    _ => {
                        let entries: Vec<String> = result
                            .fields
                            .iter()
                            .map(|field| {
                                let key = if field.alias.contains("__") {
                                    field.source_field.clone().unwrap_or_else(|| field.alias.clone())
                                } else {
                                    field.alias.clone()
                                };
                                format!("  '{key}', {}", field.full_name)
                            })
                            .collect();
                        let last_full_name = result.fields.last().unwrap().full_name.clone();
                        let agg = format!(
                            "COALESCE(json_agg(DISTINCT jsonb_build_object(\n{}\n)) FILTER (WHERE {last_full_name} is not null), '[]')",
                            entries.join(",\n"),
                        );
                        result.fields = vec![FieldEntry {
                            source_field: None,
                            full_name: agg,
                            alias: group.clone(),
                        }];
                    }
                }
            }
        }

        result
    }

    fn collect_tracked_fields<'t>(
        &self,
        chain: &mut Vec<&'t ExchangeTable>,
        current: &'t ExchangeTable,
        depth: u8,
        compare_from_ancestor: Option<bool>,
        out: &mut HashMap<String, TrackedFieldQuery>,
    ) {
        chain.push(current);

        if let Some(tracked_field) = &current.field_actual_state_name {
            let field_full_name = Self::full_field_name(current.table_alias(), tracked_field, false);
            let root_table = chain[0];
            let key_field = self.table_key_field(root_table);
            let key_field_full_name = Self::full_field_name(root_table.table_alias(), key_field, true);

            let mut lines = vec![format!(
                "JOIN (\n  SELECT {key_field_full_name} AS \"id\", MAX({field_full_name}) AS \"{TRACKED_FIELD_NAME}\""
            )];

            let mut parent: Option<&ExchangeTable> = None;
            for table in chain.iter() {
                let clause = if parent.is_none() { "  FROM" } else { "  JOIN" };
                let table_join = self.table_with_joins(table, parent);
                match table_join.join_on {
                    Some(joins) => lines.push(format!("{clause} {} ON {}", table_join.table_sql, joins.join(" AND "))),
                    None => lines.push(format!("{clause} {}", table_join.table_sql)),
                }
                parent = Some(table);
            }

            let where_start = match (
                compare_from_ancestor,
                current.compare_field_actual_with_parent_query,
                &root_table.field_actual_state_name,
            ) {
                (Some(true), compare_with_parent, Some(root_field)) if compare_with_parent != Some(false) => {
                    let root_field_full = Self::full_field_name(root_table.table_alias(), root_field, true);
                    format!("{root_field_full} < {field_full_name} AND ")
                }
                _ => String::new(),
            };

            lines.push(format!(
                "  WHERE {where_start}{field_full_name} {TRACKED_SENTINEL}\n  GROUP BY {key_field_full_name}\n  ORDER BY {TRACKED_FIELD_NAME}"
            ));
            if let Some(limit) = self.query_limit {
                lines.push(format!("  LIMIT {limit} OFFSET {OFFSET_TOKEN}"));
            }
            lines.push(format!(
                "  ) AS \"{TRACKED_TABLE_NAME}\" ON {key_field_full_name} = \"{TRACKED_TABLE_NAME}\".\"id\""
            ));

            out.insert(
                field_full_name.clone(),
                TrackedFieldQuery {
                    field_full_name,
                    template: lines.join("\n"),
                },
            );
        }

        let next_compare = current.compare_field_actual_for_child_queries.or(compare_from_ancestor);
        if depth < etl_config::MAX_TABLE_DEPTH {
            for child in &current.children {
                self.collect_tracked_fields(chain, child, depth + 1, next_compare, out);
            }
        }

        chain.pop();
    }

    /// The windowed tracked-rows subquery for every tracked field in the
    /// tree, keyed by that field's fully-qualified name.
    fn tracked_subqueries(&self) -> HashMap<String, TrackedFieldQuery> {
        let mut chain = Vec::new();
        let mut out = HashMap::new();
        self.collect_tracked_fields(&mut chain, self.root, 0, None, &mut out);
        out
    }

    /// The outer document-assembly query, joined against `adding_join` and
    /// carrying `adding_fields` in its SELECT list (and GROUP BY, when
    /// aggregation is in play).
    fn select_query_for_load(&self, adding_fields: &[String], adding_join: &[String]) -> String {
        let fields_and_tables = self.fields_and_tables(self.root, None, 0);

        let mut tables: Vec<String> = fields_and_tables
            .tables
            .iter()
            .map(|table| match &table.join_on {
                None => table.table_sql.clone(),
                Some(joins) => format!("LEFT JOIN {} ON ({})", table.table_sql, joins.join(" AND ")),
            })
            .collect();
        tables.extend(adding_join.iter().cloned());

        let mut fields = Vec::new();
        let mut group_by = Vec::new();
        let mut group_by_need = false;
        for field in &fields_and_tables.fields {
            if field.source_field.is_some() {
                group_by.push(field.full_name.clone());
            } else {
                group_by_need = true;
            }
            fields.push(format!("{} AS \"{}\"", field.full_name, field.alias));
        }
        fields.extend(adding_fields.iter().cloned());
        group_by.extend(adding_fields.iter().cloned());

        let fields_str = fields.join(",\n ");
        let tables_str = tables.join("\n");
        let group_by_str = if group_by_need {
            format!("GROUP BY\n {}", group_by.join(",\n "))
        } else {
            String::new()
        };

        let mut sql = format!("SELECT \n {fields_str} \nFROM {tables_str}\n{group_by_str}\n");
        if let Some(limit) = self.query_limit {
            sql.push_str(&format!("LIMIT {limit}"));
        }
        sql
    }

    /// One extraction query template per tracked field declared anywhere in
    /// the tree, ready to be [`render`]ed against a checkpoint.
    pub fn build(&self) -> HashMap<String, TrackedFieldQuery> {
        let mut queries = HashMap::new();
        for (field, tracked) in self.tracked_subqueries() {
            let adding_fields = vec![format!("\"{TRACKED_TABLE_NAME}\".\"{TRACKED_FIELD_NAME}\"")];
            let adding_join = vec![tracked.template.clone()];
            let sql = self.select_query_for_load(&adding_fields, &adding_join);
            queries.insert(
                field.clone(),
                TrackedFieldQuery {
                    field_full_name: field,
                    template: sql,
                },
            );
        }
        queries
    }
}
