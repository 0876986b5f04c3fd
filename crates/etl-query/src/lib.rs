//! Parameterized extraction query builder for the movies ETL pipeline.
//!
//! [`QueryBuilder`] walks a binding's [`ExchangeTable`](etl_config::ExchangeTable)
//! tree twice — once to collect selected fields, joins and aggregations,
//! once to collect the windowed tracked-rows subquery for every tracked
//! field — before ever touching a SQL string, so its tests never need a
//! database connection. [`render`] resolves the resulting template's
//! placeholders against a checkpoint.

mod builder;

pub use builder::{render, QueryBuilder, QueryParam, TrackedFieldQuery};

#[cfg(test)]
mod tests {
    use super::*;
    use etl_config::{EtlExchangeSettings, ExchangeTable, SqlDbSettings};
    use std::collections::HashMap;

    fn movies_binding() -> EtlExchangeSettings {
        let person = ExchangeTable {
            schema: None,
            name: "person".to_string(),
            alias: Some("pn".to_string()),
            key_field_name: None,
            fields: vec![
                "role".to_string(),
                "id".to_string(),
                "full_name".to_string(),
                "modified".to_string(),
            ],
            aliases: HashMap::from([
                ("role".to_string(), "role".to_string()),
                ("id".to_string(), "id".to_string()),
                ("full_name".to_string(), "name".to_string()),
                ("modified".to_string(), "modified".to_string()),
            ]),
            join: HashMap::from([("person_id".to_string(), "id".to_string())]),
            field_actual_state_name: Some("modified".to_string()),
            group: None,
            children: vec![],
            compare_field_actual_with_parent_query: None,
            compare_field_actual_for_child_queries: None,
        };
        let person_film_work = ExchangeTable {
            schema: None,
            name: "person_film_work".to_string(),
            alias: Some("pfw".to_string()),
            key_field_name: None,
            fields: vec![],
            aliases: HashMap::new(),
            join: HashMap::from([("film_work_id".to_string(), "id".to_string())]),
            field_actual_state_name: None,
            group: Some("persons".to_string()),
            children: vec![person],
            compare_field_actual_with_parent_query: None,
            compare_field_actual_for_child_queries: None,
        };
        let genre = ExchangeTable {
            schema: None,
            name: "genre".to_string(),
            alias: Some("gr".to_string()),
            key_field_name: None,
            fields: vec!["name".to_string()],
            aliases: HashMap::new(),
            join: HashMap::from([("genre_id".to_string(), "id".to_string())]),
            field_actual_state_name: None,
            group: None,
            children: vec![],
            compare_field_actual_with_parent_query: None,
            compare_field_actual_for_child_queries: None,
        };
        let genre_film_work = ExchangeTable {
            schema: None,
            name: "genre_film_work".to_string(),
            alias: Some("gfw".to_string()),
            key_field_name: None,
            fields: vec![],
            aliases: HashMap::new(),
            join: HashMap::from([("film_work_id".to_string(), "id".to_string())]),
            field_actual_state_name: None,
            group: Some("genre".to_string()),
            children: vec![genre],
            compare_field_actual_with_parent_query: None,
            compare_field_actual_for_child_queries: None,
        };
        let film_work = ExchangeTable {
            schema: Some("content".to_string()),
            name: "film_work".to_string(),
            alias: Some("fw".to_string()),
            key_field_name: None,
            fields: vec!["title".to_string(), "description".to_string(), "rating".to_string()],
            aliases: HashMap::from([("rating".to_string(), "imdb_rating".to_string())]),
            join: HashMap::new(),
            field_actual_state_name: Some("modified".to_string()),
            group: None,
            children: vec![genre_film_work, person_film_work],
            compare_field_actual_with_parent_query: None,
            compare_field_actual_for_child_queries: None,
        };

        EtlExchangeSettings {
            elastic_index: "movies".to_string(),
            transform_class: "movies".to_string(),
            mapping_file: None,
            table: film_work,
        }
    }

    fn sql_db() -> SqlDbSettings {
        SqlDbSettings {
            default_schema: "content".to_string(),
            key_field_name: "id".to_string(),
            query_entries_limit: Some(100),
        }
    }

    #[test]
    fn builds_one_query_per_tracked_field() {
        let binding = movies_binding();
        let db = sql_db();
        let builder = QueryBuilder::new(&binding, &db);
        let queries = builder.build();

        assert_eq!(queries.len(), 2);
        assert!(queries.contains_key("fw.modified"));
        assert!(queries.contains_key("pn.modified"));
    }

    #[test]
    fn root_tracked_query_selects_aggregated_children_and_joins_subquery() {
        let binding = movies_binding();
        let db = sql_db();
        let builder = QueryBuilder::new(&binding, &db);
        let queries = builder.build();
        let query = &queries["fw.modified"];

        assert!(query.template.contains("array_agg(DISTINCT \"gr\".\"name\")"));
        assert!(query.template.contains("COALESCE(json_agg(DISTINCT jsonb_build_object"));
        assert!(query.template.contains("\"_tracked_table\".\"_tracked_field\""));
        assert!(query.template.contains("LEFT JOIN \"content\".\"person_film_work\" AS \"pfw\""));
        assert!(query.template.contains("IS NOT NULL /*tracked*/"));
        assert!(query.template.contains("LIMIT 100"));
    }

    #[test]
    fn nested_tracked_field_joins_full_ancestor_chain() {
        let binding = movies_binding();
        let db = sql_db();
        let builder = QueryBuilder::new(&binding, &db);
        let queries = builder.build();
        let subquery = &queries["pn.modified"];

        assert!(subquery.template.contains("FROM \"content\".\"film_work\" AS \"fw\""));
        assert!(subquery.template.contains("JOIN \"content\".\"person_film_work\" AS \"pfw\""));
        assert!(subquery.template.contains("JOIN \"content\".\"person\" AS \"pn\""));
    }

    #[test]
    fn render_without_checkpoint_uses_sentinel_and_single_param() {
        let binding = movies_binding();
        let db = sql_db();
        let builder = QueryBuilder::new(&binding, &db);
        let queries = builder.build();
        let query = &queries["fw.modified"];

        let (sql, params) = render(query, None, 0);
        assert!(sql.contains("IS NOT NULL /*tracked*/"));
        assert!(sql.contains("OFFSET $1"));
        assert_eq!(params, vec![QueryParam::Offset(0)]);
    }

    #[test]
    fn render_with_checkpoint_substitutes_comparison_and_two_params() {
        let binding = movies_binding();
        let db = sql_db();
        let builder = QueryBuilder::new(&binding, &db);
        let queries = builder.build();
        let query = &queries["fw.modified"];

        let (sql, params) = render(query, Some("2021-06-16T20:14:09+00:00"), 3);
        assert!(!sql.contains("IS NOT NULL /*tracked*/"));
        assert!(sql.contains("> $1"));
        assert!(sql.contains("OFFSET $2"));
        assert_eq!(
            params,
            vec![
                QueryParam::TrackedValue("2021-06-16T20:14:09+00:00".to_string()),
                QueryParam::Offset(3),
            ]
        );
    }
}
