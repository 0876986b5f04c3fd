use crate::document::{ExtractedRow, FilmDocument, PersonRole, PersonSummary};
use crate::error::Result;
use crate::transform::Transform;

/// Denormalizes film rows into documents. `director`, `actors_names` and
/// `writers_names` each collect the name of every person whose role in
/// `persons` matches; `producer` roles never populate a name array but
/// still pass through in `persons` unless already excluded at the SQL
/// level. Actors additionally get a structured `{id, name}` entry in
/// `actors`.
#[derive(Debug, Default)]
pub struct MoviesTransform;

impl Transform for MoviesTransform {
    fn transform(&self, rows: &[ExtractedRow]) -> Result<Vec<FilmDocument>> {
        Ok(rows.iter().map(Self::transform_one).collect())
    }
}

impl MoviesTransform {
    fn transform_one(row: &ExtractedRow) -> FilmDocument {
        let mut document = FilmDocument {
            id: row.id,
            title: row.title.clone(),
            description: row.description.clone(),
            imdb_rating: row.imdb_rating,
            genre: row.genre.clone(),
            director: Vec::new(),
            actors_names: Vec::new(),
            writers_names: Vec::new(),
            actors: Vec::new(),
        };

        for person in &row.persons {
            match person.role {
                PersonRole::Director => document.director.push(person.name.clone()),
                PersonRole::Writer => document.writers_names.push(person.name.clone()),
                PersonRole::Actor => {
                    document.actors_names.push(person.name.clone());
                    document.actors.push(PersonSummary {
                        id: person.id,
                        name: person.name.clone(),
                    });
                }
                PersonRole::Producer | PersonRole::Unknown => {}
            }
        }

        document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn row_with_persons(persons: serde_json::Value) -> ExtractedRow {
        serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "title": "The Star",
            "description": "a film",
            "imdb_rating": 8.5,
            "genre": ["Drama", "Sci-Fi"],
            "persons": persons,
        }))
        .unwrap()
    }

    #[test]
    fn director_and_writer_names_collected() {
        let row = row_with_persons(json!([
            {"id": Uuid::new_v4(), "role": "director", "name": "Ann Director"},
            {"id": Uuid::new_v4(), "role": "writer", "name": "Bob Writer"},
        ]));
        let docs = MoviesTransform.transform(&[row]).unwrap();

        assert_eq!(docs[0].director, vec!["Ann Director".to_string()]);
        assert_eq!(docs[0].writers_names, vec!["Bob Writer".to_string()]);
        assert!(docs[0].actors.is_empty());
    }

    #[test]
    fn actor_populates_both_names_array_and_structured_list() {
        let actor_id = Uuid::new_v4();
        let row = row_with_persons(json!([
            {"id": actor_id, "role": "actor", "name": "Cara Actor"},
        ]));
        let docs = MoviesTransform.transform(&[row]).unwrap();

        assert_eq!(docs[0].actors_names, vec!["Cara Actor".to_string()]);
        assert_eq!(docs[0].actors, vec![PersonSummary { id: actor_id, name: "Cara Actor".to_string() }]);
    }

    #[test]
    fn producer_role_excluded_from_every_name_array() {
        let row = row_with_persons(json!([
            {"id": Uuid::new_v4(), "role": "producer", "name": "Dana Producer"},
        ]));
        let docs = MoviesTransform.transform(&[row]).unwrap();

        assert!(docs[0].director.is_empty());
        assert!(docs[0].actors_names.is_empty());
        assert!(docs[0].writers_names.is_empty());
        assert!(docs[0].actors.is_empty());
    }

    #[test]
    fn output_cardinality_matches_input_batch() {
        let rows = vec![row_with_persons(json!([])), row_with_persons(json!([]))];
        let docs = MoviesTransform.transform(&rows).unwrap();
        assert_eq!(docs.len(), 2);
    }
}
