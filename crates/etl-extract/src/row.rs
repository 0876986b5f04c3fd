use serde_json::{Map, Value};
use tokio_postgres::types::Type;
use tokio_postgres::Row;

use crate::error::{ExtractError, Result};

/// Converts one driver row into a JSON object keyed by column name,
/// decoding each column by its Postgres type. Columns of a type this
/// pipeline never selects (the query builder only ever emits the types
/// listed below) decode to `null` rather than failing the batch.
pub fn row_to_json(row: &Row) -> Result<Value> {
    let mut object = Map::with_capacity(row.columns().len());
    for (index, column) in row.columns().iter().enumerate() {
        let value = decode_column(row, index, column.type_())
            .map_err(|source| ExtractError::RowDecode { column: column.name().to_string(), source })?;
        object.insert(column.name().to_string(), value);
    }
    Ok(Value::Object(object))
}

/// Extracts the windowed subquery's `_tracked_field` column as a string,
/// the representation checkpoints are compared and stored in.
pub fn tracked_field_value(row: &Row) -> Result<String> {
    let idx = row
        .columns()
        .iter()
        .position(|c| c.name() == "_tracked_field")
        .ok_or(ExtractError::MissingTrackedField)?;
    match decode_column(row, idx, row.columns()[idx].type_())
        .map_err(|source| ExtractError::RowDecode { column: "_tracked_field".to_string(), source })?
    {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Ok(other.to_string()),
    }
}

fn decode_column(row: &Row, index: usize, ty: &Type) -> std::result::Result<Value, serde_json::Error> {
    let value = match *ty {
        Type::UUID => row
            .get::<_, Option<uuid::Uuid>>(index)
            .map(|id| Value::String(id.to_string()))
            .unwrap_or(Value::Null),
        Type::TEXT | Type::VARCHAR => row
            .get::<_, Option<String>>(index)
            .map(Value::String)
            .unwrap_or(Value::Null),
        Type::TEXT_ARRAY | Type::VARCHAR_ARRAY => row
            .get::<_, Option<Vec<String>>>(index)
            .map(|values| Value::Array(values.into_iter().map(Value::String).collect()))
            .unwrap_or(Value::Null),
        Type::FLOAT4 => row
            .get::<_, Option<f32>>(index)
            .map(|v| serde_json::json!(v))
            .unwrap_or(Value::Null),
        Type::FLOAT8 => row
            .get::<_, Option<f64>>(index)
            .map(|v| serde_json::json!(v))
            .unwrap_or(Value::Null),
        Type::INT4 => row
            .get::<_, Option<i32>>(index)
            .map(|v| serde_json::json!(v))
            .unwrap_or(Value::Null),
        Type::INT8 => row
            .get::<_, Option<i64>>(index)
            .map(|v| serde_json::json!(v))
            .unwrap_or(Value::Null),
        Type::JSON | Type::JSONB => row.get::<_, Option<Value>>(index).unwrap_or(Value::Null),
        Type::TIMESTAMPTZ => row
            .get::<_, Option<chrono::DateTime<chrono::Utc>>>(index)
            .map(|ts| Value::String(ts.to_rfc3339()))
            .unwrap_or(Value::Null),
        Type::TIMESTAMP => row
            .get::<_, Option<chrono::NaiveDateTime>>(index)
            .map(|ts| Value::String(ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string()))
            .unwrap_or(Value::Null),
        _ => Value::Null,
    };
    Ok(value)
}
