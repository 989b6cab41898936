use crate::error::ApiError;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use sqlx::MySqlPool;

/// SQL bindable value for dynamically built statements.
#[derive(Debug, PartialEq)]
pub enum SqlValue {
    String(String),
    I64(i64),
    F64(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Null,
}

#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// Bindable argument for dynamically composed WHERE clauses on list and
/// statistics endpoints.
#[derive(Debug)]
pub enum QueryArg {
    U64(u64),
    Str(String),
    Date(NaiveDate),
}

/// Build an UPDATE for a JSON patch, keyed by row id and owning HR account.
/// Columns outside `allowed` and empty patches are rejected.
pub fn build_scoped_update_sql(
    table: &str,
    payload: &Value,
    allowed: &[&str],
    id: u64,
    hr_id: u64,
) -> Result<SqlUpdate, ApiError> {
    let obj = payload
        .as_object()
        .ok_or_else(|| ApiError::Validation("Payload must be a JSON object".into()))?;

    if obj.is_empty() {
        return Err(ApiError::Validation("No fields provided for update".into()));
    }

    for key in obj.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(ApiError::Validation(format!(
                "Field '{}' cannot be updated",
                key
            )));
        }
    }

    let set_clause = obj
        .keys()
        .map(|k| format!("{} = ?", k))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!(
        "UPDATE {} SET {} WHERE id = ? AND hr_id = ?",
        table, set_clause
    );

    let mut values = Vec::with_capacity(obj.len() + 2);
    for value in obj.values() {
        values.push(json_to_sql_value(value)?);
    }
    values.push(SqlValue::I64(id as i64));
    values.push(SqlValue::I64(hr_id as i64));

    Ok(SqlUpdate { sql, values })
}

/// Convert a JSON scalar to a bindable value, probing date/date-time shaped
/// strings first so DATE/DATETIME columns receive typed binds.
pub fn json_to_sql_value(value: &Value) -> Result<SqlValue, ApiError> {
    match value {
        Value::String(s) => {
            if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                Ok(SqlValue::Date(d))
            } else if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                Ok(SqlValue::DateTime(dt))
            } else {
                Ok(SqlValue::String(s.clone()))
            }
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(SqlValue::I64(i))
            } else if let Some(f) = n.as_f64() {
                Ok(SqlValue::F64(f))
            } else {
                Err(ApiError::Validation("Unsupported numeric value".into()))
            }
        }
        Value::Bool(b) => Ok(SqlValue::Bool(*b)),
        Value::Null => Ok(SqlValue::Null),
        _ => Err(ApiError::Validation("Unsupported JSON value type".into())),
    }
}

pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::I64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::DateTime(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_scoped_update_with_typed_binds() {
        let patch = json!({
            "notes": "corrected by HR",
            "check_in": "2026-03-16T09:00:00",
            "date": "2026-03-16",
        });

        let update = build_scoped_update_sql(
            "attendance",
            &patch,
            &["notes", "check_in", "date"],
            7,
            42,
        )
        .unwrap();

        assert_eq!(
            update.sql,
            "UPDATE attendance SET check_in = ?, date = ?, notes = ? WHERE id = ? AND hr_id = ?"
        );
        assert_eq!(update.values.len(), 5);
        assert!(matches!(update.values[0], SqlValue::DateTime(_)));
        assert!(matches!(update.values[1], SqlValue::Date(_)));
        assert_eq!(update.values[2], SqlValue::String("corrected by HR".into()));
        assert_eq!(update.values[3], SqlValue::I64(7));
        assert_eq!(update.values[4], SqlValue::I64(42));
    }

    #[test]
    fn rejects_unknown_columns() {
        let patch = json!({ "hr_id": 1 });
        let err = build_scoped_update_sql("attendance", &patch, &["notes"], 1, 1).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn rejects_empty_and_non_object_payloads() {
        assert!(build_scoped_update_sql("attendance", &json!({}), &["notes"], 1, 1).is_err());
        assert!(build_scoped_update_sql("attendance", &json!([1, 2]), &["notes"], 1, 1).is_err());
    }
}
