use serde_json::Value;
use sqlx::{postgres::PgArguments, Arguments};

use crate::filter::{Filter, FilterData, SqlParam, SqlResult};

/// Assembles the Postgres statements `PgRepository` runs, from filter data and rows
pub struct QueryBuilder {
    filter: Filter,
}

impl QueryBuilder {
    pub fn new(table_name: &str, filter_data: FilterData) -> Result<Self, crate::filter::FilterError> {
        Ok(Self { filter: Filter::from_data(table_name, filter_data)? })
    }

    /// One JSON object per matching row, in filter order
    pub fn select_json(&self) -> Result<SqlResult, crate::filter::FilterError> {
        let inner = self.filter.to_sql()?;
        Ok(SqlResult {
            query: format!("SELECT row_to_json(t) AS row FROM ({}) t", inner.query),
            params: inner.params,
        })
    }

    pub fn count(&self) -> Result<SqlResult, crate::filter::FilterError> {
        self.filter.to_count_sql()
    }

    pub fn delete(&self) -> Result<SqlResult, crate::filter::FilterError> {
        self.filter.to_delete_sql()
    }

    /// Rows travel as one JSONB array and are typed by the table's own row type
    pub fn insert_json(table_name: &str, rows: Vec<serde_json::Map<String, Value>>) -> SqlResult {
        let rows = Value::Array(rows.into_iter().map(Value::Object).collect());
        SqlResult {
            query: format!(
                "INSERT INTO \"{table}\" SELECT * FROM jsonb_populate_recordset(NULL::\"{table}\", $1)",
                table = table_name
            ),
            params: vec![SqlParam::Json(rows)],
        }
    }

    /// `UPDATE .. SET col = (jsonb_populate_record(..)).col` for each changed column
    pub fn update_json(
        table_name: &str,
        id: uuid::Uuid,
        changes: serde_json::Map<String, Value>,
    ) -> Result<SqlResult, crate::filter::FilterError> {
        let mut assignments = Vec::with_capacity(changes.len());
        for column in changes.keys() {
            if !crate::filter::is_valid_identifier(column) || column == "id" {
                return Err(crate::filter::FilterError::InvalidColumn(column.clone()));
            }
            assignments.push(format!("\"{col}\" = (jsonb_populate_record(NULL::\"{table}\", $1)).\"{col}\"", col = column, table = table_name));
        }
        if assignments.is_empty() {
            return Err(crate::filter::FilterError::InvalidOperatorData("update without changes".to_string()));
        }
        Ok(SqlResult {
            query: format!(
                "UPDATE \"{table}\" SET {sets} WHERE \"id\" = $2 RETURNING row_to_json(\"{table}\".*) AS row",
                table = table_name,
                sets = assignments.join(", ")
            ),
            params: vec![SqlParam::Json(Value::Object(changes)), SqlParam::Uuid(id)],
        })
    }
}

pub fn pg_arguments(params: &[SqlParam]) -> PgArguments {
    let mut args = PgArguments::default();
    for p in params {
        match p {
            SqlParam::Null => args.add(Option::<String>::None),
            SqlParam::Bool(b) => args.add(*b),
            SqlParam::Int(i) => args.add(*i),
            SqlParam::Float(f) => args.add(*f),
            SqlParam::Text(s) => args.add(s.clone()),
            SqlParam::Uuid(id) => args.add(*id),
            SqlParam::Timestamp(ts) => args.add(*ts),
            SqlParam::Json(v) => args.add(v.clone()),
        }
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wraps_select_in_row_to_json() {
        let builder = QueryBuilder::new("classrooms", FilterData::where_eq("name", "7B")).unwrap();
        let sql = builder.select_json().unwrap();
        assert_eq!(
            sql.query,
            "SELECT row_to_json(t) AS row FROM (SELECT * FROM \"classrooms\" WHERE \"name\"::text = $1) t"
        );
    }

    #[test]
    fn builds_update_per_column() {
        let id = uuid::Uuid::new_v4();
        let changes = json!({ "description": "Revision" }).as_object().cloned().unwrap();
        let sql = QueryBuilder::update_json("classroom_integration_sessions", id, changes).unwrap();
        assert!(sql.query.starts_with("UPDATE \"classroom_integration_sessions\" SET \"description\" = (jsonb_populate_record("));
        assert!(sql.query.ends_with("WHERE \"id\" = $2 RETURNING row_to_json(\"classroom_integration_sessions\".*) AS row"));
        assert_eq!(sql.params[1], SqlParam::Uuid(id));
    }

    #[test]
    fn refuses_id_or_bad_columns_in_update() {
        let id = uuid::Uuid::new_v4();
        let changes = json!({ "id": id }).as_object().cloned().unwrap();
        assert!(QueryBuilder::update_json("classrooms", id, changes).is_err());
        let changes = json!({ "bad col": 1 }).as_object().cloned().unwrap();
        assert!(QueryBuilder::update_json("classrooms", id, changes).is_err());
        assert!(QueryBuilder::update_json("classrooms", id, serde_json::Map::new()).is_err());
    }
}
