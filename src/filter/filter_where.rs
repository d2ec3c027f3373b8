use serde_json::{Map, Value};

use super::error::FilterError;
use super::types::{FilterOp, SqlParam};

/// Compiles a JSON `where` document into a parameterised Postgres predicate.
/// Nested `$and`/`$or`/`$not` clauses share a single parameter counter.
pub struct FilterWhere {
    params: Vec<SqlParam>,
    param_offset: usize,
    max_depth: u32,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize, max_depth: u32) -> Self {
        Self { params: vec![], param_offset: starting_param_index, max_depth }
    }

    /// Returns the predicate (`1=1` when empty) and its parameters, numbered from
    /// `starting_param_index + 1`.
    pub fn generate(
        where_data: &Value,
        starting_param_index: usize,
        max_depth: u32,
    ) -> Result<(String, Vec<SqlParam>), FilterError> {
        let mut filter_where = Self::new(starting_param_index, max_depth);
        let sql = filter_where.clause(where_data, 0)?;
        Ok((sql, filter_where.params))
    }

    /// Compiles the whole tree and discards the SQL, so operators and shapes
    /// are rejected up front whether or not a backend ever renders SQL.
    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        if !matches!(where_data, Value::Null | Value::Object(_)) {
            return Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string()));
        }
        Self::generate(where_data, 0, crate::config::CONFIG.filter.max_nested_depth).map(|_| ())
    }

    fn clause(&mut self, where_data: &Value, depth: u32) -> Result<String, FilterError> {
        if depth > self.max_depth {
            return Err(FilterError::TooDeep(self.max_depth));
        }
        let obj = match where_data {
            Value::Null => return Ok("1=1".to_string()),
            Value::Object(obj) => obj,
            _ => return Err(FilterError::InvalidWhereClause("Unsupported WHERE format".to_string())),
        };

        let mut parts = Vec::with_capacity(obj.len());
        for (key, value) in obj {
            if key.starts_with('$') {
                parts.push(self.logical(key, value, depth)?);
            } else {
                parts.extend(self.field(key, value)?);
            }
        }

        Ok(match parts.len() {
            0 => "1=1".to_string(),
            1 => parts.remove(0),
            _ => parts.join(" AND "),
        })
    }

    fn logical(&mut self, op: &str, value: &Value, depth: u32) -> Result<String, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                if arr.is_empty() {
                    return Ok(if op == "$and" { "1=1" } else { "1=0" }.to_string());
                }
                let mut sql_parts = Vec::with_capacity(arr.len());
                for v in arr {
                    sql_parts.push(format!("({})", self.clause(v, depth + 1)?));
                }
                let joiner = if op == "$and" { " AND " } else { " OR " };
                Ok(format!("({})", sql_parts.join(joiner)))
            }
            "$not" => Ok(format!("NOT ({})", self.clause(value, depth + 1)?)),
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn field(&mut self, field: &str, value: &Value) -> Result<Vec<String>, FilterError> {
        if !super::is_valid_identifier(field) {
            return Err(FilterError::InvalidColumn(format!("Invalid column name format: {}", field)));
        }

        match operator_map(value) {
            Some(ops) => {
                let mut out = Vec::with_capacity(ops.len());
                for (op_key, op_val) in ops {
                    let operator = FilterOp::parse(op_key)
                        .ok_or_else(|| FilterError::UnsupportedOperator(op_key.to_string()))?;
                    out.push(self.condition(field, operator, op_val)?);
                }
                Ok(out)
            }
            // Implicit equality: { field: value }
            None => Ok(vec![self.condition(field, FilterOp::Eq, value)?]),
        }
    }

    fn condition(&mut self, field: &str, operator: FilterOp, data: &Value) -> Result<String, FilterError> {
        let column = format!("\"{}\"", field);
        match operator {
            FilterOp::Eq if data.is_null() => Ok(format!("{} IS NULL", column)),
            FilterOp::Ne if data.is_null() => Ok(format!("{} IS NOT NULL", column)),
            FilterOp::Eq => self.compare(&column, "=", data),
            FilterOp::Ne => self.compare(&column, "<>", data),
            FilterOp::Gt => self.compare(&column, ">", data),
            FilterOp::Gte => self.compare(&column, ">=", data),
            FilterOp::Lt => self.compare(&column, "<", data),
            FilterOp::Lte => self.compare(&column, "<=", data),
            FilterOp::Like => Ok(format!("{}::text LIKE {}", column, self.param(data))),
            FilterOp::ILike => Ok(format!("{}::text ILIKE {}", column, self.param(data))),
            FilterOp::In | FilterOp::NIn => {
                let values = match data {
                    Value::Array(values) => values.as_slice(),
                    single => std::slice::from_ref(single),
                };
                if values.is_empty() {
                    return Ok(if operator == FilterOp::In { "1=0" } else { "1=1" }.to_string());
                }
                let cast = values.iter().any(|v| SqlParam::from_json(v).needs_text_cast());
                let lhs = if cast { format!("{}::text", column) } else { column };
                let placeholders: Vec<String> = values.iter().map(|v| self.param(v)).collect();
                let keyword = if operator == FilterOp::In { "IN" } else { "NOT IN" };
                Ok(format!("{} {} ({})", lhs, keyword, placeholders.join(", ")))
            }
            FilterOp::Between => match data {
                Value::Array(values) if values.len() == 2 => {
                    let cast = values.iter().any(|v| SqlParam::from_json(v).needs_text_cast());
                    let lhs = if cast { format!("{}::text", column) } else { column };
                    let low = self.param(&values[0]);
                    let high = self.param(&values[1]);
                    Ok(format!("{} BETWEEN {} AND {}", lhs, low, high))
                }
                _ => Err(FilterError::InvalidOperatorData("$between requires array with 2 values".to_string())),
            },
            FilterOp::Null => match data {
                Value::Bool(true) => Ok(format!("{} IS NULL", column)),
                Value::Bool(false) => Ok(format!("{} IS NOT NULL", column)),
                _ => Err(FilterError::InvalidOperatorData("$null requires a boolean".to_string())),
            },
        }
    }

    fn compare(&mut self, column: &str, sql_op: &str, data: &Value) -> Result<String, FilterError> {
        if matches!(data, Value::Array(_) | Value::Object(_)) {
            return Err(FilterError::InvalidOperatorData(format!(
                "{} {} expects a scalar value",
                column, sql_op
            )));
        }
        let lhs = if SqlParam::from_json(data).needs_text_cast() {
            format!("{}::text", column)
        } else {
            column.to_string()
        };
        Ok(format!("{} {} {}", lhs, sql_op, self.param(data)))
    }

    fn param(&mut self, value: &Value) -> String {
        self.params.push(SqlParam::from_json(value));
        format!("${}", self.param_offset + self.params.len())
    }
}

/// `Some` when every key of the object is an operator (`{"$gt": 1, "$lt": 5}`)
pub(crate) fn operator_map(value: &Value) -> Option<&Map<String, Value>> {
    match value {
        Value::Object(obj) if !obj.is_empty() && obj.keys().all(|k| k.starts_with('$')) => Some(obj),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sql(where_data: Value) -> (String, Vec<SqlParam>) {
        FilterWhere::generate(&where_data, 0, 10).unwrap()
    }

    #[test]
    fn empty_where_is_tautology() {
        assert_eq!(sql(json!({})).0, "1=1");
        assert_eq!(sql(Value::Null).0, "1=1");
    }

    #[test]
    fn implicit_equality_and_null() {
        let (query, params) = sql(json!({ "name": "Algebra" }));
        assert_eq!(query, "\"name\"::text = $1");
        assert_eq!(params, vec![SqlParam::Text("Algebra".to_string())]);

        let (query, params) = sql(json!({ "deleted_at": null }));
        assert_eq!(query, "\"deleted_at\" IS NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn uuid_values_compare_without_cast() {
        let id = uuid::Uuid::new_v4();
        let (query, params) = sql(json!({ "classroom_integration_id": id.to_string() }));
        assert_eq!(query, "\"classroom_integration_id\" = $1");
        assert_eq!(params, vec![SqlParam::Uuid(id)]);
    }

    #[test]
    fn nested_clauses_share_parameter_numbering() {
        let (query, params) = sql(json!({
            "$and": [
                { "$or": [{ "day_of_week": "MONDAY" }, { "day_of_week": "FRIDAY" }] },
                { "deleted_at": null },
                { "period": { "$gte": 2, "$lt": 5 } }
            ]
        }));
        assert_eq!(
            query,
            "((((\"day_of_week\"::text = $1) OR (\"day_of_week\"::text = $2))) AND (\"deleted_at\" IS NULL) AND (\"period\" >= $3 AND \"period\" < $4))"
        );
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn starting_index_offsets_placeholders() {
        let (query, _) = FilterWhere::generate(&json!({ "period": 1 }), 3, 10).unwrap();
        assert_eq!(query, "\"period\" = $4");
    }

    #[test]
    fn in_and_between() {
        let (query, params) = sql(json!({ "period": { "$in": [1, 2, 3] } }));
        assert_eq!(query, "\"period\" IN ($1, $2, $3)");
        assert_eq!(params.len(), 3);
        assert_eq!(sql(json!({ "period": { "$in": [] } })).0, "1=0");
        assert_eq!(sql(json!({ "period": { "$nin": [] } })).0, "1=1");

        let (query, _) = sql(json!({ "start_date": { "$between": ["2024-01-01T00:00:00Z", "2024-02-01T00:00:00Z"] } }));
        assert_eq!(query, "\"start_date\" BETWEEN $1 AND $2");
    }

    #[test]
    fn not_and_null_operator() {
        let (query, _) = sql(json!({ "$not": { "deleted_at": { "$null": true } } }));
        assert_eq!(query, "NOT (\"deleted_at\" IS NULL)");
    }

    #[test]
    fn rejects_bad_input() {
        assert!(FilterWhere::generate(&json!({ "bad name": 1 }), 0, 10).is_err());
        assert!(FilterWhere::generate(&json!({ "a": { "$regex": "x" } }), 0, 10).is_err());
        assert!(FilterWhere::generate(&json!({ "$xor": [] }), 0, 10).is_err());
        assert!(FilterWhere::generate(&json!({ "a": { "$between": [1] } }), 0, 10).is_err());
        assert!(FilterWhere::validate(&json!("raw sql")).is_err());
        assert!(FilterWhere::validate(&json!({ "$or": [{ "name": { "$regex": "^A" } }] })).is_err());
        assert!(FilterWhere::validate(&json!({ "$and": [{ "name": "7B" }, { "deleted_at": null }] })).is_ok());
    }

    #[test]
    fn enforces_max_depth() {
        let deep = json!({ "$not": { "$not": { "$not": { "a": 1 } } } });
        assert!(matches!(FilterWhere::generate(&deep, 0, 2), Err(FilterError::TooDeep(2))));
        assert!(FilterWhere::generate(&deep, 0, 3).is_ok());
    }
}
