use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "$eq")] Eq,
    #[serde(rename = "$ne")] Ne,
    #[serde(rename = "$gt")] Gt,
    #[serde(rename = "$gte")] Gte,
    #[serde(rename = "$lt")] Lt,
    #[serde(rename = "$lte")] Lte,

    #[serde(rename = "$like")] Like,
    #[serde(rename = "$ilike")] ILike,

    #[serde(rename = "$in")] In,
    #[serde(rename = "$nin")] NIn,

    #[serde(rename = "$between")] Between,
    #[serde(rename = "$null")] Null,
}

impl FilterOp {
    pub fn parse(op_key: &str) -> Option<Self> {
        Some(match op_key {
            "$eq" => FilterOp::Eq,
            "$ne" | "$neq" => FilterOp::Ne,
            "$gt" => FilterOp::Gt,
            "$gte" => FilterOp::Gte,
            "$lt" => FilterOp::Lt,
            "$lte" => FilterOp::Lte,
            "$like" => FilterOp::Like,
            "$ilike" => FilterOp::ILike,
            "$in" => FilterOp::In,
            "$nin" => FilterOp::NIn,
            "$between" => FilterOp::Between,
            "$null" => FilterOp::Null,
            _ => return None,
        })
    }
}

/// Caller-facing filter arguments shared by every read path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Vec<String>>,
    #[serde(rename = "where", alias = "where_clause", default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<i32>,
}

impl FilterData {
    pub fn where_value(where_clause: Value) -> Self {
        Self { where_clause: Some(where_clause), ..Default::default() }
    }

    pub fn by_id(id: Uuid) -> Self {
        Self::where_value(json!({ "id": id }))
    }

    pub fn where_eq(field: &str, value: impl Into<Value>) -> Self {
        let mut clause = serde_json::Map::new();
        clause.insert(field.to_string(), value.into());
        Self::where_value(Value::Object(clause))
    }

    pub fn order_by(mut self, order: impl Into<String>) -> Self {
        self.order = Some(Value::String(order.into()));
        self
    }

    /// AND an extra constraint onto this filter. The existing condition is kept
    /// intact as the first operand; an absent condition is simply replaced.
    pub fn and_where(mut self, extra: Value) -> Self {
        self.where_clause = Some(match self.where_clause.take() {
            None | Some(Value::Null) => extra,
            Some(existing) => json!({ "$and": [existing, extra] }),
        });
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOrderInfo {
    pub column: String,
    pub sort: SortDirection,
}

/// Typed bind parameter. Strings that look like UUIDs or RFC 3339 timestamps
/// bind as those types so they compare natively against uuid/timestamptz columns.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    Json(Value),
}

impl SqlParam {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => SqlParam::Null,
            Value::Bool(b) => SqlParam::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    SqlParam::Int(i)
                } else if let Some(f) = n.as_f64() {
                    SqlParam::Float(f)
                } else {
                    SqlParam::Text(n.to_string())
                }
            }
            Value::String(s) => {
                if let Ok(id) = Uuid::parse_str(s) {
                    SqlParam::Uuid(id)
                } else if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
                    SqlParam::Timestamp(ts.with_timezone(&Utc))
                } else {
                    SqlParam::Text(s.clone())
                }
            }
            Value::Array(_) | Value::Object(_) => SqlParam::Json(value.clone()),
        }
    }

    /// Plain text parameters compare against the column's text form
    pub fn needs_text_cast(&self) -> bool {
        matches!(self, SqlParam::Text(_))
    }
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlParam>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_where_keeps_existing_condition() {
        let filter = FilterData::where_value(json!({ "name": "Algebra" }))
            .and_where(json!({ "deleted_at": null }));
        assert_eq!(
            filter.where_clause,
            Some(json!({ "$and": [{ "name": "Algebra" }, { "deleted_at": null }] }))
        );
    }

    #[test]
    fn and_where_on_empty_filter() {
        let filter = FilterData::default().and_where(json!({ "deleted_at": null }));
        assert_eq!(filter.where_clause, Some(json!({ "deleted_at": null })));
    }

    #[test]
    fn deserializes_where_and_legacy_key() {
        let a: FilterData = serde_json::from_value(json!({ "where": { "id": 1 }, "limit": 5 })).unwrap();
        let b: FilterData = serde_json::from_value(json!({ "where_clause": { "id": 1 } })).unwrap();
        assert_eq!(a.where_clause, b.where_clause);
        assert_eq!(a.limit, Some(5));
    }

    #[test]
    fn classifies_string_params() {
        let id = Uuid::new_v4();
        assert_eq!(SqlParam::from_json(&json!(id.to_string())), SqlParam::Uuid(id));
        assert!(matches!(
            SqlParam::from_json(&json!("2024-01-01T09:00:00Z")),
            SqlParam::Timestamp(_)
        ));
        assert_eq!(SqlParam::from_json(&json!("MONDAY")), SqlParam::Text("MONDAY".to_string()));
        assert_eq!(SqlParam::from_json(&json!(3)), SqlParam::Int(3));
    }
}
