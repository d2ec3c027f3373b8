//! In-memory evaluation of the `where` language, mirroring `FilterWhere`'s SQL.

use std::cmp::Ordering;

use chrono::DateTime;
use serde_json::{Map, Value};

use super::error::FilterError;
use super::filter_where::operator_map;
use super::types::FilterOp;

pub struct FilterMatch;

impl FilterMatch {
    pub fn matches(where_data: &Value, record: &Map<String, Value>) -> Result<bool, FilterError> {
        match where_data {
            Value::Null => Ok(true),
            Value::Object(obj) => {
                for (key, value) in obj {
                    let ok = if key.starts_with('$') {
                        Self::logical(key, value, record)?
                    } else {
                        Self::field(key, value, record)?
                    };
                    if !ok {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn logical(op: &str, value: &Value, record: &Map<String, Value>) -> Result<bool, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                let mut results = Vec::with_capacity(arr.len());
                for v in arr {
                    results.push(Self::matches(v, record)?);
                }
                Ok(if op == "$and" {
                    results.into_iter().all(|r| r)
                } else {
                    results.into_iter().any(|r| r)
                })
            }
            "$not" => Ok(!Self::matches(value, record)?),
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn field(field: &str, value: &Value, record: &Map<String, Value>) -> Result<bool, FilterError> {
        let actual = record.get(field).unwrap_or(&Value::Null);
        match operator_map(value) {
            Some(ops) => {
                for (op_key, op_val) in ops {
                    let operator = FilterOp::parse(op_key)
                        .ok_or_else(|| FilterError::UnsupportedOperator(op_key.to_string()))?;
                    if !Self::condition(actual, operator, op_val)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            None => Self::condition(actual, FilterOp::Eq, value),
        }
    }

    fn condition(actual: &Value, operator: FilterOp, data: &Value) -> Result<bool, FilterError> {
        // SQL three-valued logic: comparisons against NULL never match
        let ordered = |wanted: &[Ordering]| -> bool {
            !actual.is_null()
                && compare_values(actual, data).map(|o| wanted.contains(&o)).unwrap_or(false)
        };
        Ok(match operator {
            FilterOp::Eq if data.is_null() => actual.is_null(),
            FilterOp::Ne if data.is_null() => !actual.is_null(),
            FilterOp::Eq => ordered(&[Ordering::Equal]),
            FilterOp::Ne => !actual.is_null() && !ordered(&[Ordering::Equal]),
            FilterOp::Gt => ordered(&[Ordering::Greater]),
            FilterOp::Gte => ordered(&[Ordering::Greater, Ordering::Equal]),
            FilterOp::Lt => ordered(&[Ordering::Less]),
            FilterOp::Lte => ordered(&[Ordering::Less, Ordering::Equal]),
            FilterOp::Like | FilterOp::ILike => {
                let pattern = data
                    .as_str()
                    .ok_or_else(|| FilterError::InvalidOperatorData("$like requires a string".to_string()))?;
                match actual {
                    Value::Null => false,
                    Value::String(s) => like(s, pattern, operator == FilterOp::ILike),
                    other => like(&other.to_string(), pattern, operator == FilterOp::ILike),
                }
            }
            FilterOp::In | FilterOp::NIn => {
                let values = match data {
                    Value::Array(values) => values.as_slice(),
                    single => std::slice::from_ref(single),
                };
                if actual.is_null() {
                    false
                } else {
                    let found = values
                        .iter()
                        .any(|v| compare_values(actual, v) == Some(Ordering::Equal));
                    found == (operator == FilterOp::In)
                }
            }
            FilterOp::Between => match data {
                Value::Array(values) if values.len() == 2 => {
                    !actual.is_null()
                        && matches!(compare_values(actual, &values[0]), Some(Ordering::Greater | Ordering::Equal))
                        && matches!(compare_values(actual, &values[1]), Some(Ordering::Less | Ordering::Equal))
                }
                _ => return Err(FilterError::InvalidOperatorData("$between requires array with 2 values".to_string())),
            },
            FilterOp::Null => match data {
                Value::Bool(want_null) => actual.is_null() == *want_null,
                _ => return Err(FilterError::InvalidOperatorData("$null requires a boolean".to_string())),
            },
        })
    }
}

/// Orders two JSON scalars the way Postgres would order the matching column values.
/// RFC 3339 strings compare as instants; UUID strings compare case-insensitively.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::String(x), Value::String(y)) => {
            if let (Ok(tx), Ok(ty)) = (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                return Some(tx.cmp(&ty));
            }
            if let (Ok(ux), Ok(uy)) = (uuid::Uuid::parse_str(x), uuid::Uuid::parse_str(y)) {
                return Some(ux.cmp(&uy));
            }
            Some(x.cmp(y))
        }
        _ => None,
    }
}

/// SQL LIKE with `%` and `_` wildcards
fn like(text: &str, pattern: &str, case_insensitive: bool) -> bool {
    let (text, pattern): (Vec<char>, Vec<char>) = if case_insensitive {
        (text.to_lowercase().chars().collect(), pattern.to_lowercase().chars().collect())
    } else {
        (text.chars().collect(), pattern.chars().collect())
    };

    let (mut t, mut p) = (0, 0);
    let (mut star_p, mut star_t) = (None, 0);
    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '_' || pattern[p] == text[t]) {
            t += 1;
            p += 1;
        } else if p < pattern.len() && pattern[p] == '%' {
            star_p = Some(p);
            star_t = t;
            p += 1;
        } else if let Some(sp) = star_p {
            p = sp + 1;
            star_t += 1;
            t = star_t;
        } else {
            return false;
        }
    }
    while p < pattern.len() && pattern[p] == '%' {
        p += 1;
    }
    p == pattern.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn null_equality_matches_absent_and_null() {
        let deleted = record(json!({ "id": 1, "deleted_at": "2024-01-01T00:00:00Z" }));
        let live = record(json!({ "id": 2, "deleted_at": null }));
        let no_column = record(json!({ "id": 3 }));
        let filter = json!({ "deleted_at": null });
        assert!(!FilterMatch::matches(&filter, &deleted).unwrap());
        assert!(FilterMatch::matches(&filter, &live).unwrap());
        assert!(FilterMatch::matches(&filter, &no_column).unwrap());
    }

    #[test]
    fn logical_operators() {
        let row = record(json!({ "day_of_week": "MONDAY", "period": 3 }));
        assert!(FilterMatch::matches(
            &json!({ "$or": [{ "day_of_week": "FRIDAY" }, { "period": { "$gte": 3 } }] }),
            &row
        )
        .unwrap());
        assert!(!FilterMatch::matches(
            &json!({ "$and": [{ "day_of_week": "MONDAY" }, { "period": { "$lt": 3 } }] }),
            &row
        )
        .unwrap());
        assert!(FilterMatch::matches(&json!({ "$not": { "period": 4 } }), &row).unwrap());
    }

    #[test]
    fn comparisons_against_null_never_match() {
        let row = record(json!({ "teacher_id": null }));
        assert!(!FilterMatch::matches(&json!({ "teacher_id": { "$ne": "x" } }), &row).unwrap());
        assert!(!FilterMatch::matches(&json!({ "teacher_id": { "$in": ["x"] } }), &row).unwrap());
        assert!(!FilterMatch::matches(&json!({ "teacher_id": { "$nin": ["x"] } }), &row).unwrap());
    }

    #[test]
    fn timestamps_compare_as_instants() {
        let row = record(json!({ "start_date": "2024-01-08T09:00:00+00:00" }));
        assert!(FilterMatch::matches(&json!({ "start_date": "2024-01-08T09:00:00Z" }), &row).unwrap());
        assert!(FilterMatch::matches(
            &json!({ "start_date": { "$between": ["2024-01-01T00:00:00Z", "2024-01-31T00:00:00Z"] } }),
            &row
        )
        .unwrap());
    }

    #[test]
    fn like_patterns() {
        assert!(like("Algebra I", "Alg%", false));
        assert!(like("Algebra I", "%bra _", false));
        assert!(!like("Algebra I", "alg%", false));
        assert!(like("Algebra I", "alg%", true));
        assert!(like("", "%", false));
        assert!(!like("abc", "a_", false));
    }

    #[test]
    fn rejects_unknown_operator() {
        let row = record(json!({ "a": 1 }));
        assert!(FilterMatch::matches(&json!({ "a": { "$regex": "1" } }), &row).is_err());
        assert!(FilterMatch::matches(&json!("raw"), &row).is_err());
    }
}
