//! In-process repository with the same filter semantics as Postgres. Used by
//! the `memory` storage backend and throughout the test suite.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::repository::{ReadRepository, Row, WriteRepository};
use crate::filter::filter_match::compare_values;
use crate::filter::{Filter, FilterData, FilterMatch, FilterOrder};

#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<HashMap<String, Vec<Row>>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add rows directly, bypassing any decorator
    pub async fn seed(&self, entity: &str, rows: impl IntoIterator<Item = Value>) {
        let mut tables = self.tables.write().await;
        let table = tables.entry(entity.to_string()).or_default();
        table.extend(rows.into_iter().filter_map(|v| match v {
            Value::Object(row) => Some(row),
            _ => None,
        }));
    }

    fn matching(rows: &[Row], where_clause: Option<&Value>) -> Result<Vec<usize>, DatabaseError> {
        let mut out = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            let keep = match where_clause {
                Some(w) => FilterMatch::matches(w, row)?,
                None => true,
            };
            if keep {
                out.push(i);
            }
        }
        Ok(out)
    }

    fn query(rows: &[Row], filter: &Filter) -> Result<Vec<Row>, DatabaseError> {
        let mut hits: Vec<&Row> = Self::matching(rows, filter.where_data())?
            .into_iter()
            .map(|i| &rows[i])
            .collect();

        if !filter.order_data().is_empty() {
            hits.sort_by(|a, b| FilterOrder::compare(filter.order_data(), a, b));
        }

        let offset = filter.offset_value().unwrap_or(0).max(0) as usize;
        let limit = filter.limit_value().map(|l| l.max(0) as usize).unwrap_or(usize::MAX);
        let columns = filter.select_columns();
        let project_all = columns.is_empty() || columns.iter().any(|c| c == "*");

        Ok(hits
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|row| {
                if project_all {
                    row.clone()
                } else {
                    columns
                        .iter()
                        .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
                        .collect()
                }
            })
            .collect())
    }

    fn same_id(row: &Row, id: Uuid) -> bool {
        row.get("id")
            .map(|v| compare_values(v, &Value::String(id.to_string())) == Some(Ordering::Equal))
            .unwrap_or(false)
    }
}

#[async_trait]
impl ReadRepository for MemoryRepository {
    async fn select_any(&self, entity: &str, filter: FilterData) -> Result<Vec<Row>, DatabaseError> {
        let filter = Filter::from_data(entity, filter)?;
        let tables = self.tables.read().await;
        match tables.get(entity) {
            Some(rows) => Self::query(rows, &filter),
            None => Ok(vec![]),
        }
    }

    async fn select_one(&self, entity: &str, filter: FilterData) -> Result<Option<Row>, DatabaseError> {
        let filter = FilterData { limit: Some(1), ..filter };
        Ok(self.select_any(entity, filter).await?.into_iter().next())
    }

    async fn count(&self, entity: &str, filter: FilterData) -> Result<i64, DatabaseError> {
        let filter = Filter::from_data(entity, filter)?;
        let tables = self.tables.read().await;
        let count = match tables.get(entity) {
            Some(rows) => Self::matching(rows, filter.where_data())?.len(),
            None => 0,
        };
        Ok(count as i64)
    }
}

#[async_trait]
impl WriteRepository for MemoryRepository {
    async fn insert_many(&self, entity: &str, rows: Vec<Row>) -> Result<u64, DatabaseError> {
        Filter::new(entity)?;
        let inserted = rows.len() as u64;
        let mut tables = self.tables.write().await;
        tables.entry(entity.to_string()).or_default().extend(rows);
        Ok(inserted)
    }

    async fn update_one(&self, entity: &str, id: Uuid, changes: Row) -> Result<Option<Row>, DatabaseError> {
        Filter::new(entity)?;
        let mut tables = self.tables.write().await;
        let Some(row) = tables
            .get_mut(entity)
            .and_then(|rows| rows.iter_mut().find(|row| Self::same_id(row, id)))
        else {
            return Ok(None);
        };
        for (column, value) in changes {
            if column != "id" {
                row.insert(column, value);
            }
        }
        Ok(Some(row.clone()))
    }

    async fn delete_where(&self, entity: &str, where_clause: Value) -> Result<u64, DatabaseError> {
        let filter = Filter::from_data(entity, FilterData::where_value(where_clause))?;
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(entity) else { return Ok(0) };

        let doomed = Self::matching(rows, filter.where_data())?;
        let mut index = 0;
        rows.retain(|_| {
            let keep = doomed.binary_search(&index).is_err();
            index += 1;
            keep
        });
        Ok(doomed.len() as u64)
    }

    async fn replace_where(&self, entity: &str, where_clause: Value, rows: Vec<Row>) -> Result<u64, DatabaseError> {
        let filter = Filter::from_data(entity, FilterData::where_value(where_clause))?;
        let mut tables = self.tables.write().await;
        let table = tables.entry(entity.to_string()).or_default();

        let doomed = Self::matching(table, filter.where_data())?;
        let mut index = 0;
        table.retain(|_| {
            let keep = doomed.binary_search(&index).is_err();
            index += 1;
            keep
        });
        table.extend(rows);
        Ok(doomed.len() as u64)
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
