use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::filter::FilterData;

/// A stored row as a JSON object keyed by column name
pub type Row = Map<String, Value>;

/// Read side of the storage seam. Every read the soft-delete decorator
/// intercepts goes through one of these four calls.
#[async_trait]
pub trait ReadRepository: Send + Sync {
    /// Get many
    async fn select_any(&self, entity: &str, filter: FilterData) -> Result<Vec<Row>, DatabaseError>;

    /// Get one, optional
    async fn select_one(&self, entity: &str, filter: FilterData) -> Result<Option<Row>, DatabaseError>;

    /// Get one, required: `DatabaseError::NotFound` when nothing matches
    async fn select_404(&self, entity: &str, filter: FilterData) -> Result<Row, DatabaseError> {
        self.select_one(entity, filter)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} record not found", entity)))
    }

    async fn count(&self, entity: &str, filter: FilterData) -> Result<i64, DatabaseError>;
}

/// Write side of the storage seam; never filtered
#[async_trait]
pub trait WriteRepository: Send + Sync {
    async fn insert_many(&self, entity: &str, rows: Vec<Row>) -> Result<u64, DatabaseError>;

    /// Apply `changes` to the row with this id, returning the updated row
    async fn update_one(&self, entity: &str, id: Uuid, changes: Row) -> Result<Option<Row>, DatabaseError>;

    /// Physically remove every row matching `where_clause`
    async fn delete_where(&self, entity: &str, where_clause: Value) -> Result<u64, DatabaseError>;

    /// Remove every row matching `where_clause` and insert `rows` in its place,
    /// atomically where the backend supports it. Returns the number removed.
    async fn replace_where(&self, entity: &str, where_clause: Value, rows: Vec<Row>) -> Result<u64, DatabaseError>;

    async fn ping(&self) -> Result<(), DatabaseError>;
}

pub trait Repository: ReadRepository + WriteRepository {}

impl<T: ReadRepository + WriteRepository + ?Sized> Repository for T {}

/// Decode a row into a typed model
pub fn decode<T: serde::de::DeserializeOwned>(row: Row) -> Result<T, DatabaseError> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

/// Encode a typed model into a row
pub fn encode<T: serde::Serialize>(model: &T) -> Result<Row, DatabaseError> {
    match serde_json::to_value(model)? {
        Value::Object(row) => Ok(row),
        other => Err(DatabaseError::QueryError(format!("expected an object row, got {}", other))),
    }
}
