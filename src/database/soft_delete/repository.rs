use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::repository::{ReadRepository, Repository, Row, WriteRepository};
use crate::filter::FilterData;

use super::registry::SoftDeleteRegistry;

/// Read-path decorator: reads of soft-deletable entities only see rows whose
/// marker is null. Writes go to the wrapped repository untouched.
pub struct SoftDeleteRepository<R: ?Sized> {
    inner: Arc<R>,
    registry: Arc<SoftDeleteRegistry>,
}

impl<R: Repository + ?Sized> SoftDeleteRepository<R> {
    pub fn new(inner: Arc<R>, registry: Arc<SoftDeleteRegistry>) -> Self {
        Self { inner, registry }
    }

    pub fn registry(&self) -> &Arc<SoftDeleteRegistry> {
        &self.registry
    }

    /// The undecorated repository, for reads that must see deleted rows
    pub fn inner(&self) -> &Arc<R> {
        &self.inner
    }

    async fn scoped(&self, entity: &str, filter: FilterData) -> FilterData {
        if !self.registry.is_soft_deletable(entity).await {
            return filter;
        }
        let mut live = Map::new();
        live.insert(self.registry.marker().to_string(), Value::Null);
        filter.and_where(Value::Object(live))
    }
}

#[async_trait]
impl<R: Repository + ?Sized> ReadRepository for SoftDeleteRepository<R> {
    async fn select_any(&self, entity: &str, filter: FilterData) -> Result<Vec<Row>, DatabaseError> {
        let filter = self.scoped(entity, filter).await;
        self.inner.select_any(entity, filter).await
    }

    async fn select_one(&self, entity: &str, filter: FilterData) -> Result<Option<Row>, DatabaseError> {
        let filter = self.scoped(entity, filter).await;
        self.inner.select_one(entity, filter).await
    }

    async fn select_404(&self, entity: &str, filter: FilterData) -> Result<Row, DatabaseError> {
        let filter = self.scoped(entity, filter).await;
        self.inner.select_404(entity, filter).await
    }

    async fn count(&self, entity: &str, filter: FilterData) -> Result<i64, DatabaseError> {
        let filter = self.scoped(entity, filter).await;
        self.inner.count(entity, filter).await
    }
}

#[async_trait]
impl<R: Repository + ?Sized> WriteRepository for SoftDeleteRepository<R> {
    async fn insert_many(&self, entity: &str, rows: Vec<Row>) -> Result<u64, DatabaseError> {
        self.inner.insert_many(entity, rows).await
    }

    async fn update_one(&self, entity: &str, id: Uuid, changes: Row) -> Result<Option<Row>, DatabaseError> {
        self.inner.update_one(entity, id, changes).await
    }

    async fn delete_where(&self, entity: &str, where_clause: Value) -> Result<u64, DatabaseError> {
        self.inner.delete_where(entity, where_clause).await
    }

    async fn replace_where(&self, entity: &str, where_clause: Value, rows: Vec<Row>) -> Result<u64, DatabaseError> {
        self.inner.replace_where(entity, where_clause, rows).await
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        self.inner.ping().await
    }
}
