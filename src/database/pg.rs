use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::query_builder::{pg_arguments, QueryBuilder};
use crate::database::repository::{ReadRepository, Row, WriteRepository};
use crate::filter::{Filter, FilterData};

/// Postgres-backed repository; every table is read and written as JSON rows
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn into_row(value: Value) -> Result<Row, DatabaseError> {
    match value {
        Value::Object(row) => Ok(row),
        other => Err(DatabaseError::QueryError(format!("row_to_json returned {}", other))),
    }
}

#[async_trait]
impl ReadRepository for PgRepository {
    async fn select_any(&self, entity: &str, filter: FilterData) -> Result<Vec<Row>, DatabaseError> {
        let sql = QueryBuilder::new(entity, filter)?.select_json()?;
        let values: Vec<Value> = sqlx::query_scalar_with(&sql.query, pg_arguments(&sql.params))
            .fetch_all(&self.pool)
            .await?;
        values.into_iter().map(into_row).collect()
    }

    async fn select_one(&self, entity: &str, filter: FilterData) -> Result<Option<Row>, DatabaseError> {
        let filter = FilterData { limit: Some(1), ..filter };
        let sql = QueryBuilder::new(entity, filter)?.select_json()?;
        let value: Option<Value> = sqlx::query_scalar_with(&sql.query, pg_arguments(&sql.params))
            .fetch_optional(&self.pool)
            .await?;
        value.map(into_row).transpose()
    }

    async fn count(&self, entity: &str, filter: FilterData) -> Result<i64, DatabaseError> {
        let sql = QueryBuilder::new(entity, filter)?.count()?;
        let count: i64 = sqlx::query_scalar_with(&sql.query, pg_arguments(&sql.params))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl WriteRepository for PgRepository {
    async fn insert_many(&self, entity: &str, rows: Vec<Row>) -> Result<u64, DatabaseError> {
        if rows.is_empty() {
            return Ok(0);
        }
        Filter::new(entity)?;
        let sql = QueryBuilder::insert_json(entity, rows);
        let result = sqlx::query_with(&sql.query, pg_arguments(&sql.params))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn update_one(&self, entity: &str, id: Uuid, changes: Row) -> Result<Option<Row>, DatabaseError> {
        Filter::new(entity)?;
        let sql = QueryBuilder::update_json(entity, id, changes)?;
        let value: Option<Value> = sqlx::query_scalar_with(&sql.query, pg_arguments(&sql.params))
            .fetch_optional(&self.pool)
            .await?;
        value.map(into_row).transpose()
    }

    async fn delete_where(&self, entity: &str, where_clause: Value) -> Result<u64, DatabaseError> {
        let sql = QueryBuilder::new(entity, FilterData::where_value(where_clause))?.delete()?;
        let result = sqlx::query_with(&sql.query, pg_arguments(&sql.params))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn replace_where(&self, entity: &str, where_clause: Value, rows: Vec<Row>) -> Result<u64, DatabaseError> {
        let delete = QueryBuilder::new(entity, FilterData::where_value(where_clause))?.delete()?;
        let insert = (!rows.is_empty()).then(|| QueryBuilder::insert_json(entity, rows));

        let mut tx = self.pool.begin().await?;
        let removed = sqlx::query_with(&delete.query, pg_arguments(&delete.params))
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if let Some(insert) = insert {
            sqlx::query_with(&insert.query, pg_arguments(&insert.params))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(removed)
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}
