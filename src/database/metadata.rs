//! Field-level metadata about stored entities.
//!
//! The soft-delete registry asks an `EntityMetadata` source which fields an
//! entity has. `StaticSchema` answers from the built-in school-office model;
//! `PgCatalog` answers from the live database catalog.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Metadata unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Uuid,
    Text,
    Integer,
    Boolean,
    Date,
    Time,
    Timestamp,
    UuidArray,
    Json,
}

impl FieldKind {
    /// Map a Postgres `information_schema` data type name
    pub fn from_pg(data_type: &str, udt_name: &str) -> Self {
        match data_type {
            "uuid" => FieldKind::Uuid,
            "integer" | "bigint" | "smallint" | "numeric" => FieldKind::Integer,
            "boolean" => FieldKind::Boolean,
            "date" => FieldKind::Date,
            "time without time zone" | "time with time zone" => FieldKind::Time,
            "timestamp with time zone" | "timestamp without time zone" => FieldKind::Timestamp,
            "json" | "jsonb" => FieldKind::Json,
            "ARRAY" if udt_name == "_uuid" => FieldKind::UuidArray,
            _ => FieldKind::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldInfo {
    pub name: String,
    pub kind: FieldKind,
    pub nullable: bool,
}

impl FieldInfo {
    fn new(name: &str, kind: FieldKind, nullable: bool) -> Self {
        Self { name: name.to_string(), kind, nullable }
    }

    /// True for a nullable timestamp named `marker`
    pub fn is_deletion_marker(&self, marker: &str) -> bool {
        self.name == marker && self.kind == FieldKind::Timestamp && self.nullable
    }
}

#[async_trait]
pub trait EntityMetadata: Send + Sync {
    async fn fields(&self, entity: &str) -> Result<Vec<FieldInfo>, MetadataError>;
}

/// Built-in definitions of the school-office entities
pub struct StaticSchema {
    entities: BTreeMap<&'static str, Vec<FieldInfo>>,
}

impl StaticSchema {
    pub fn new() -> Self {
        use FieldKind::*;

        let mut entities = BTreeMap::new();
        let mut define = |name: &'static str, soft_delete: bool, columns: &[(&str, FieldKind, bool)]| {
            let mut fields = vec![FieldInfo::new("id", Uuid, false)];
            fields.extend(columns.iter().map(|(n, k, null)| FieldInfo::new(n, *k, *null)));
            fields.push(FieldInfo::new("created_at", Timestamp, false));
            fields.push(FieldInfo::new("updated_at", Timestamp, false));
            if soft_delete {
                fields.push(FieldInfo::new("deleted_at", Timestamp, true));
            }
            entities.insert(name, fields);
        };

        define("companies", true, &[("name", Text, false)]);
        define("branches", true, &[("company_id", Uuid, false), ("name", Text, false), ("address", Text, true)]);
        define("users", true, &[("branch_id", Uuid, true), ("email", Text, false), ("name", Text, false), ("role_id", Uuid, true)]);
        define("roles", false, &[("name", Text, false)]);
        define("permissions", false, &[("role_id", Uuid, false), ("action", Text, false), ("resource", Text, false)]);
        define("students", true, &[("branch_id", Uuid, false), ("classroom_id", Uuid, true), ("name", Text, false), ("birth_date", Date, true)]);
        define("parents", true, &[("student_id", Uuid, false), ("name", Text, false), ("phone", Text, true)]);
        define("classrooms", true, &[("branch_id", Uuid, false), ("name", Text, false), ("start_date", Date, false), ("end_date", Date, false)]);
        define("subjects", true, &[("name", Text, false)]);
        define("curricula", true, &[("subject_id", Uuid, false), ("name", Text, false)]);
        define("lessons", true, &[("curriculum_id", Uuid, false), ("title", Text, false), ("position", Integer, false)]);
        define("questions", true, &[("lesson_id", Uuid, false), ("body", Text, false), ("answer", Json, true)]);
        define("assessments", true, &[("lesson_id", Uuid, false), ("student_id", Uuid, false), ("score", Integer, true)]);
        define("devices", true, &[("branch_id", Uuid, false), ("serial", Text, false), ("active", Boolean, false)]);
        define(
            "classroom_integrations",
            true,
            &[("classroom_id", Uuid, false), ("subject_id", Uuid, false), ("curriculum_id", Uuid, true), ("teacher_id", Uuid, true)],
        );
        define(
            "weekly_schedules",
            false,
            &[("classroom_integration_id", Uuid, false), ("day_of_week", Text, false), ("start_time", Time, false), ("end_time", Time, false)],
        );
        define(
            "classroom_integration_sessions",
            true,
            &[
                ("classroom_integration_id", Uuid, false),
                ("teacher_id", Uuid, true),
                ("start_date", Timestamp, false),
                ("end_date", Timestamp, false),
                ("description", Text, true),
                ("lesson_ids", UuidArray, false),
            ],
        );

        Self { entities }
    }

    pub fn entity_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entities.keys().copied()
    }

    pub fn get(&self, entity: &str) -> Option<&[FieldInfo]> {
        self.entities.get(entity).map(Vec::as_slice)
    }
}

impl Default for StaticSchema {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityMetadata for StaticSchema {
    async fn fields(&self, entity: &str) -> Result<Vec<FieldInfo>, MetadataError> {
        self.get(entity)
            .map(<[FieldInfo]>::to_vec)
            .ok_or_else(|| MetadataError::UnknownEntity(entity.to_string()))
    }
}

/// Reads column metadata from `information_schema` in the current schema
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityMetadata for PgCatalog {
    async fn fields(&self, entity: &str) -> Result<Vec<FieldInfo>, MetadataError> {
        let rows: Vec<(String, String, String, String)> = sqlx::query_as(
            "SELECT column_name::text, data_type::text, udt_name::text, is_nullable::text
             FROM information_schema.columns
             WHERE table_schema = current_schema() AND table_name = $1
             ORDER BY ordinal_position",
        )
        .bind(entity)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Err(MetadataError::UnknownEntity(entity.to_string()));
        }

        Ok(rows
            .into_iter()
            .map(|(name, data_type, udt_name, is_nullable)| FieldInfo {
                kind: FieldKind::from_pg(&data_type, &udt_name),
                nullable: is_nullable == "YES",
                name,
            })
            .collect())
    }
}
