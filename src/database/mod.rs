pub mod manager;
pub mod memory;
pub mod metadata;
pub mod models;
pub mod pg;
pub mod query_builder;
pub mod repository;
pub mod soft_delete;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryRepository;
pub use metadata::{EntityMetadata, FieldInfo, FieldKind, MetadataError, PgCatalog, StaticSchema};
pub use pg::PgRepository;
pub use repository::{decode, encode, ReadRepository, Repository, Row, WriteRepository};
pub use soft_delete::{SoftDeleteRegistry, SoftDeleteRepository};
