//! Logical deletion on the read path.
//!
//! `SoftDeleteRegistry` decides which entities carry a deletion marker;
//! `SoftDeleteRepository` wraps any repository and restricts its reads of
//! those entities to live rows.

pub mod registry;
pub mod repository;

pub use registry::SoftDeleteRegistry;
pub use repository::SoftDeleteRepository;
