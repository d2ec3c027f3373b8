use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::database::metadata::{EntityMetadata, MetadataError};

/// Entity name to "carries a deletion marker", filled from an injected
/// metadata source. Successful lookups are cached for the life of the
/// registry; failed ones are not, so the next read retries.
pub struct SoftDeleteRegistry {
    metadata: Arc<dyn EntityMetadata>,
    marker: String,
    known: RwLock<HashMap<String, bool>>,
}

impl SoftDeleteRegistry {
    pub fn new(metadata: Arc<dyn EntityMetadata>, marker: impl Into<String>) -> Self {
        Self {
            metadata,
            marker: marker.into(),
            known: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_config(metadata: Arc<dyn EntityMetadata>) -> Self {
        Self::new(metadata, crate::config::config().soft_delete.field.clone())
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Resolve a batch of entities up front. Returns how many were resolved.
    pub async fn warm<I, S>(&self, entities: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entities: Vec<S> = entities.into_iter().collect();
        let lookups = entities.iter().map(|e| self.lookup(e.as_ref()));
        let resolved = join_all(lookups).await.into_iter().filter(Result::is_ok).count();
        info!("Soft-delete registry warmed: {}/{} entities resolved", resolved, entities.len());
        resolved
    }

    /// Fails open: an entity whose metadata cannot be read is treated as
    /// not soft-deletable.
    pub async fn is_soft_deletable(&self, entity: &str) -> bool {
        match self.resolve(entity).await {
            Ok(flag) => flag,
            Err(e) => {
                warn!("Soft-delete metadata unavailable for '{}', reading unfiltered: {}", entity, e);
                false
            }
        }
    }

    /// Like `is_soft_deletable`, but surfaces lookup failures to the caller
    pub async fn resolve(&self, entity: &str) -> Result<bool, MetadataError> {
        if let Some(known) = self.known.read().await.get(entity) {
            return Ok(*known);
        }
        self.lookup(entity).await
    }

    /// Cached flags, sorted by entity name
    pub async fn snapshot(&self) -> Vec<(String, bool)> {
        let mut out: Vec<_> = self.known.read().await.iter().map(|(k, v)| (k.clone(), *v)).collect();
        out.sort();
        out
    }

    async fn lookup(&self, entity: &str) -> Result<bool, MetadataError> {
        let fields = self.metadata.fields(entity).await?;
        let flag = fields.iter().any(|f| f.is_deletion_marker(&self.marker));
        debug!("Entity '{}' soft-deletable: {}", entity, flag);
        self.known.write().await.insert(entity.to_string(), flag);
        Ok(flag)
    }
}
