// handlers/mod.rs - HTTP surface
//
// Public:   /, /health
// Sessions: /api/sessions/*, /api/integrations/:id/*, /api/classrooms/:id/range
// Generic:  /api/find/:entity[/count], /api/data/:entity/:id (soft-delete aware)

pub mod classrooms;
pub mod data;
pub mod find;
pub mod health;
pub mod integrations;
pub mod sessions;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::database::metadata::{EntityMetadata, MetadataError};
use crate::database::repository::Repository;
use crate::database::soft_delete::{SoftDeleteRegistry, SoftDeleteRepository};
use crate::error::ApiError;
use crate::services::ClassroomService;

/// Shared handler state. `repo` is the soft-delete aware view of the store.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub registry: Arc<SoftDeleteRegistry>,
    pub classrooms: ClassroomService,
}

impl AppState {
    pub fn new(store: Arc<dyn Repository>, metadata: Arc<dyn EntityMetadata>) -> Self {
        let registry = Arc::new(SoftDeleteRegistry::from_config(metadata));
        Self::with_registry(store, registry)
    }

    pub fn with_registry(store: Arc<dyn Repository>, registry: Arc<SoftDeleteRegistry>) -> Self {
        let repo: Arc<dyn Repository> = Arc::new(SoftDeleteRepository::new(store, registry.clone()));
        Self {
            classrooms: ClassroomService::new(repo.clone()),
            repo,
            registry,
        }
    }

    /// 404 for entities the metadata source has never heard of. Any other
    /// metadata failure lets the request through.
    pub(crate) async fn ensure_entity(&self, entity: &str) -> Result<(), ApiError> {
        match self.registry.resolve(entity).await {
            Err(MetadataError::UnknownEntity(name)) => Err(ApiError::not_found(format!("Unknown entity: {}", name))),
            _ => Ok(()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let app = Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/api/sessions/preview", post(sessions::preview))
        .route("/api/sessions/:id", axum::routing::patch(sessions::update).delete(sessions::delete))
        .route("/api/integrations/:id/schedules", put(integrations::save_schedules))
        .route("/api/integrations/:id/sessions", get(integrations::list_sessions))
        .route("/api/classrooms/:id/range", put(classrooms::update_range))
        .route("/api/find/:entity", post(find::find_post))
        .route("/api/find/:entity/count", post(find::count_post))
        .route("/api/data/:entity/:id", get(data::record_get))
        .layer(CorsLayer::permissive())
        .with_state(state);

    if crate::config::config().api.enable_request_logging {
        app.layer(TraceLayer::new_for_http())
    } else {
        app
    }
}
