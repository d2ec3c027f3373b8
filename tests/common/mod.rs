#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use serde_json::{json, Value};
use uuid::Uuid;

use school_office_api::database::{MemoryRepository, StaticSchema};
use school_office_api::handlers::{router, AppState};

/// Ids of the rows `seed_school` writes
pub struct Seed {
    pub classroom_id: Uuid,
    pub integration_id: Uuid,
    pub deleted_integration_id: Uuid,
    pub deleted_classroom_id: Uuid,
}

pub struct TestServer {
    pub base_url: String,
    pub store: Arc<MemoryRepository>,
    pub seed: Seed,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Router over a fresh memory store with the standard seed data
pub async fn app() -> (Router, Arc<MemoryRepository>, Seed) {
    let store = Arc::new(MemoryRepository::new());
    let seed = seed_school(&store).await;
    let state = AppState::new(store.clone(), Arc::new(StaticSchema::new()));
    (router(state), store, seed)
}

/// Serve the app on an ephemeral local port for the life of the test runtime
pub async fn spawn_server() -> Result<TestServer> {
    let (app, store, seed) = app().await;
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("failed to bind test listener")?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(TestServer {
        base_url: format!("http://{}", addr),
        store,
        seed,
        client: reqwest::Client::new(),
    })
}

pub async fn seed_school(store: &MemoryRepository) -> Seed {
    let seed = Seed {
        classroom_id: Uuid::new_v4(),
        integration_id: Uuid::new_v4(),
        deleted_integration_id: Uuid::new_v4(),
        deleted_classroom_id: Uuid::new_v4(),
    };
    let stamp = "2023-12-01T00:00:00Z";
    let branch_id = Uuid::new_v4();

    store
        .seed(
            "classrooms",
            vec![
                json!({
                    "id": seed.classroom_id, "branch_id": branch_id, "name": "7B",
                    "start_date": "2024-01-01", "end_date": "2024-01-14",
                    "created_at": stamp, "updated_at": stamp, "deleted_at": null
                }),
                json!({
                    "id": seed.deleted_classroom_id, "branch_id": branch_id, "name": "Closed 6A",
                    "start_date": "2024-01-01", "end_date": "2024-06-30",
                    "created_at": stamp, "updated_at": stamp, "deleted_at": "2023-12-15T00:00:00Z"
                }),
            ],
        )
        .await;
    store
        .seed(
            "classroom_integrations",
            vec![
                json!({
                    "id": seed.integration_id, "classroom_id": seed.classroom_id, "subject_id": Uuid::new_v4(),
                    "teacher_id": null, "created_at": stamp, "updated_at": stamp, "deleted_at": null
                }),
                json!({
                    "id": seed.deleted_integration_id, "classroom_id": seed.classroom_id, "subject_id": Uuid::new_v4(),
                    "teacher_id": null, "created_at": stamp, "updated_at": stamp,
                    "deleted_at": "2023-12-20T00:00:00Z"
                }),
            ],
        )
        .await;
    seed
}

pub fn monday_request(integration_id: Uuid) -> Value {
    json!({
        "rangeStart": "2024-01-01",
        "rangeEnd": "2024-01-14",
        "schedules": [{ "dayOfWeek": "MONDAY", "startTime": "09:00", "endTime": "10:00" }],
        "integrationId": integration_id,
        "teacherId": null
    })
}
