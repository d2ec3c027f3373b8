mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

// Schedule save, regeneration and per-session edits over HTTP.

fn monday_schedules() -> Value {
    json!({ "schedules": [{ "dayOfWeek": "MONDAY", "startTime": "09:00", "endTime": "10:00" }] })
}

async fn list_sessions(server: &common::TestServer) -> Result<Vec<Value>> {
    let url = server.url(&format!("/api/integrations/{}/sessions", server.seed.integration_id));
    let res = server.client.get(url).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(res.json::<Value>().await?["data"].as_array().cloned().unwrap_or_default())
}

async fn save_mondays(server: &common::TestServer) -> Result<Value> {
    let url = server.url(&format!("/api/integrations/{}/schedules", server.seed.integration_id));
    let res = server.client.put(url).json(&monday_schedules()).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(res.json::<Value>().await?)
}

#[tokio::test]
async fn health_reports_ok() -> Result<()> {
    let server = common::spawn_server().await?;
    let res = server.client.get(server.url("/health")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["data"]["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn saving_schedules_generates_sessions() -> Result<()> {
    let server = common::spawn_server().await?;
    let payload = save_mondays(&server).await?;
    assert_eq!(payload["data"]["sessionsCreated"], 2);
    assert_eq!(payload["data"]["sessionsDiscarded"], 0);

    let sessions = list_sessions(&server).await?;
    let starts: Vec<_> = sessions.iter().map(|s| s["startDate"].clone()).collect();
    assert_eq!(starts, vec![json!("2024-01-01T09:00:00Z"), json!("2024-01-08T09:00:00Z")]);

    // Saving again replaces, never duplicates
    let payload = save_mondays(&server).await?;
    assert_eq!(payload["data"]["sessionsDiscarded"], 2);
    assert_eq!(list_sessions(&server).await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn deleted_sessions_disappear_and_cannot_be_edited() -> Result<()> {
    let server = common::spawn_server().await?;
    save_mondays(&server).await?;
    let sessions = list_sessions(&server).await?;
    let first = sessions[0]["id"].as_str().unwrap_or_default().to_string();

    let res = server.client.delete(server.url(&format!("/api/sessions/{}", first))).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["data"]["deleted"], true);

    let remaining = list_sessions(&server).await?;
    assert_eq!(remaining.len(), 1);
    assert_ne!(remaining[0]["id"], json!(first));

    let res = server
        .client
        .patch(server.url(&format!("/api/sessions/{}", first)))
        .json(&json!({ "description": "Too late" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server.client.delete(server.url(&format!("/api/sessions/{}", first))).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn patch_edits_one_session() -> Result<()> {
    let server = common::spawn_server().await?;
    save_mondays(&server).await?;
    let sessions = list_sessions(&server).await?;
    let id = sessions[1]["id"].as_str().unwrap_or_default().to_string();
    let lesson = uuid::Uuid::new_v4();

    let res = server
        .client
        .patch(server.url(&format!("/api/sessions/{}", id)))
        .json(&json!({ "description": "Mock exam", "lessonIds": [lesson] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let data = res.json::<Value>().await?["data"].clone();
    assert_eq!(data["description"], "Mock exam");
    assert_eq!(data["lessonIds"], json!([lesson]));
    assert_eq!(data["startDate"], "2024-01-08T09:00:00Z");

    let res = server
        .client
        .patch(server.url(&format!("/api/sessions/{}", id)))
        .json(&json!({ "startDate": "2024-02-01T09:00:00Z" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn range_change_regenerates_and_resets_edits() -> Result<()> {
    let server = common::spawn_server().await?;
    save_mondays(&server).await?;
    let id = list_sessions(&server).await?[0]["id"].as_str().unwrap_or_default().to_string();
    server
        .client
        .patch(server.url(&format!("/api/sessions/{}", id)))
        .json(&json!({ "description": "Field trip" }))
        .send()
        .await?;

    let res = server
        .client
        .put(server.url(&format!("/api/classrooms/{}/range", server.seed.classroom_id)))
        .json(&json!({ "startDate": "2024-01-01", "endDate": "2024-01-31" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let data = res.json::<Value>().await?["data"].clone();
    assert_eq!(data["integrationsRegenerated"], 1);
    assert_eq!(data["sessionsCreated"], 5);

    let sessions = list_sessions(&server).await?;
    assert_eq!(sessions.len(), 5);
    assert!(sessions.iter().all(|s| s.get("description").is_none()));
    Ok(())
}

#[tokio::test]
async fn inverted_classroom_range_is_rejected() -> Result<()> {
    let server = common::spawn_server().await?;
    let res = server
        .client
        .put(server.url(&format!("/api/classrooms/{}/range", server.seed.classroom_id)))
        .json(&json!({ "startDate": "2024-03-01", "endDate": "2024-01-01" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?["code"], "VALIDATION_ERROR");
    Ok(())
}

#[tokio::test]
async fn deleted_parents_read_as_missing() -> Result<()> {
    let server = common::spawn_server().await?;

    let url = server.url(&format!("/api/integrations/{}/schedules", server.seed.deleted_integration_id));
    let res = server.client.put(url).json(&monday_schedules()).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let url = server.url(&format!("/api/integrations/{}/sessions", server.seed.deleted_integration_id));
    let res = server.client.get(url).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let url = server.url(&format!("/api/classrooms/{}/range", server.seed.deleted_classroom_id));
    let res = server
        .client
        .put(url)
        .json(&json!({ "startDate": "2024-01-01", "endDate": "2024-01-31" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn lower_case_days_are_stored_upper_case() -> Result<()> {
    let server = common::spawn_server().await?;
    let url = server.url(&format!("/api/integrations/{}/schedules", server.seed.integration_id));
    let body = json!({ "schedules": [{ "dayOfWeek": "monday", "startTime": "09:00", "endTime": "10:00" }] });
    let res = server.client.put(url).json(&body).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let data = res.json::<Value>().await?["data"].clone();
    assert_eq!(data["schedules"][0]["dayOfWeek"], "MONDAY");
    assert_eq!(data["sessionsCreated"], 2);
    Ok(())
}
