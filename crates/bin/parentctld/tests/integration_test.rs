//! End-to-end smoke tests for the full parentctld stack.
//!
//! Each test spins up the complete application (in-memory `SQLite`, real
//! store, static host hints, real service, real axum router) and exercises
//! the HTTP layer via `tower::ServiceExt::oneshot`. No TCP port is bound.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use parentctl_adapter_host_hints::{HostHintsConfig, StaticHost};
use parentctl_adapter_http_axum::router;
use parentctl_adapter_http_axum::state::AppState;
use parentctl_adapter_storage_sqlite_sqlx::{Config, SqliteConfigStore};
use parentctl_app::services::rule_form_service::RuleFormService;
use tower::ServiceExt;

/// Build a fully-wired router backed by an in-memory `SQLite` database.
async fn app() -> axum::Router {
    let db = Config {
        database_url: "sqlite::memory:".to_string(),
    }
    .build()
    .await
    .expect("in-memory database should initialise");

    let hints = HostHintsConfig {
        leases: None,
        hosts: vec![StaticHost {
            mac: "aa:bb:cc:dd:ee:01".to_string(),
            name: Some("tablet".to_string()),
            ipv4: Some("192.168.1.10".to_string()),
        }],
    }
    .build()
    .expect("static hosts should be valid");

    let service = RuleFormService::new(SqliteConfigStore::new(db.pool().clone()), hints);
    router::build(AppState::new(service))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn send(method: &str, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_return_ok_when_health_check_called() {
    let resp = app().await.oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Form
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_load_empty_form_with_suggestions() {
    let resp = app().await.oneshot(get("/api/form")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json(resp).await;
    assert_eq!(body["rules"], serde_json::json!([]));
    assert_eq!(body["settings"]["debug"], true);
    let schema = body["schema"].to_string();
    assert!(schema.contains("AA:BB:CC:DD:EE:01 (tablet)"));
    assert!(schema.contains("192.168.1.10 (tablet)"));
}

#[tokio::test]
async fn should_submit_batch_and_show_rows_with_status() {
    let app = app().await;
    let resp = app
        .clone()
        .oneshot(send(
            "POST",
            "/api/form",
            &serde_json::json!({
                "rules": [
                    {"name": "Tablet", "mac": "aa:bb:cc:dd:ee:01"},
                    {"name": "Console", "enabled": false, "ip": "192.168.1.99"},
                ],
                "settings": {"debug": "0"},
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let outcome = json(resp).await;
    assert_eq!(outcome["rules"].as_array().unwrap().len(), 2);
    assert_eq!(outcome["settings"]["debug"], false);

    let form = json(app.oneshot(get("/api/form")).await.unwrap()).await;
    let rows = form["rules"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["values"]["name"], "Tablet");
    assert_eq!(rows[0]["warnings"], serde_json::json!([]));
    assert_eq!(rows[1]["status"], "disabled");
    assert_eq!(
        rows[1]["warnings"],
        serde_json::json!([{"kind": "unknown_option", "field": "ip"}])
    );
    assert_eq!(form["settings"]["debug"], false);
}

#[tokio::test]
async fn should_reject_batch_atomically() {
    let app = app().await;
    let resp = app
        .clone()
        .oneshot(send(
            "POST",
            "/api/form",
            &serde_json::json!({
                "rules": [
                    {"name": "Good"},
                    {"name": "Bad", "days": ["funday"]},
                ],
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json(resp).await;
    assert_eq!(body["rows"][0]["row"], 1);

    let rules = json(app.oneshot(get("/api/rules")).await.unwrap()).await;
    assert_eq!(rules, serde_json::json!([]));
}

// ---------------------------------------------------------------------------
// Rules CRUD
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_create_update_and_delete_rule() {
    let app = app().await;

    let resp = app
        .clone()
        .oneshot(send(
            "POST",
            "/api/rules",
            &serde_json::json!({"name": "Laptop", "ip": "192.168.1.10"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = json(resp).await;
    assert_eq!(
        created["days"],
        serde_json::json!(["mon", "tue", "wed", "thu", "fri"])
    );
    let id = created["id"].as_str().unwrap().to_string();

    let resp = app
        .clone()
        .oneshot(send(
            "PUT",
            &format!("/api/rules/{id}"),
            &serde_json::json!({"start": "22:15", "ip": ""}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated = json(resp).await;
    assert_eq!(updated["start"], "22:15");
    assert_eq!(updated["ip"], serde_json::Value::Null);
    assert_eq!(updated["name"], "Laptop");

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/rules/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app
        .oneshot(get(&format!("/api/rules/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn should_report_every_invalid_field() {
    let resp = app()
        .await
        .oneshot(send(
            "POST",
            "/api/rules",
            &serde_json::json!({
                "name": "  ",
                "mac": "00:11:22:33:44",
                "ip": "300.1.1.1",
                "end": "7:00",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json(resp).await;
    assert_eq!(
        body["fields"],
        serde_json::json!([
            {"kind": "empty_field", "field": "name"},
            {"kind": "invalid_format", "field": "mac"},
            {"kind": "invalid_format", "field": "ip"},
            {"kind": "invalid_format", "field": "end"},
        ])
    );
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_reject_unreadable_debug_flag() {
    let resp = app()
        .await
        .oneshot(send(
            "PUT",
            "/api/settings",
            &serde_json::json!({"debug": "sometimes"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json(resp).await;
    assert_eq!(
        body["fields"],
        serde_json::json!([{"kind": "invalid_format", "field": "debug"}])
    );
}
