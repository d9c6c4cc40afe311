//! Upload API integration tests.
//!
//! Run with: `cargo test -p pastebom-api --test upload_test`

mod helpers;

use helpers::{setup_test_app, upload_form, BASE_URL, BOARD_JSON};
use pastebom_services::Visibility;
use serde_json::Value;

#[tokio::test]
async fn test_upload_generates_bom() {
    let app = setup_test_app();
    let client = app.client();

    let response = client
        .post("/upload")
        .multipart(upload_form("board.json", BOARD_JSON, None))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    let id = body["id"].as_str().unwrap().to_string();

    assert_eq!(body["url"], format!("{}/b/{}", BASE_URL, id));
    assert_eq!(body["artifact_url"], format!("memory:///boms/{}.html", id));
    assert_eq!(body["filename"], "board.json");
    assert_eq!(body["components"], 3);
    assert!(body["expires_at"].is_string());

    let keys = app.storage.keys().await.unwrap();
    assert_eq!(
        keys,
        vec![
            format!("boms/{}.html", id),
            format!("boms/{}.meta.json", id),
            format!("uploads/{}/board.json", id),
        ]
    );
    assert_eq!(
        app.storage
            .visibility(&format!("boms/{}.html", id))
            .await
            .unwrap(),
        Some(Visibility::Public)
    );
    assert_eq!(
        app.storage
            .visibility(&format!("uploads/{}/board.json", id))
            .await
            .unwrap(),
        Some(Visibility::Private)
    );
}

#[tokio::test]
async fn test_upload_applies_config_overrides() {
    let app = setup_test_app();
    let client = app.client();

    let response = client
        .post("/upload")
        .multipart(upload_form(
            "board.json",
            BOARD_JSON,
            Some(r#"{"dark_mode": true, "compression": false, "unknown_option": 1}"#),
        ))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    let id = body["id"].as_str().unwrap();

    let html = client.get(&format!("/b/{}", id)).await.text();
    assert!(html.contains("var config = {\"dark_mode\":true"));
    assert!(html.contains("var pcbdata = {"));
}

#[tokio::test]
async fn test_upload_unsupported_format() {
    let app = setup_test_app();
    let client = app.client();

    let response = client
        .post("/upload")
        .multipart(upload_form("design.xyz", "not a board", None))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"], "unsupported_format");
    assert_eq!(body["supported"], serde_json::json!([".json"]));
    assert!(app.storage.keys().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_invalid_config() {
    let app = setup_test_app();
    let client = app.client();

    for config in [r#"{"dark_mode": "yes"}"#, "[1, 2, 3]", "{not json"] {
        let response = client
            .post("/upload")
            .multipart(upload_form("board.json", BOARD_JSON, Some(config)))
            .await;

        assert_eq!(response.status_code(), 400, "config {}", config);
        let body: Value = response.json();
        assert_eq!(body["error"], "invalid_config");
    }
    assert!(app.storage.keys().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_missing_or_empty_file() {
    let app = setup_test_app();
    let client = app.client();

    let response = client
        .post("/upload")
        .multipart(axum_test::multipart::MultipartForm::new().add_text("config", "{}"))
        .await;
    assert_eq!(response.status_code(), 400);
    assert_eq!(response.json::<Value>()["error"], "invalid_input");

    let response = client
        .post("/upload")
        .multipart(upload_form("board.json", Vec::<u8>::new(), None))
        .await;
    assert_eq!(response.status_code(), 400);
    assert_eq!(response.json::<Value>()["error"], "invalid_input");
}

#[tokio::test]
async fn test_upload_too_large() {
    let app = setup_test_app();
    let client = app.client();

    // Above the 1 MB upload limit but inside the multipart slack
    let data = vec![b' '; 1024 * 1024 + 10];
    let response = client
        .post("/upload")
        .multipart(upload_form("board.json", data, None))
        .await;

    assert_eq!(response.status_code(), 413);
    assert_eq!(response.json::<Value>()["error"], "file_too_large");
    assert!(app.storage.keys().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_parse_failure_keeps_upload() {
    let app = setup_test_app();
    let client = app.client();

    let response = client
        .post("/upload")
        .multipart(upload_form("board.json", r#"{"spec_version": 1, "pcbdata":"#, None))
        .await;

    assert_eq!(response.status_code(), 422);
    assert_eq!(response.json::<Value>()["error"], "parse_error");

    let keys = app.storage.keys().await.unwrap();
    assert_eq!(keys.len(), 1);
    assert!(keys[0].starts_with("uploads/"));
    assert!(keys[0].ends_with("/board.json"));
}
