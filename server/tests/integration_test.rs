//! Integration tests for reportbox
//!
//! These tests start the real router on a local port and verify end-to-end:
//! - Report submission, listing and toggling over HTTP
//! - Photo upload, rejection and serving
//! - JSON error envelopes and cache headers

use reportbox::config::ServerConfig;
use reportbox::{api, app};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::collections::HashSet;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Helper to start a server over a fresh data directory
async fn spawn_server() -> (String, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        data_dir: temp_dir.path().to_path_buf(),
    };

    let state = app::setup(&config).await.unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, api::router(state)).await.unwrap();
    });

    (format!("http://{}", addr), temp_dir)
}

fn photo_part(bytes: Vec<u8>, file_name: &str, mime: &str) -> Part {
    Part::bytes(bytes)
        .file_name(file_name.to_string())
        .mime_str(mime)
        .unwrap()
}

async fn submit(client: &reqwest::Client, base: &str, form: Form) -> (StatusCode, Value) {
    let response = client
        .post(format!("{base}/api/report"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    let status = response.status();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn test_report_lifecycle() {
    let (base, _temp) = spawn_server().await;
    let client = reqwest::Client::new();

    // Submit
    let form = Form::new()
        .text("description", "  Broken bench in the park ")
        .text("lat", "37.5665")
        .text("lng", "126.978");
    let (status, body) = submit(&client, &base, form).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let report = &body["report"];
    assert_eq!(report["description"], "Broken bench in the park");
    assert_eq!(report["lat"], 37.5665);
    assert_eq!(report["lng"], 126.978);
    assert!(report["photo"].is_null());
    assert_eq!(report["resolved"], false);
    let id = report["id"].as_str().unwrap().to_string();

    // List
    let response = client
        .get(format!("{base}/api/reports"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["cache-control"],
        "no-store, no-cache, must-revalidate"
    );
    assert_eq!(response.headers()["pragma"], "no-cache");
    assert_eq!(response.headers()["expires"], "0");

    let listed: Value = response.json().await.unwrap();
    assert_eq!(listed["reports"].as_array().unwrap().len(), 1);
    assert_eq!(&listed["reports"][0], report);

    // Toggle twice
    for expected in [true, false] {
        let response = client
            .post(format!("{base}/api/report/{id}/toggle"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["report"]["id"], id.as_str());
        assert_eq!(body["report"]["resolved"], expected);
    }
}

#[tokio::test]
async fn test_list_is_newest_first() {
    let (base, _temp) = spawn_server().await;
    let client = reqwest::Client::new();

    submit(&client, &base, Form::new().text("description", "report A")).await;
    submit(&client, &base, Form::new().text("description", "report B")).await;

    let listed: Value = client
        .get(format!("{base}/api/reports"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(listed["reports"][0]["description"], "report B");
    assert_eq!(listed["reports"][1]["description"], "report A");
}

#[tokio::test]
async fn test_validation_errors() {
    let (base, _temp) = spawn_server().await;
    let client = reqwest::Client::new();

    for description in ["", "ab"] {
        let form = Form::new().text("description", description);
        let (status, body) = submit(&client, &base, form).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "description or photo required");
    }

    let (status, _) = submit(&client, &base, Form::new().text("description", "abc")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_non_multipart_body_is_rejected_as_json() {
    let (base, _temp) = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/api/report"))
        .body("description=hello")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_photo_upload_and_serve() {
    let (base, _temp) = spawn_server().await;
    let client = reqwest::Client::new();

    let bytes = b"\x89PNG\r\n\x1a\nnot really a png".to_vec();
    let form = Form::new().part("photo", photo_part(bytes.clone(), "street.png", "image/png"));
    let (status, body) = submit(&client, &base, form).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["report"]["description"], "");
    let photo = body["report"]["photo"].as_str().unwrap();
    assert!(photo.starts_with("/uploads/"));
    assert!(photo.ends_with(".png"));

    let response = client.get(format!("{base}{photo}")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/png");
    assert_eq!(response.bytes().await.unwrap().as_ref(), bytes.as_slice());
}

#[tokio::test]
async fn test_upload_rejections() {
    let (base, temp) = spawn_server().await;
    let client = reqwest::Client::new();

    // 6 MiB is too large whatever the type
    let form = Form::new()
        .text("description", "huge photo")
        .part("photo", photo_part(vec![0u8; 6 * 1024 * 1024], "big.jpg", "image/jpeg"));
    let (status, body) = submit(&client, &base, form).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "photo upload failed");
    assert!(body["detail"].as_str().unwrap().contains("too large"));

    // A text file is rejected however small
    let form = Form::new()
        .text("description", "text attachment")
        .part("photo", photo_part(b"hello".to_vec(), "notes.txt", "text/plain"));
    let (status, body) = submit(&client, &base, form).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "photo upload failed");

    // Nothing was persisted
    let listed: Value = client
        .get(format!("{base}/api/reports"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(listed["reports"].as_array().unwrap().is_empty());
    assert_eq!(std::fs::read_dir(temp.path().join("uploads")).unwrap().count(), 0);
}

#[tokio::test]
async fn test_toggle_unknown_id() {
    let (base, _temp) = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/api/report/no-such-report/toggle"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()["cache-control"], "no-store, no-cache, must-revalidate");
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_missing_upload_and_unknown_route_are_json() {
    let (base, _temp) = spawn_server().await;
    let client = reqwest::Client::new();

    for path in ["/uploads/1-missing.jpg", "/uploads/..%2Fdb.json", "/nowhere"] {
        let response = client.get(format!("{base}{path}")).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["success"], false, "{path}");
    }

    let response = client.get(format!("{base}/api/report")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_undecodable_path_segments_are_json_404() {
    let (base, _temp) = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/api/report/%FF/toggle"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()["cache-control"], "no-store, no-cache, must-revalidate");
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "report not found");

    let response = client
        .get(format!("{base}/uploads/%FF.jpg"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "file not found");
}

#[tokio::test]
async fn test_json_submission() {
    let (base, _temp) = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/api/report"))
        .json(&json!({"description": "json report", "lat": 37.5, "lng": 127.0}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["report"]["description"], "json report");
    assert_eq!(body["report"]["lat"], 37.5);
    assert_eq!(body["report"]["lng"], 127.0);
    assert!(body["report"]["photo"].is_null());
    let id = body["report"]["id"].as_str().unwrap().to_string();

    // String coordinates go through the same lenient parsing
    let response = client
        .post(format!("{base}/api/report"))
        .json(&json!({"description": "string coords", "lat": "-33.86", "lng": "abc"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert!(body["report"]["lat"].is_null());
    assert!(body["report"]["lng"].is_null());

    let listed: Value = client
        .get(format!("{base}/api/reports"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let reports = listed["reports"].as_array().unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[1]["id"], id.as_str());

    // Validation applies to JSON bodies too
    let response = client
        .post(format!("{base}/api/report"))
        .json(&json!({"description": "ab"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);

    let response = client
        .post(format!("{base}/api/report"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "invalid JSON body");
}

#[tokio::test]
async fn test_cross_origin_requests_are_allowed() {
    let (base, _temp) = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{base}/api/reports"))
        .header("origin", "http://example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");

    let response = client
        .request(reqwest::Method::OPTIONS, format!("{base}/api/report"))
        .header("origin", "http://example.com")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn test_concurrent_submissions() {
    let (base, _temp) = spawn_server().await;
    let client = reqwest::Client::new();

    let mut handles = Vec::new();
    for i in 0..12 {
        let client = client.clone();
        let base = base.clone();
        handles.push(tokio::spawn(async move {
            let form = Form::new().text("description", format!("concurrent {i}"));
            let (status, body) = submit(&client, &base, form).await;
            assert_eq!(status, StatusCode::OK);
            body["report"]["id"].as_str().unwrap().to_string()
        }));
    }

    let mut ids = HashSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap());
    }
    assert_eq!(ids.len(), 12);

    let listed: Value = client
        .get(format!("{base}/api/reports"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed["reports"].as_array().unwrap().len(), 12);
}
