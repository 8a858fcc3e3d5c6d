//! HTTP wire contract over a real loopback listener: payload shapes,
//! status codes, and the health probe.

use std::sync::Arc;

use shinbun_core::{FetchError, ReleaseSource};
use shinbun_web::{AppState, app_router};

use crate::support::{StubSource, aggregator, raw};

/// Serves the router for the given sources on an ephemeral port and
/// returns the base URL.
async fn serve(sources: Vec<Arc<dyn ReleaseSource>>) -> String {
    let state = AppState {
        aggregator: Arc::new(aggregator(sources)),
    };
    let router = app_router(state, &["http://localhost:5173".to_string()]);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn success_payload_is_an_array_of_six_string_fields() {
    let base = serve(vec![Arc::new(StubSource::ok(
        "a",
        vec![raw(
            "Show X - Ep 1",
            "magnet:?xt=urn:btih:abc",
            "2025-10-25 10:00",
        )],
    ))])
    .await;

    let response = reqwest::get(format!("{base}/api/releases")).await.unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    let entries = body.as_array().expect("success payload must be an array");
    assert_eq!(entries.len(), 1);

    let entry = entries[0].as_object().unwrap();
    let mut fields: Vec<_> = entry.keys().map(String::as_str).collect();
    fields.sort_unstable();
    assert_eq!(
        fields,
        vec!["date", "quality", "size", "source", "title", "url"]
    );
    assert!(entry.values().all(serde_json::Value::is_string));
    assert_eq!(entry["source"], "a");
}

#[tokio::test]
async fn empty_snapshot_serves_the_error_object_with_status_200() {
    let base = serve(vec![
        Arc::new(StubSource::failing("a", FetchError::Timeout)),
        Arc::new(StubSource::failing(
            "b",
            FetchError::Blocked {
                reason: "captcha".to_string(),
            },
        )),
    ])
    .await;

    let response = reqwest::get(format!("{base}/api/releases")).await.unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body,
        serde_json::json!({ "error": "No new anime releases today." })
    );
}

#[tokio::test]
async fn health_probe_answers_ok() {
    let base = serve(vec![]).await;

    let response = reqwest::get(format!("{base}/api/health")).await.unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "status": "ok" }));
}

#[tokio::test]
async fn wire_dates_carry_an_explicit_utc_offset() {
    let base = serve(vec![Arc::new(StubSource::ok(
        "a",
        vec![raw(
            "Show X - Ep 1",
            "https://a/release/1",
            "2025-10-25 18:30",
        )],
    ))])
    .await;

    let body: serde_json::Value = reqwest::get(format!("{base}/api/releases"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let date = body[0]["date"].as_str().unwrap();
    assert_eq!(date, "2025-10-25T18:30:00+00:00");
}
