//! HTTP API integration tests
//!
//! Exercises the router directly with `tower::ServiceExt::oneshot`; no
//! sockets involved.

mod helpers;

use axum::http::StatusCode;
use axum::Router;
use helpers::{test_track, TestRig};
use serde_json::{json, Value};

/// Helper function to make HTTP requests against the router
async fn make_request(
    app: &Router,
    method: &str,
    path: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    use axum::body::Body;
    use http::{Method, Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    let method = match method {
        "GET" => Method::GET,
        "POST" => Method::POST,
        "DELETE" => Method::DELETE,
        _ => panic!("Unsupported method"),
    };

    let builder = Request::builder().method(method).uri(path);
    let request = match body {
        Some(json_body) => builder
            .header("content-type", "application/json")
            .body(Body::from(json_body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

fn track_json(title: &str) -> Value {
    serde_json::to_value(test_track(title)).unwrap()
}

#[tokio::test]
async fn health_reports_module_info() {
    let rig = TestRig::start();
    let app = rig.router().await;

    let (status, body) = make_request(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "juke");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn enqueue_reports_position_and_start() {
    let rig = TestRig::start();
    let app = rig.router().await;

    let (status, body) = make_request(&app, "POST", "/queue", Some(track_json("a"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["position"], 1);
    assert_eq!(body["started"], true);

    let (_, body) = make_request(&app, "POST", "/queue", Some(track_json("b"))).await;
    assert_eq!(body["position"], 1);
    assert_eq!(body["started"], false);

    let (status, body) = make_request(&app, "GET", "/queue", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["queue"][0]["title"], "b");

    let (status, body) = make_request(&app, "GET", "/current", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["track"]["title"], "a");
}

#[tokio::test]
async fn queue_listing_honors_limit() {
    let rig = TestRig::start();
    let app = rig.router().await;

    for title in ["a", "b", "c", "d"] {
        make_request(&app, "POST", "/queue", Some(track_json(title))).await;
    }

    let (status, body) = make_request(&app, "GET", "/queue?limit=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    assert_eq!(body["queue"].as_array().unwrap().len(), 2);
    assert_eq!(body["queue"][0]["title"], "b");
}

#[tokio::test]
async fn skip_reports_started_or_empty() {
    let rig = TestRig::start();
    let app = rig.router().await;

    make_request(&app, "POST", "/queue", Some(track_json("a"))).await;
    make_request(&app, "POST", "/queue", Some(track_json("b"))).await;

    let (status, body) = make_request(&app, "POST", "/queue/next", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "started");
    assert_eq!(body["track"]["title"], "b");

    let (status, body) = make_request(&app, "POST", "/queue/next", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "empty");
    assert!(body.get("track").is_none());
}

#[tokio::test]
async fn queue_entries_can_be_removed_and_cleared() {
    let rig = TestRig::start();
    let app = rig.router().await;

    for title in ["a", "b", "c"] {
        make_request(&app, "POST", "/queue", Some(track_json(title))).await;
    }

    let (status, _) = make_request(&app, "DELETE", "/queue/0", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, body) = make_request(&app, "GET", "/queue", None).await;
    assert_eq!(body["queue"][0]["title"], "c");

    let (status, body) = make_request(&app, "DELETE", "/queue/9", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["status"].as_str().unwrap().starts_with("error:"));

    let (status, _) = make_request(&app, "DELETE", "/queue", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, body) = make_request(&app, "GET", "/queue", None).await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn stop_maps_engine_failure_to_bad_gateway() {
    let rig = TestRig::start();
    let app = rig.router().await;
    make_request(&app, "POST", "/queue", Some(track_json("a"))).await;

    let (status, body) = make_request(&app, "POST", "/stop", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    rig.engine.set_unreachable(true);
    let (status, body) = make_request(&app, "POST", "/stop", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["status"].as_str().unwrap().starts_with("error:"));
}

#[tokio::test]
async fn enqueue_maps_engine_failure_to_bad_gateway() {
    let rig = TestRig::start();
    let app = rig.router().await;
    rig.engine.set_unreachable(true);

    let (status, body) = make_request(&app, "POST", "/queue", Some(track_json("a"))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["status"].as_str().unwrap().starts_with("error:"));
}

#[tokio::test]
async fn player_status_is_null_when_engine_is_dark() {
    let rig = TestRig::start();
    let app = rig.router().await;

    let (status, body) = make_request(&app, "GET", "/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], Value::Null);

    make_request(&app, "POST", "/queue", Some(track_json("a"))).await;
    let (_, body) = make_request(&app, "GET", "/status", None).await;
    assert_eq!(body["status"]["playing"], true);
    assert!(body["status"]["activeToken"].is_string());
}

#[tokio::test]
async fn summary_reflects_current_and_next() {
    let rig = TestRig::start();
    let app = rig.router().await;

    make_request(&app, "POST", "/queue", Some(track_json("a"))).await;
    make_request(&app, "POST", "/queue", Some(track_json("b"))).await;

    let (status, body) = make_request(&app, "GET", "/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current"]["track"]["title"], "a");
    assert_eq!(body["queue_length"], 1);
    assert_eq!(body["next"]["title"], "b");
}

#[tokio::test]
async fn history_lists_newest_first() {
    let rig = TestRig::start();
    let app = rig.router().await;

    make_request(&app, "POST", "/queue", Some(track_json("a"))).await;
    make_request(&app, "POST", "/queue", Some(track_json("b"))).await;
    rig.engine.complete().await;
    rig.orchestrator.poll_advance().await.unwrap();

    let (status, body) = make_request(&app, "GET", "/history", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["history"][0]["title"], "b");
    assert_eq!(body["history"][1]["title"], "a");

    let (_, body) = make_request(&app, "GET", "/history?limit=1", None).await;
    assert_eq!(body["history"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn channel_memo_follows_requests() {
    let rig = TestRig::start();
    let app = rig.router().await;

    let (status, body) = make_request(&app, "GET", "/channel", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["channel"], Value::Null);

    make_request(&app, "POST", "/queue", Some(track_json("a"))).await;
    let (_, body) = make_request(&app, "GET", "/channel", None).await;
    assert_eq!(body["channel"], "#listening-room");
}

#[tokio::test]
async fn attachment_cache_gate_round_trip() {
    let rig = TestRig::start();
    let app = rig.router().await;

    let (status, body) =
        make_request(&app, "GET", "/cache/attachments/netease/song-1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "miss");

    let (status, _) = make_request(
        &app,
        "POST",
        "/cache/attachments",
        Some(json!({
            "source_type": "netease",
            "source_id": "song-1",
            "source_url": "http://img.example.com/cover.jpg",
            "attachment": {"file_id": "abc123"},
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) =
        make_request(&app, "GET", "/cache/attachments/netease/song-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["attachment"]["file_id"], "abc123");
    assert_eq!(body["use_count"], 2);

    // Re-posting the same key keeps the first payload.
    let (status, _) = make_request(
        &app,
        "POST",
        "/cache/attachments",
        Some(json!({
            "source_type": "netease",
            "source_id": "song-1",
            "attachment": {"file_id": "other"},
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = make_request(&app, "GET", "/cache/attachments/netease/song-1", None).await;
    assert_eq!(body["attachment"]["file_id"], "abc123");
}
