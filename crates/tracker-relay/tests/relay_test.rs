//! End-to-end relay tests: a spawned relay in front of a wiremock backend.

use std::net::SocketAddr;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tracker_core::{defaults, BackendOrigin, BackendSource};
use tracker_relay::{router, AppState, RelayConfig};

async fn spawn_relay(config: RelayConfig) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(AppState::new(config).unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    addr
}

fn configured(url: &str) -> RelayConfig {
    RelayConfig::new(BackendOrigin {
        url: url.to_string(),
        source: BackendSource::Env("RELAY_BACKEND_URL"),
    })
}

#[tokio::test]
async fn test_passthrough_status_body_and_content_type() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/papers"))
        .and(query_param("tag", "3DGS"))
        .and(query_param("days", "15"))
        .respond_with(
            ResponseTemplate::new(418)
                .set_body_raw("short and stout", "text/plain; charset=utf-8"),
        )
        .expect(1)
        .mount(&upstream)
        .await;

    let relay = spawn_relay(configured(&upstream.uri())).await;
    let response = reqwest::get(format!("http://{}/api/proxy/api/papers?tag=3DGS&days=15", relay))
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 418);
    assert_eq!(
        response.headers()["content-type"],
        "text/plain; charset=utf-8"
    );
    assert_eq!(response.text().await.unwrap(), "short and stout");
}

#[tokio::test]
async fn test_binary_bodies_pass_through_unchanged() {
    // Invalid UTF-8 in both directions.
    let upstream_bytes: Vec<u8> = vec![0x00, 0xff, 0xfe, 0x80, 0x0a, 0xc3, 0x28, 0x00];
    let inbound_bytes: Vec<u8> = vec![0xde, 0xad, 0xbe, 0xef, 0xff, 0x00];

    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/export"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(upstream_bytes.clone(), "application/octet-stream"),
        )
        .expect(1)
        .mount(&upstream)
        .await;

    let relay = spawn_relay(configured(&upstream.uri())).await;
    let response = reqwest::Client::new()
        .post(format!("http://{}/api/proxy/api/export", relay))
        .header("content-type", "application/octet-stream")
        .body(inbound_bytes.clone())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response.headers()["content-type"],
        "application/octet-stream"
    );
    assert_eq!(response.bytes().await.unwrap().as_ref(), upstream_bytes.as_slice());

    let received = upstream.received_requests().await.unwrap();
    assert_eq!(received[0].body, inbound_bytes);
}

#[tokio::test]
async fn test_browser_headers_are_not_forwarded() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&upstream)
        .await;

    let relay = spawn_relay(configured(&upstream.uri())).await;
    let response = reqwest::Client::new()
        .get(format!("http://{}/api/proxy/api/posts?source=reddit", relay))
        .header("cookie", "session=secret")
        .header("authorization", "Bearer token")
        .header("x-custom", "1")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let received = upstream.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let forwarded = &received[0];
    assert_eq!(forwarded.headers["accept"], "application/json");
    assert!(!forwarded.headers.contains_key("cookie"));
    assert!(!forwarded.headers.contains_key("authorization"));
    assert!(!forwarded.headers.contains_key("x-custom"));
    assert!(!forwarded.headers.contains_key("content-type"));
    assert_eq!(forwarded.url.query(), Some("source=reddit"));
}

#[tokio::test]
async fn test_post_forwards_body_and_content_type() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/subscriptions"))
        .and(header("content-type", "application/json"))
        .and(body_string(r#"{"type":"author","value":"Kerbl"}"#))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 9})))
        .expect(1)
        .mount(&upstream)
        .await;

    let relay = spawn_relay(configured(&upstream.uri())).await;
    let response = reqwest::Client::new()
        .post(format!("http://{}/api/proxy/api/subscriptions", relay))
        .header("content-type", "application/json")
        .body(r#"{"type":"author","value":"Kerbl"}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["id"], 9);
}

#[tokio::test]
async fn test_patch_and_delete_are_relayed() {
    let upstream = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/notifications/5/read"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&upstream)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/s2-queries/3"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&upstream)
        .await;

    let relay = spawn_relay(configured(&upstream.uri())).await;
    let client = reqwest::Client::new();
    let patched = client
        .patch(format!("http://{}/api/proxy/api/notifications/5/read", relay))
        .send()
        .await
        .unwrap();
    assert_eq!(patched.status().as_u16(), 200);

    let deleted = client
        .delete(format!("http://{}/api/proxy/api/s2-queries/3", relay))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 204);
}

#[tokio::test]
async fn test_missing_upstream_content_type_defaults_to_json() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"{\"status\":\"ok\"}".to_vec()))
        .mount(&upstream)
        .await;

    let relay = spawn_relay(configured(&upstream.uri())).await;
    let response = reqwest::get(format!("http://{}/api/proxy/api/health", relay))
        .await
        .unwrap();

    assert_eq!(response.headers()["content-type"], defaults::RELAY_CONTENT_TYPE);
    assert_eq!(response.text().await.unwrap(), "{\"status\":\"ok\"}");
}

#[tokio::test]
async fn test_empty_suffix_targets_backend_root() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"root": true})))
        .expect(1)
        .mount(&upstream)
        .await;

    let relay = spawn_relay(configured(&upstream.uri())).await;
    let response = reqwest::get(format!("http://{}/api/proxy", relay))
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn test_upstream_timeout_is_bad_gateway() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "ok"}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&upstream)
        .await;

    let config = configured(&upstream.uri()).with_timeout(Duration::from_millis(200));
    let relay = spawn_relay(config).await;
    let response = reqwest::Client::new()
        .post(format!("http://{}/api/proxy/api/refresh?days=15", relay))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 502);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Proxy failed");
    assert!(!body["detail"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_unreachable_configured_backend_hint() {
    let relay = spawn_relay(configured("http://127.0.0.1:1")).await;
    let response = reqwest::get(format!("http://{}/api/proxy/api/papers", relay))
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 502);
    assert_eq!(response.headers()["content-type"], "application/json");
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Proxy failed");
    assert!(body["hint"]
        .as_str()
        .unwrap()
        .contains("configured but unreachable"));
    assert!(body["hint"].as_str().unwrap().contains("http://127.0.0.1:1"));
}

#[tokio::test]
async fn test_unreachable_default_backend_hint() {
    let config = RelayConfig::new(BackendOrigin {
        url: "http://127.0.0.1:1".to_string(),
        source: BackendSource::Default,
    });
    let relay = spawn_relay(config).await;
    let response = reqwest::get(format!("http://{}/api/proxy/api/papers", relay))
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 502);
    let body: serde_json::Value = response.json().await.unwrap();
    let hint = body["hint"].as_str().unwrap();
    assert!(hint.contains("local default"));
    assert!(hint.contains("RELAY_BACKEND_URL"));
}

#[tokio::test]
async fn test_health_and_request_id() {
    let relay = spawn_relay(configured("http://backend.invalid")).await;
    let response = reqwest::get(format!("http://{}/health", relay))
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert!(response.headers().contains_key("x-request-id"));
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["backend"], "http://backend.invalid");
}
