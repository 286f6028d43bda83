//! Failover against real HTTP: a local axum app plays several image hosts

use axum::{
    Json, Router,
    extract::Multipart,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use imgrelay::api::AppState;
use imgrelay::config::{ByteSize, Config};
use imgrelay::hosts::{HostPatch, NewHost};
use imgrelay::ingest::FetchError;
use imgrelay::store::{FjallHostStore, HostStore, MemoryHostStore};
use imgrelay::upload::{
    ImagePayload, ReqwestTransport, TransportConfig, UploadError, UploadService,
};

const PNG_1X1: &[u8] = imgrelay::upload::TEST_IMAGE_PNG;

/// Start the fake provider app on a random port
async fn start_mock_hosts() -> String {
    let app = Router::new()
        .route("/down", post(|| async { StatusCode::SERVICE_UNAVAILABLE }))
        .route("/html", post(|| async { "<html>maintenance</html>" }))
        .route("/slow", post(slow_upload))
        .route("/refuses", post(refusing_upload))
        .route("/ok", post(accepting_upload))
        .route("/keyed", post(keyed_upload))
        .route("/strict", post(strict_upload))
        .route("/origin/pic.png", get(|| async { PNG_1X1 }))
        .route("/origin/huge.png", get(|| async { vec![0u8; 4 * 1024 * 1024] }))
        .route("/origin/missing.png", get(|| async { StatusCode::NOT_FOUND }));

    let addr = SocketAddr::from(([127, 0, 0, 1], 0));
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    let bound_addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{bound_addr}")
}

async fn slow_upload() -> impl IntoResponse {
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(json!({"data": {"url": "https://late.example.com/x.png"}}))
}

/// Answers 200 but flags the upload as failed in the body
async fn refusing_upload() -> impl IntoResponse {
    Json(json!({"code": 500, "msg": "quota exceeded"}))
}

/// Echoes the received field and filename in a signed, protocol-relative URL
async fn accepting_upload(mut multipart: Multipart) -> impl IntoResponse {
    let Ok(Some(field)) = multipart.next_field().await else {
        return (StatusCode::BAD_REQUEST, Json(json!({"code": 400})));
    };
    let name = field.name().unwrap_or_default().to_string();
    let filename = field.file_name().unwrap_or_default().to_string();
    let size = field.bytes().await.map(|b| b.len()).unwrap_or_default();

    (
        StatusCode::OK,
        Json(json!({
            "code": 1000,
            "data": {"file": format!("//cdn.local/{name}/{size}/{filename}?sig=abc")}
        })),
    )
}

/// Accepts only a well-formed `file` part named "holiday photo.png"
async fn strict_upload(headers: HeaderMap, mut multipart: Multipart) -> impl IntoResponse {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !content_type.starts_with("multipart/form-data; boundary=") {
        return (StatusCode::UNSUPPORTED_MEDIA_TYPE, Json(json!({"code": 415})));
    }

    let Ok(Some(field)) = multipart.next_field().await else {
        return (StatusCode::BAD_REQUEST, Json(json!({"code": 400})));
    };
    let well_formed = field.name() == Some("file")
        && field.file_name() == Some("holiday photo.png")
        && field.content_type() == Some("image/png");
    let bytes = field.bytes().await.unwrap_or_default();

    if well_formed && &bytes[..] == PNG_1X1 {
        (
            StatusCode::OK,
            Json(json!({"code": 1000, "data": {"file": "https://cdn.local/strict.png"}})),
        )
    } else {
        (StatusCode::OK, Json(json!({"code": 422})))
    }
}

async fn keyed_upload(headers: HeaderMap) -> impl IntoResponse {
    if headers.get("x-api-key").and_then(|v| v.to_str().ok()) != Some("k-123") {
        return (StatusCode::UNAUTHORIZED, Json(json!({"success": false})));
    }
    (
        StatusCode::OK,
        Json(json!({"success": true, "url": "https://keyed.example.com/i.png"})),
    )
}

fn provider(base: &str, name: &str, path: &str, priority: i32) -> NewHost {
    let mut host = NewHost::new(name, format!("{base}{path}"), "data.file");
    host.priority = priority;
    host.timeout_ms = 500;
    host.success_field = Some("code".to_string());
    host.success_value = Some("1000".to_string());
    host
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.hosts.seed_builtin = false;
    config
}

fn service_over(store: Arc<dyn HostStore>) -> (AppState, UploadService) {
    service_with(test_config(), store)
}

fn service_with(config: Config, store: Arc<dyn HostStore>) -> (AppState, UploadService) {
    let transport = Arc::new(ReqwestTransport::new(TransportConfig::default()).unwrap());
    let state = AppState::new(config, store, transport).unwrap();
    let service = state.service.clone();
    (state, service)
}

fn png() -> ImagePayload {
    ImagePayload::new(PNG_1X1, "pixel.png", "image/png")
}

#[tokio::test]
async fn test_failover_walks_past_every_failure_kind() {
    let base = start_mock_hosts().await;
    let (state, service) = service_over(Arc::new(MemoryHostStore::new()));

    state.registry.add_definition(provider(&base, "down", "/down", 50)).unwrap();
    state.registry.add_definition(provider(&base, "html", "/html", 40)).unwrap();
    state.registry.add_definition(provider(&base, "slow", "/slow", 30)).unwrap();
    state.registry.add_definition(provider(&base, "refuses", "/refuses", 20)).unwrap();
    let mut image_field = provider(&base, "ok", "/ok", 10);
    image_field.form_field = "image".to_string();
    state.registry.add_definition(image_field).unwrap();

    let outcome = service.upload_single(png()).await.unwrap();

    assert!(outcome.success, "{outcome:?}");
    assert_eq!(outcome.used_host_name.as_deref(), Some("ok"));
    assert_eq!(
        outcome.url.as_deref(),
        Some(format!("https://cdn.local/image/{}/pixel.png", PNG_1X1.len()).as_str())
    );

    let failed: Vec<_> = outcome.errors.iter().map(|e| e.host_name.as_str()).collect();
    assert_eq!(failed, ["down", "html", "slow", "refuses"]);
    assert!(outcome.errors[0].message.contains("503"));
    assert!(outcome.errors[1].message.contains("JSON"));
    assert!(outcome.errors[2].message.contains("timed out"));
    assert!(outcome.errors[3].message.contains("'500'"));
}

#[tokio::test]
async fn test_unreachable_host_then_success() {
    let base = start_mock_hosts().await;
    let (state, service) = service_over(Arc::new(MemoryHostStore::new()));

    let closed = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let dead = format!("http://{}", closed.local_addr().unwrap());
    drop(closed);

    state.registry.add_definition(provider(&dead, "dead", "/up", 9)).unwrap();
    state.registry.add_definition(provider(&base, "ok", "/ok", 1)).unwrap();

    let outcome = service.upload_single(png()).await.unwrap();
    assert!(outcome.success);
    assert!(outcome.errors[0].message.contains("connection failed"));
}

#[tokio::test]
async fn test_api_key_header_reaches_host() {
    let base = start_mock_hosts().await;
    let (state, service) = service_over(Arc::new(MemoryHostStore::new()));

    let mut keyed = NewHost::new("keyed", format!("{base}/keyed"), "url");
    keyed.requires_api_key = true;
    keyed.api_key = Some("k-123".to_string());
    keyed.success_field = Some("success".to_string());
    keyed.success_value = Some("true".to_string());
    let stored = state.registry.add_definition(keyed).unwrap();

    let outcome = service.test_host(stored.id).await.unwrap();
    assert!(outcome.success, "{outcome:?}");
    assert_eq!(outcome.url.as_deref(), Some("https://keyed.example.com/i.png"));

    let wrong_key = HostPatch {
        api_key: Some("nope".to_string()),
        ..Default::default()
    };
    state.registry.update_definition(stored.id, wrong_key).unwrap();
    let outcome = service.test_host(stored.id).await.unwrap();
    assert!(!outcome.success);
    assert!(outcome.errors[0].message.contains("401"));
}

#[tokio::test]
async fn test_convert_link_end_to_end() {
    let base = start_mock_hosts().await;
    let (state, service) = service_over(Arc::new(MemoryHostStore::new()));
    state.registry.add_definition(provider(&base, "ok", "/ok", 1)).unwrap();

    let outcome = service
        .upload_from_remote_url(&format!("{base}/origin/pic.png"))
        .await
        .unwrap();
    assert!(outcome.success);
    let url = outcome.url.unwrap();
    assert!(url.starts_with("https://cdn.local/file/"));
    assert!(url.ends_with(".png"));

    let missing = service
        .upload_from_remote_url(&format!("{base}/origin/missing.png"))
        .await;
    assert!(missing.is_err());
}

#[tokio::test]
async fn test_fjall_store_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("hosts");
    let base = start_mock_hosts().await;

    {
        let store = Arc::new(FjallHostStore::open(&path).unwrap());
        let (state, _) = service_over(store);
        state.registry.add_definition(provider(&base, "ok", "/ok", 1)).unwrap();
        state.registry.persist().unwrap();
    }

    let store = Arc::new(FjallHostStore::open(&path).unwrap());
    let (state, service) = service_over(store);
    let hosts = state.registry.list_candidates().unwrap();
    assert_eq!(hosts.len(), 1);
    assert_eq!(hosts[0].name, "ok");

    assert!(service.upload_single(png()).await.unwrap().success);
}

#[tokio::test]
async fn test_multipart_reaches_host_intact() {
    let base = start_mock_hosts().await;
    let (state, service) = service_over(Arc::new(MemoryHostStore::new()));
    state.registry.add_definition(provider(&base, "strict", "/strict", 1)).unwrap();

    let payload = ImagePayload::new(PNG_1X1, "holiday photo.png", "image/png");
    let outcome = service.upload_single(payload).await.unwrap();

    assert!(outcome.success, "{outcome:?}");
    assert_eq!(outcome.url.as_deref(), Some("https://cdn.local/strict.png"));
}

#[tokio::test]
async fn test_oversized_remote_image_is_refused() {
    let base = start_mock_hosts().await;
    let mut config = test_config();
    config.fetcher.max_bytes = ByteSize::kib(1);
    let (state, service) = service_with(config, Arc::new(MemoryHostStore::new()));
    state.registry.add_definition(provider(&base, "ok", "/ok", 1)).unwrap();

    let err = service
        .upload_from_remote_url(&format!("{base}/origin/huge.png"))
        .await
        .unwrap_err();

    assert!(
        matches!(
            err,
            UploadError::Fetch(FetchError::TooLarge {
                size: 4194304,
                limit: 1024
            })
        ),
        "got {err:?}"
    );
    assert_eq!(state.metrics.snapshot().remote_fetches, 0);
}
