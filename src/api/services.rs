use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::collections::BTreeMap;
use tracing::{info, warn};

use super::{
    models::{
        Base64UploadRequest, BatchResponse, ConvertLinkRequest, FileResult, HealthResponse,
        HostView, MetricsResponse, UpdatedResponse,
    },
    state::AppState,
    utils::{ensure_image_type, read_json, validate_body_size},
    validation::{
        RequestValidationError, validate_base64_request, validate_convert_request,
        validate_file_count,
    },
};
use crate::api::error::ApiError;
use crate::hosts::{HostPatch, NewHost};
use crate::humanize::ByteSize;
use crate::upload::{ImagePayload, UploadOutcome};

const SINGLE_FIELD: &str = "file";
const BATCH_FIELD: &str = "files";
const DEFAULT_FILENAME: &str = "image";

impl From<RequestValidationError> for ApiError {
    fn from(value: RequestValidationError) -> Self {
        ApiError::InvalidPayload(value.to_string())
    }
}

fn map_multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::InvalidPayload(err.body_text())
    }
}

/// 200 for a hosted image, 502 when every host failed
fn outcome_status(success: bool) -> StatusCode {
    if success {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    }
}

/// Read every part named `field` as an image, at most `limit` of them
async fn collect_images(
    multipart: &mut Multipart,
    field: &str,
    limit: usize,
    max_size: ByteSize,
) -> Result<Vec<ImagePayload>, ApiError> {
    let mut images = Vec::new();

    while let Some(part) = multipart.next_field().await.map_err(map_multipart_error)? {
        if part.name() != Some(field) {
            continue;
        }
        if images.len() == limit {
            return Err(RequestValidationError::TooManyFiles {
                actual: images.len() + 1,
                limit,
            }
            .into());
        }

        let media_type = ensure_image_type(part.content_type())?;
        let filename = part
            .file_name()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_FILENAME)
            .to_string();
        let bytes = part.bytes().await.map_err(map_multipart_error)?;
        validate_body_size(&bytes, max_size)?;

        images.push(ImagePayload::new(bytes, filename, media_type.essence_str()));
    }

    Ok(images)
}

/// Single file upload (POST /upload/single)
///
/// Expects one multipart part named `file` with an `image/*` type. The file
/// goes through the failover chain; a failed chain answers 502 with the
/// per-host errors.
pub async fn upload_single(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut images =
        collect_images(&mut multipart, SINGLE_FIELD, 1, state.service.max_upload()).await?;
    validate_file_count(images.len(), 1)?;
    let image = images.remove(0);

    let filename = image.filename.clone();
    let size = image.len();
    let outcome = state.service.upload_single(image).await?;
    if outcome.success {
        info!(filename = %filename, size, "Single upload succeeded");
    }

    let result = FileResult {
        filename: Some(filename),
        size: Some(size),
        outcome,
    };
    Ok((outcome_status(result.outcome.success), Json(result)).into_response())
}

/// Multi-file upload (POST /upload/multiple)
///
/// Files are uploaded one after another; each gets its own result. Answers
/// 200 when at least one file was hosted.
pub async fn upload_multiple(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let limit = state.config.server.max_batch_files;
    let images =
        collect_images(&mut multipart, BATCH_FIELD, limit, state.service.max_upload()).await?;
    validate_file_count(images.len(), limit)?;

    let meta: Vec<_> = images.iter().map(|i| (i.filename.clone(), i.len())).collect();
    let outcomes = state.service.upload_batch(images).await;

    let results = meta
        .into_iter()
        .zip(outcomes)
        .map(|((filename, size), outcome)| FileResult {
            filename: Some(filename),
            size: Some(size),
            outcome,
        })
        .collect();
    Ok(batch_response(BatchResponse::new(results)))
}

/// Base64 data URL upload (POST /upload/base64)
pub async fn upload_base64(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Body,
) -> Result<Response, ApiError> {
    let request: Base64UploadRequest =
        read_json(&headers, body, state.config.server.max_request_bytes).await?;
    validate_base64_request(&request, state.config.server.max_batch_files)?;

    let mut results = Vec::with_capacity(request.images.len());
    for (index, data_url) in request.images.iter().enumerate() {
        let outcome = match state.service.upload_from_base64(data_url).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(index, error = %e, "Base64 image rejected");
                UploadOutcome::failed(e.to_string(), Vec::new())
            }
        };
        results.push(FileResult {
            filename: None,
            size: None,
            outcome,
        });
    }
    Ok(batch_response(BatchResponse::new(results)))
}

fn batch_response(batch: BatchResponse) -> Response {
    let status = outcome_status(batch.succeeded > 0);
    (status, Json(batch)).into_response()
}

/// Re-host an image referenced by URL (POST /upload/convert-link)
pub async fn convert_link(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Body,
) -> Result<Response, ApiError> {
    let request: ConvertLinkRequest =
        read_json(&headers, body, state.config.server.max_request_bytes).await?;
    validate_convert_request(&request)?;

    let outcome = state.service.upload_from_remote_url(&request.url).await?;
    Ok((outcome_status(outcome.success), Json(outcome)).into_response())
}

/// GET /upload/image-hosts
pub async fn list_hosts(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let hosts: Vec<HostView> = state
        .registry
        .list_all()?
        .into_iter()
        .map(HostView::from)
        .collect();
    Ok(Json(hosts))
}

/// POST /upload/image-hosts
pub async fn create_host(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Body,
) -> Result<impl IntoResponse, ApiError> {
    let host: NewHost = read_json(&headers, body, state.config.server.max_request_bytes).await?;
    let stored = state.registry.add_definition(host)?;
    Ok((StatusCode::CREATED, Json(HostView::from(stored))))
}

/// PUT /upload/image-hosts/{id}
pub async fn update_host(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    body: axum::body::Body,
) -> Result<impl IntoResponse, ApiError> {
    let patch: HostPatch = read_json(&headers, body, state.config.server.max_request_bytes).await?;
    if !state.registry.update_definition(id, patch)? {
        return Err(ApiError::NotFound(format!("image host {id}")));
    }
    Ok(Json(UpdatedResponse { id, updated: true }))
}

/// DELETE /upload/image-hosts/{id}
pub async fn delete_host(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    if !state.registry.remove_definition(id)? {
        return Err(ApiError::NotFound(format!("image host {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /upload/image-hosts/{id}/test
pub async fn test_host(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Response, ApiError> {
    let outcome = state.service.test_host(id).await?;
    Ok((outcome_status(outcome.success), Json(outcome)).into_response())
}

/// Health check endpoint (GET /health)
///
/// Reports the API itself and whether the host store answers. Returns 503
/// when any component is unhealthy.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let mut components = BTreeMap::new();
    components.insert("api".to_string(), "healthy".to_string());

    let store_status = match state.registry.list_all() {
        Ok(_) => "healthy".to_string(),
        Err(e) => {
            warn!(error = %e, "Host store health check failed");
            "unhealthy".to_string()
        }
    };
    components.insert("host_store".to_string(), store_status);

    let all_healthy = components.values().all(|status| status == "healthy");
    let (status_code, overall) = if all_healthy {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    let response = HealthResponse {
        status: overall.to_string(),
        components,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    (status_code, Json(response))
}

/// Upload counters plus host counts (GET /operators/metrics)
pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let hosts = state.registry.list_all()?;
    let response = MetricsResponse {
        counters: state.metrics.snapshot(),
        hosts_enabled: hosts.iter().filter(|h| h.is_enabled).count(),
        hosts_total: hosts.len(),
    };
    Ok(Json(response))
}
