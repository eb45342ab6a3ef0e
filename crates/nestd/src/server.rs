//! HTTP API for uploads, downloads, and file listings.
//!
//! Routes:
//!
//! - `POST /api/upload` — multipart upload (`file`, `tenant`, optional
//!   `path`), responds with a manifest summary.
//! - `GET /api/files/{file_id}?tenant=...` — reconstruct and return the
//!   file bytes.
//! - `GET /api/files/{file_id}/info?tenant=...` — manifest metadata.
//! - `GET /api/tenants/{tenant}/files` — list a tenant's files.
//!
//! A file is only served to the tenant recorded in its manifest; a
//! mismatch looks exactly like a missing file (404).

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use nest_engine::{PipelineError, Reconstructor, UploadPipeline};
use nest_meta::ManifestRepository;
use nest_types::{FileId, FileManifest};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Shared application state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<UploadPipeline>,
    reconstructor: Arc<Reconstructor>,
    repo: Arc<dyn ManifestRepository>,
}

impl AppState {
    pub fn new(
        pipeline: Arc<UploadPipeline>,
        reconstructor: Arc<Reconstructor>,
        repo: Arc<dyn ManifestRepository>,
    ) -> Self {
        Self {
            pipeline,
            reconstructor,
            repo,
        }
    }
}

/// Errors returned by API handlers, mapped to stable status codes.
#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error("file not found")]
    NotFound,

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("metadata error: {0}")]
    Meta(#[from] nest_meta::MetaError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Pipeline(e) => match e {
                PipelineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                PipelineError::PathTraversalDenied => StatusCode::FORBIDDEN,
                PipelineError::QuotaExceeded { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                PipelineError::ChunkMissing(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Meta(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// Response body for a successful upload.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    file_id: FileId,
    name: String,
    size: u64,
    chunks: usize,
}

/// Manifest metadata as exposed over HTTP.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FileInfoResponse {
    file_id: FileId,
    tenant: String,
    name: String,
    path: String,
    size: u64,
    chunks: usize,
    created_at: u64,
}

impl From<&FileManifest> for FileInfoResponse {
    fn from(m: &FileManifest) -> Self {
        Self {
            file_id: m.file_id,
            tenant: m.tenant_id.clone(),
            name: m.display_name.clone(),
            path: m.logical_path.clone(),
            size: m.total_size,
            chunks: m.chunk_count(),
            created_at: m.created_at,
        }
    }
}

#[derive(Deserialize)]
struct TenantQuery {
    tenant: String,
}

/// Build the axum [`Router`] for the API.
pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/upload", post(upload))
        .route("/api/files/{file_id}", get(download))
        .route("/api/files/{file_id}/info", get(file_info))
        .route("/api/tenants/{tenant}/files", get(list_files))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

/// Serve the API with graceful shutdown triggered by the given future.
pub async fn serve_with_shutdown(
    router: Router,
    addr: &str,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr, "HTTP API listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}

// -----------------------------------------------------------------------
// Handlers
// -----------------------------------------------------------------------

async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut tenant = None;
    let mut path = None;
    let mut file_name = None;
    let mut data = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        match field.name() {
            Some("tenant") => {
                tenant = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(e.to_string()))?,
                );
            }
            Some("path") => {
                path = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(e.to_string()))?,
                );
            }
            Some("file") => {
                file_name = field.file_name().map(str::to_string);
                data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::BadRequest(e.to_string()))?,
                );
            }
            _ => {}
        }
    }

    let tenant = tenant.ok_or_else(|| ApiError::BadRequest("missing tenant field".into()))?;
    let data = data.ok_or_else(|| ApiError::BadRequest("missing file field".into()))?;
    let name =
        file_name.ok_or_else(|| ApiError::BadRequest("file field needs a filename".into()))?;
    let path = path.unwrap_or_else(|| "/".to_string());

    let manifest = state.pipeline.ingest(&tenant, &name, &path, &data).await?;

    Ok(Json(UploadResponse {
        file_id: manifest.file_id,
        name: manifest.display_name,
        size: manifest.total_size,
        chunks: manifest.chunks.len(),
    }))
}

async fn download(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
    Query(query): Query<TenantQuery>,
) -> Result<Response, ApiError> {
    let manifest = lookup(&state, &file_id, &query.tenant)?;
    let bytes = state.reconstructor.reconstruct(&manifest).await?;

    let disposition = format!("attachment; filename=\"{}\"", manifest.display_name);
    Ok(Response::builder()
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(Body::from(bytes))
        .map_err(|e| ApiError::BadRequest(e.to_string()))?)
}

async fn file_info(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
    Query(query): Query<TenantQuery>,
) -> Result<Json<FileInfoResponse>, ApiError> {
    let manifest = lookup(&state, &file_id, &query.tenant)?;
    Ok(Json(FileInfoResponse::from(&manifest)))
}

async fn list_files(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
) -> Result<Json<Vec<FileInfoResponse>>, ApiError> {
    let manifests = state.repo.list_by_tenant(&tenant)?;
    Ok(Json(manifests.iter().map(FileInfoResponse::from).collect()))
}

/// Find a manifest by id, visible only to its owning tenant.
fn lookup(state: &AppState, file_id: &str, tenant: &str) -> Result<FileManifest, ApiError> {
    let id = FileId::parse(file_id)
        .ok_or_else(|| ApiError::BadRequest("invalid file id".into()))?;
    state
        .repo
        .find_by_id(&id)?
        .filter(|m| m.tenant_id == tenant)
        .ok_or(ApiError::NotFound)
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use axum::http::Request;
    use http_body_util::BodyExt;
    use nest_engine::StoreBackend;
    use nest_meta::MemoryManifestRepository;
    use nest_tenant::{IsolationMode, NoopPermissions, QuotaTracker, TenantContainer};
    use tower::ServiceExt;

    fn test_router(quota_bytes: Option<u64>) -> Router {
        let container = Arc::new(TenantContainer::new(
            "/unused",
            IsolationMode::Isolated,
            Box::new(NoopPermissions),
        ));
        let repo = Arc::new(MemoryManifestRepository::new());
        let backend = StoreBackend::memory();

        let mut pipeline = UploadPipeline::new(container.clone(), repo.clone(), backend.clone());
        if let Some(limit) = quota_bytes {
            pipeline = pipeline.with_quota(Arc::new(QuotaTracker::new(limit)));
        }
        let reconstructor = Reconstructor::new(container, backend);

        let state = AppState::new(Arc::new(pipeline), Arc::new(reconstructor), repo);
        build_router(state, 64 * 1024 * 1024)
    }

    const BOUNDARY: &str = "nestd-test-boundary";

    /// Build a multipart/form-data body with optional tenant and file parts.
    fn multipart_body(tenant: Option<&str>, filename: &str, content: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        if let Some(tenant) = tenant {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"tenant\"\r\n\r\n{tenant}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(tenant: Option<&str>, filename: &str, content: &[u8]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(tenant, filename, content)))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_upload_returns_manifest_summary() {
        let router = test_router(None);
        let response = router
            .oneshot(upload_request(Some("alice"), "hello.txt", b"hello world"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert!(json["fileId"].is_string());
        assert_eq!(json["name"], "hello.txt");
        assert_eq!(json["size"], 11);
        assert_eq!(json["chunks"], 1);
    }

    #[tokio::test]
    async fn test_upload_then_download_roundtrip() {
        let router = test_router(None);
        let content = b"roundtrip through the http layer".repeat(100);

        let response = router
            .clone()
            .oneshot(upload_request(Some("alice"), "data.bin", &content))
            .await
            .unwrap();
        let file_id = json_body(response).await["fileId"]
            .as_str()
            .unwrap()
            .to_string();

        let response = router
            .oneshot(
                Request::builder()
                    .uri(format!("/api/files/{file_id}?tenant=alice"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(bytes.as_ref(), content.as_slice());
    }

    #[tokio::test]
    async fn test_upload_without_tenant_is_400() {
        let router = test_router(None);
        let response = router
            .oneshot(upload_request(None, "hello.txt", b"data"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_download_unknown_id_is_404() {
        let router = test_router(None);
        let id = FileId::new();
        let response = router
            .oneshot(
                Request::builder()
                    .uri(format!("/api/files/{id}?tenant=alice"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_download_with_wrong_tenant_is_404() {
        let router = test_router(None);
        let response = router
            .clone()
            .oneshot(upload_request(Some("alice"), "secret.txt", b"for alice only"))
            .await
            .unwrap();
        let file_id = json_body(response).await["fileId"]
            .as_str()
            .unwrap()
            .to_string();

        let response = router
            .oneshot(
                Request::builder()
                    .uri(format!("/api/files/{file_id}?tenant=bob"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_file_id_is_400() {
        let router = test_router(None);
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/files/not-a-uuid?tenant=alice")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_file_info_returns_metadata() {
        let router = test_router(None);
        let response = router
            .clone()
            .oneshot(upload_request(Some("alice"), "info.bin", &[7u8; 5000]))
            .await
            .unwrap();
        let file_id = json_body(response).await["fileId"]
            .as_str()
            .unwrap()
            .to_string();

        let response = router
            .oneshot(
                Request::builder()
                    .uri(format!("/api/files/{file_id}/info?tenant=alice"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["tenant"], "alice");
        assert_eq!(json["name"], "info.bin");
        assert_eq!(json["size"], 5000);
        assert_eq!(json["path"], "/");
    }

    #[tokio::test]
    async fn test_list_files_for_tenant() {
        let router = test_router(None);
        for name in ["one.txt", "two.txt"] {
            router
                .clone()
                .oneshot(upload_request(Some("alice"), name, b"content"))
                .await
                .unwrap();
        }
        router
            .clone()
            .oneshot(upload_request(Some("bob"), "other.txt", b"content"))
            .await
            .unwrap();

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/tenants/alice/files")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        let files = json.as_array().unwrap();
        assert_eq!(files.len(), 2);
        for file in files {
            assert_eq!(file["tenant"], "alice");
        }
    }

    #[tokio::test]
    async fn test_quota_exceeded_is_413() {
        let router = test_router(Some(100));
        let response = router
            .oneshot(upload_request(Some("alice"), "big.bin", &[0u8; 500]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
