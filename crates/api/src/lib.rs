//! Dual View Capture Server
//!
//! Hosts the capture screen (`/`) and the gallery (`/gallery`), plus a small
//! JSON API over the same state.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

pub mod settings;
mod device;
mod render;
mod routes;
pub mod screen;

pub use settings::AppConfig;
pub use screen::CaptureScreen;

use camera_capture::CameraDevice;
use gallery::GalleryReader;
use image_encoder::ImageEncoder;
use notifications::Notifier;
use storage::DocumentStore;
use upload::UploadClient;

/// Application state shared across handlers
pub struct AppState {
    /// Capture screen
    pub screen: CaptureScreen,
    /// Gallery reader
    pub gallery: GalleryReader,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
    /// Prometheus renderer, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Wire the screens to the shared store handle and mount the camera
    pub async fn build(
        config: &AppConfig,
        device: &dyn CameraDevice,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        let notifier = Arc::new(Notifier::new(config.notifications.clone()));
        let uploader = UploadClient::new(
            Arc::clone(&store),
            Arc::clone(&notifier),
            config.store.collection.clone(),
        );

        let screen = CaptureScreen::mount(
            device,
            &config.camera,
            ImageEncoder::new(config.encoder.clone()),
            config.workflow.retake,
            notifier,
            uploader,
        )
        .await;

        let gallery = GalleryReader::new(
            store,
            config.store.collection.clone(),
            config.gallery.error_policy,
        );

        Self {
            screen,
            gallery,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub camera_live: bool,
    pub uploading: bool,
}

/// Create the application router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(routes::capture::page))
        .route("/gallery", get(routes::gallery::page))
        .route("/preview.jpg", get(routes::capture::preview))
        .route("/views/:index/tap", post(routes::capture::tap_form))
        .route("/upload", post(routes::capture::upload_form))
        .route("/api/v1/session", get(routes::capture::session))
        .route("/api/v1/views/:index/tap", post(routes::capture::tap))
        .route("/api/v1/upload", post(routes::capture::upload))
        .route("/api/v1/records", get(routes::gallery::records))
        .route("/api/v1/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    let snapshot = state.screen.snapshot().await;
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        camera_live: snapshot.camera_live,
        uploading: snapshot.uploading,
    })
}

/// Prometheus scrape endpoint
async fn metrics_handler(State(state): State<SharedState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Initialize logging
pub fn init_logging(config: &settings::LoggingConfig) -> anyhow::Result<()> {
    let level = config.max_level()?;
    let builder = FmtSubscriber::builder().with_max_level(level).with_target(true);

    if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

/// Install the global metrics recorder
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    Ok(PrometheusBuilder::new().install_recorder()?)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

/// Run the server until Ctrl-C, then release the camera
pub async fn run_server(config: &AppConfig, state: SharedState) -> anyhow::Result<()> {
    let app = create_router(Arc::clone(&state));

    info!("Starting capture server on {}", config.server.addr);

    let listener = tokio::net::TcpListener::bind(&config.server.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.screen.release_camera();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use camera_capture::{CameraConfig, SyntheticCamera};
    use storage::{MemoryStore, DEFAULT_COLLECTION};
    use tower::ServiceExt;

    fn test_config() -> AppConfig {
        AppConfig {
            camera: CameraConfig {
                ideal_width: 64,
                ideal_height: 48,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    async fn app_with(camera: &SyntheticCamera, store: Arc<MemoryStore>) -> Router {
        let state = AppState::build(&test_config(), camera, store).await;
        create_router(Arc::new(state))
    }

    async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::USER_AGENT, "TestAgent/1.0")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    async fn send_json(app: &Router, method: &str, uri: &str) -> (StatusCode, serde_json::Value) {
        let (status, body) = send(app, method, uri).await;
        (status, serde_json::from_str(&body).unwrap())
    }

    #[tokio::test]
    async fn test_capture_page_renders() {
        let app = app_with(&SyntheticCamera::new(), Arc::new(MemoryStore::new())).await;
        let (status, html) = send(&app, "GET", "/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("View 1"));
        assert!(html.contains("View 2"));
        assert!(html.contains("<button type=\"submit\" disabled>Upload</button>"));
        assert!(html.contains("href=\"/gallery\""));
    }

    #[tokio::test]
    async fn test_full_capture_and_upload() {
        let store = Arc::new(MemoryStore::new());
        let app = app_with(&SyntheticCamera::new(), store.clone()).await;

        let (_, body) = send_json(&app, "POST", "/api/v1/views/0/tap").await;
        assert_eq!(body["action"], "selected");
        let (_, body) = send_json(&app, "POST", "/api/v1/views/0/tap").await;
        assert_eq!(body["action"], "capture");
        assert_eq!(body["screen"]["session"]["active_view"], 1);

        send_json(&app, "POST", "/api/v1/views/1/tap").await;
        let (_, body) = send_json(&app, "POST", "/api/v1/views/1/tap").await;
        assert_eq!(body["screen"]["upload_enabled"], true);

        let (status, body) = send_json(&app, "POST", "/api/v1/upload").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "uploaded");

        let (_, session) = send_json(&app, "GET", "/api/v1/session").await;
        assert_eq!(session["session"]["views"][0]["state"], "unclicked");
        assert_eq!(session["session"]["views"][1]["state"], "unclicked");
        assert_eq!(session["notification"]["message"], "Upload successful");

        let docs = store.list_records(DEFAULT_COLLECTION).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].data["deviceInfo"]["userAgent"], "TestAgent/1.0");
        assert_eq!(docs[0].data["imageCount"], 2);

        let (_, html) = send(&app, "GET", "/gallery").await;
        let session_id = docs[0].data["sessionId"].as_str().unwrap();
        assert!(html.contains(&format!("Session: {session_id}")));
    }

    #[tokio::test]
    async fn test_upload_with_one_view_is_no_op() {
        let store = Arc::new(MemoryStore::new());
        let app = app_with(&SyntheticCamera::new(), store.clone()).await;

        send(&app, "POST", "/api/v1/views/0/tap").await;
        send(&app, "POST", "/api/v1/views/0/tap").await;

        let (status, body) = send_json(&app, "POST", "/api/v1/upload").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["status"], "incomplete");
        assert_eq!(store.create_calls(), 0);

        let (_, session) = send_json(&app, "GET", "/api/v1/session").await;
        assert_eq!(session["session"]["views"][0]["state"], "captured");
    }

    #[tokio::test]
    async fn test_upload_failure_keeps_views() {
        let store = Arc::new(MemoryStore::new());
        store.set_available(false);
        let app = app_with(&SyntheticCamera::new(), store.clone()).await;

        for view in 0..2 {
            send(&app, "POST", &format!("/api/v1/views/{view}/tap")).await;
            send(&app, "POST", &format!("/api/v1/views/{view}/tap")).await;
        }

        let (status, body) = send_json(&app, "POST", "/api/v1/upload").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["status"], "failed");

        let (_, session) = send_json(&app, "GET", "/api/v1/session").await;
        assert_eq!(session["session"]["upload_ready"], true);
        assert_eq!(session["notification"]["message"], "Upload failed");
    }

    #[tokio::test]
    async fn test_form_routes_redirect() {
        let app = app_with(&SyntheticCamera::new(), Arc::new(MemoryStore::new())).await;

        let (status, _) = send(&app, "POST", "/views/0/tap").await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        let (status, _) = send(&app, "POST", "/upload").await;
        assert_eq!(status, StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_invalid_view() {
        let app = app_with(&SyntheticCamera::new(), Arc::new(MemoryStore::new())).await;
        let (status, body) = send_json(&app, "POST", "/api/v1/views/5/tap").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("5"));
    }

    #[tokio::test]
    async fn test_camera_denied_page_still_renders() {
        let app = app_with(&SyntheticCamera::denied(), Arc::new(MemoryStore::new())).await;

        let (status, html) = send(&app, "GET", "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Camera not accessible"));
        assert!(!html.contains("/preview.jpg"));

        let (status, _) = send(&app, "GET", "/preview.jpg").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_empty_gallery() {
        let app = app_with(&SyntheticCamera::new(), Arc::new(MemoryStore::new())).await;

        let (status, html) = send(&app, "GET", "/gallery").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("No uploads found."));

        let (_, body) = send_json(&app, "GET", "/api/v1/records").await;
        assert_eq!(body["status"], "empty");
    }

    #[tokio::test]
    async fn test_health() {
        let app = app_with(&SyntheticCamera::new(), Arc::new(MemoryStore::new())).await;
        let (status, body) = send_json(&app, "GET", "/api/v1/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["camera_live"], true);
    }
}
