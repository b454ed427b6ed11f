//! Capture Routes

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use capture_workflow::{TapAction, WorkflowError};
use serde::Serialize;
use serde_json::json;
use upload::{UploadError, UploadReceipt};

use crate::device::device_info;
use crate::render;
use crate::screen::ScreenSnapshot;
use crate::SharedState;

/// Response for a tap
#[derive(Debug, Serialize)]
pub struct TapResponse {
    #[serde(flatten)]
    pub action: TapAction,
    pub screen: ScreenSnapshot,
}

/// Response for an upload attempt
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: &'static str,
    pub receipt: Option<UploadReceipt>,
    pub reason: Option<String>,
}

fn invalid_view(e: WorkflowError) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))).into_response()
}

/// Capture page
pub async fn page(State(state): State<SharedState>) -> Html<String> {
    Html(render::capture_page(&state.screen.snapshot().await))
}

/// Live camera frame
pub async fn preview(State(state): State<SharedState>) -> Response {
    match state.screen.preview_jpeg().await {
        Some(jpeg) => ([(header::CONTENT_TYPE, "image/jpeg")], jpeg).into_response(),
        None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}

/// Session state
pub async fn session(State(state): State<SharedState>) -> Json<ScreenSnapshot> {
    Json(state.screen.snapshot().await)
}

/// Tap a view (JSON)
pub async fn tap(State(state): State<SharedState>, Path(index): Path<usize>) -> Response {
    match state.screen.tap(index).await {
        Ok(action) => Json(TapResponse {
            action,
            screen: state.screen.snapshot().await,
        })
        .into_response(),
        Err(e) => invalid_view(e),
    }
}

/// Tap a view from the HTML form, then back to the page
pub async fn tap_form(State(state): State<SharedState>, Path(index): Path<usize>) -> Response {
    match state.screen.tap(index).await {
        Ok(_) => Redirect::to("/").into_response(),
        Err(e) => invalid_view(e),
    }
}

async fn do_upload(state: &SharedState, headers: &HeaderMap) -> (StatusCode, UploadResponse) {
    match state.screen.upload(device_info(headers)).await {
        Ok(receipt) => (
            StatusCode::CREATED,
            UploadResponse {
                status: "uploaded",
                receipt: Some(receipt),
                reason: None,
            },
        ),
        Err(e) => {
            let (code, status) = match &e {
                UploadError::Incomplete => (StatusCode::CONFLICT, "incomplete"),
                UploadError::InFlight => (StatusCode::CONFLICT, "in_flight"),
                UploadError::Serialization(_) | UploadError::Store(_) => {
                    (StatusCode::BAD_GATEWAY, "failed")
                }
            };
            (
                code,
                UploadResponse {
                    status,
                    receipt: None,
                    reason: Some(e.to_string()),
                },
            )
        }
    }
}

/// Upload both views (JSON)
pub async fn upload(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let (code, body) = do_upload(&state, &headers).await;
    (code, Json(body)).into_response()
}

/// Upload from the HTML form, then back to the page
pub async fn upload_form(State(state): State<SharedState>, headers: HeaderMap) -> Redirect {
    do_upload(&state, &headers).await;
    Redirect::to("/")
}
