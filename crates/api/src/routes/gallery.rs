//! Gallery Routes

use axum::{extract::State, response::Html, Json};
use gallery::GalleryState;

use crate::render;
use crate::SharedState;

/// Gallery page
pub async fn page(State(state): State<SharedState>) -> Html<String> {
    Html(render::gallery_page(&state.gallery.fetch().await))
}

/// All uploaded sessions
pub async fn records(State(state): State<SharedState>) -> Json<GalleryState> {
    Json(state.gallery.fetch().await)
}
