use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use std::sync::Arc;

use crate::error::CatalogResult;
use crate::models::PlaybackResolution;
use crate::AppState;

/// GET /play/:id - Resolve a live stream
///
/// Clear HLS streams redirect straight to the upstream URL so IPTV players
/// can open playlist entries directly. Widevine streams return the
/// descriptor (license URL, headers, cookies) as JSON.
pub async fn play(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> CatalogResult<Response> {
    let resolution = state.catalog.playback(&id).await?;

    match resolution {
        PlaybackResolution::Hls { url, .. } => {
            tracing::debug!(channel = %id, "redirecting to live stream");
            Ok(Redirect::temporary(&url).into_response())
        }
        widevine @ PlaybackResolution::Widevine { .. } => {
            tracing::debug!(channel = %id, "returning widevine descriptor");
            Ok(Json(widevine).into_response())
        }
    }
}
