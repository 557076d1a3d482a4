use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};
use std::path::Path;
use std::sync::Arc;

use crate::error::CatalogResult;
use crate::models::{
    ExportRequest, ExportResponse, MergeProvider, MergeProvidersResponse, SelectProvidersRequest,
};
use crate::services::aggregator::sorted_keys;
use crate::services::catalog::ExportKind;
use crate::services::export::resolve_output;
use crate::AppState;

/// GET /api/merge/providers - Providers available for export, with selection flags
pub async fn get_merge_providers(
    State(state): State<Arc<AppState>>,
) -> CatalogResult<Json<MergeProvidersResponse>> {
    let selected = state.selection.get_selected_providers().await?;
    let providers = state.catalog.export_buckets(ExportKind::Playlist).await?;

    let providers = sorted_keys(&providers)
        .into_iter()
        .map(|key| {
            let bucket = &providers[&key];
            MergeProvider {
                name: bucket.name.clone(),
                logo: bucket.logo.clone(),
                selected: selected.contains(&key),
                key,
            }
        })
        .collect();

    Ok(Json(MergeProvidersResponse { providers }))
}

/// PUT /api/merge/providers - Save the providers to export
pub async fn set_merge_providers(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SelectProvidersRequest>,
) -> CatalogResult<impl IntoResponse> {
    state.selection.set_selected_providers(payload.providers).await?;
    let saved = state.selection.get_selected_providers().await?;

    tracing::info!(providers = ?saved, "merge providers updated");

    Ok(Json(serde_json::json!({ "providers": saved })))
}

async fn write_export(
    state: &AppState,
    kind: ExportKind,
    payload: ExportRequest,
) -> CatalogResult<Json<ExportResponse>> {
    let output = resolve_output(Path::new(&state.config.export_dir), &payload.output)?;

    let selected = state.selection.get_selected_providers().await?;
    let response = state.catalog.write_export(kind, &selected, output).await?;

    Ok(Json(response))
}

/// POST /api/merge/playlist - Write the M3U playlist to `output` under the export dir
pub async fn export_playlist(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ExportRequest>,
) -> CatalogResult<Json<ExportResponse>> {
    write_export(&state, ExportKind::Playlist, payload).await
}

/// POST /api/merge/epg - Write the XMLTV guide to `output` under the export dir
pub async fn export_epg(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ExportRequest>,
) -> CatalogResult<Json<ExportResponse>> {
    write_export(&state, ExportKind::Guide, payload).await
}

/// GET /playlist.m3u - M3U playlist of the selected providers
pub async fn playlist_m3u(State(state): State<Arc<AppState>>) -> CatalogResult<impl IntoResponse> {
    let selected = state.selection.get_selected_providers().await?;
    let body = state.catalog.render_export(ExportKind::Playlist, &selected).await?;

    Ok(([(header::CONTENT_TYPE, "audio/x-mpegurl; charset=utf-8")], body))
}

/// GET /epg.xml - XMLTV guide of the selected providers
pub async fn epg_xml(State(state): State<Arc<AppState>>) -> CatalogResult<impl IntoResponse> {
    let selected = state.selection.get_selected_providers().await?;
    let body = state.catalog.render_export(ExportKind::Guide, &selected).await?;

    Ok(([(header::CONTENT_TYPE, "application/xml; charset=utf-8")], body))
}

/// POST /api/cache/clear - Forget cached channel listings
pub async fn clear_cache(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let cleared = state.catalog.cache().clear().await;
    tracing::info!(cleared, "channel cache cleared");

    Json(serde_json::json!({ "cleared": cleared }))
}
