use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::error::{CatalogError, CatalogResult};
use crate::models::{ChannelView, ChannelsResponse, ProviderBucket, ProviderSummary, ProvidersResponse, SearchQuery};
use crate::services::aggregator::{filter_by_query, sorted_keys, ALL};
use crate::AppState;

fn channel_views(state: &AppState, bucket: &ProviderBucket) -> Vec<ChannelView> {
    bucket
        .sorted_channels()
        .into_iter()
        .map(|c| state.catalog.channel_view(c))
        .collect()
}

/// GET /api/providers - Providers with channel counts
///
/// With a single provider there is nothing to choose, so its channels are
/// returned directly.
pub async fn list_providers(
    State(state): State<Arc<AppState>>,
) -> CatalogResult<Json<ProvidersResponse>> {
    let providers = state.catalog.browse().await?;

    let summaries: Vec<ProviderSummary> = sorted_keys(&providers)
        .into_iter()
        .map(|key| {
            let bucket = &providers[&key];
            ProviderSummary {
                name: bucket.name.clone(),
                count: bucket.channels.len(),
                logo: bucket.logo.clone(),
                key,
            }
        })
        .collect();

    let channels = match providers.first() {
        Some((_, bucket)) if providers.len() == 1 => Some(channel_views(&state, bucket)),
        _ => None,
    };

    Ok(Json(ProvidersResponse {
        providers: summaries,
        channels,
    }))
}

/// GET /api/providers/:key/channels - Channels of one provider, by title
pub async fn provider_channels(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> CatalogResult<Json<ChannelsResponse>> {
    let providers = state.catalog.browse().await?;
    let key = key.to_lowercase();
    let bucket = providers
        .get(&key)
        .ok_or_else(|| CatalogError::NotFound(format!("provider '{}'", key)))?;

    Ok(Json(ChannelsResponse {
        name: bucket.name.clone(),
        channels: channel_views(&state, bucket),
    }))
}

/// GET /api/search?q= - Search channel titles
///
/// Without `q` the last stored search is repeated.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> CatalogResult<Json<ChannelsResponse>> {
    let q = match query.q.map(|q| q.trim().to_string()).filter(|q| !q.is_empty()) {
        Some(q) => {
            state.selection.set_search(&q).await?;
            q
        }
        None => state.selection.get_search().await?,
    };

    if q.is_empty() {
        return Err(CatalogError::Configuration("Search query is required".to_string()));
    }

    let providers = state.catalog.browse().await?;
    let bucket = match providers.get(ALL) {
        Some(all) => Some(all),
        None if providers.len() == 1 => providers.first().map(|(_, b)| b),
        None => None,
    };

    let channels = match bucket {
        Some(bucket) => filter_by_query(bucket.sorted_channels(), &q)
            .into_iter()
            .map(|c| state.catalog.channel_view(c))
            .collect(),
        None => Vec::new(),
    };

    tracing::debug!(query = %q, results = channels.len(), "search");

    Ok(Json(ChannelsResponse {
        name: format!("Search: {}", q),
        channels,
    }))
}
