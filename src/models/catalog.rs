use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::channel::Channel;

/// Channels grouped under one provider
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderBucket {
    pub name: String,
    /// Fetch order; use `sorted_channels` for display order
    pub channels: Vec<Channel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    /// 0 = synthetic "All", 1 = regular provider, 2 = built-in provider
    pub sort: u8,
}

impl ProviderBucket {
    pub fn new(name: impl Into<String>, logo: Option<String>, sort: u8) -> Self {
        Self {
            name: name.into(),
            channels: Vec::new(),
            logo,
            sort,
        }
    }

    /// Channels ordered by case-insensitive trimmed title
    pub fn sorted_channels(&self) -> Vec<&Channel> {
        let mut channels: Vec<&Channel> = self.channels.iter().collect();
        channels.sort_by_cached_key(|c| c.sort_title());
        channels
    }
}

/// Provider buckets keyed by lower-cased provider name, in first-seen order
pub type ProviderMap = IndexMap<String, ProviderBucket>;

// ============ API payloads ============

/// Provider entry in the browse listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSummary {
    pub key: String,
    pub name: String,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

/// Channel entry in browse/search listings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelView {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumb: Option<String>,
    /// "[7:00pm - 7:30pm]\nNews" for the current program
    pub plot: String,
    pub play_url: String,
}

/// GET /api/providers response
///
/// When only one provider exists its channels are listed directly.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvidersResponse {
    pub providers: Vec<ProviderSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<Vec<ChannelView>>,
}

/// GET /api/providers/:key/channels and /api/search response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelsResponse {
    pub name: String,
    pub channels: Vec<ChannelView>,
}

/// Query params for search
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
}

/// Provider available for merge exports
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeProvider {
    pub key: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    pub selected: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeProvidersResponse {
    pub providers: Vec<MergeProvider>,
}

/// PUT /api/merge/providers body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectProvidersRequest {
    pub providers: Vec<String>,
}

/// POST /api/merge/{playlist,epg} body
#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub output: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResponse {
    pub output: String,
    pub providers: Vec<String>,
    pub bytes: u64,
}

/// How a player should open a resolved stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PlaybackResolution {
    /// Clear live HLS
    Hls {
        url: String,
        headers: HashMap<String, String>,
        cookies: HashMap<String, String>,
    },
    #[serde(rename_all = "camelCase")]
    Widevine {
        url: String,
        license_url: String,
        headers: HashMap<String, String>,
        cookies: HashMap<String, String>,
    },
}
