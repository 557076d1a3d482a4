//! Stremium API Types
//!
//! GraphQL envelopes and query documents for the Stremium live TV API.

use serde::{Deserialize, Serialize};

use crate::models::{Channel, Playback};

/// Live channel listing with the current program
pub const CHANNELS_QUERY: &str = r#"query Channels {
  channels {
    id title thumb providerDisplayName
    currentEpisode { title airTime duration seasonNumber episodeNumber primaryImageUrl description episodeTitle }
    upcomingEpisodes(limit: 1) { title airTime duration }
  }
}"#;

/// Channel listing with the full guide lookahead
pub const EPG_QUERY: &str = r#"query Epg {
  epg: channels {
    id title thumb providerDisplayName
    currentEpisode { title airTime duration seasonNumber episodeNumber primaryImageUrl description episodeTitle }
    upcomingEpisodes { title airTime duration seasonNumber episodeNumber primaryImageUrl description episodeTitle }
  }
}"#;

/// Playback data for a single channel
pub const PLAY_QUERY: &str = r#"query Play($id: ID!) {
  play(channelId: $id) {
    url cookie
    drmInfo { drmScheme drmLicenseUrl drmKeyRequestProperties }
  }
}"#;

// ============================================================================
// Envelopes
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlRequest<'a> {
    pub operation_name: &'a str,
    pub query: &'a str,
    pub variables: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

// ============================================================================
// Payloads
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ChannelsData {
    #[serde(default)]
    pub channels: Vec<Channel>,
}

#[derive(Debug, Deserialize)]
pub struct EpgData {
    #[serde(default)]
    pub epg: Vec<Channel>,
}

#[derive(Debug, Deserialize)]
pub struct PlayData {
    pub play: Option<Playback>,
}
