use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// A program airing (or about to air) on a live channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub title: String,
    pub air_time: DateTime<Utc>,
    /// Length in minutes
    #[serde(default)]
    pub duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_title: Option<String>,
}

impl Program {
    /// Build a program with only the required fields set
    pub fn new(title: impl Into<String>, air_time: DateTime<Utc>, duration: u32) -> Self {
        Self {
            title: title.into(),
            air_time,
            duration,
            season_number: None,
            episode_number: None,
            primary_image_url: None,
            description: None,
            episode_title: None,
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.air_time
    }

    pub fn stop(&self) -> DateTime<Utc> {
        self.air_time + Duration::minutes(i64::from(self.duration))
    }

    /// Upstream sometimes sends placeholder entries without a title
    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty()
    }
}

/// Live channel as returned by the channel source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumb: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub provider_display_name: String,
    #[serde(default)]
    pub current_episode: Option<Program>,
    #[serde(default, deserialize_with = "skip_null_programs")]
    pub upcoming_episodes: Vec<Program>,
}

impl Channel {
    pub fn new(id: impl Into<String>, title: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            thumb: None,
            provider_display_name: provider.into(),
            current_episode: None,
            upcoming_episodes: Vec::new(),
        }
    }

    /// Bucket key for this channel's provider
    pub fn provider_key(&self) -> String {
        self.provider_display_name.to_lowercase()
    }

    /// Key used to order channels for display
    pub fn sort_title(&self) -> String {
        self.title.to_lowercase().trim().to_string()
    }
}

fn null_as_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn skip_null_programs<'de, D>(deserializer: D) -> Result<Vec<Program>, D::Error>
where
    D: Deserializer<'de>,
{
    let programs: Option<Vec<Option<Program>>> = Option::deserialize(deserializer)?;
    Ok(programs.unwrap_or_default().into_iter().flatten().collect())
}

/// DRM details attached to a playback response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrmInfo {
    pub drm_scheme: String,
    #[serde(default)]
    pub drm_license_url: String,
    #[serde(default)]
    pub drm_key_request_properties: Option<HashMap<String, String>>,
}

/// Raw playback data for a channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playback {
    pub url: String,
    #[serde(default)]
    pub drm_info: Option<DrmInfo>,
    #[serde(default)]
    pub cookie: Option<HashMap<String, String>>,
}
