use async_trait::async_trait;

use crate::models::{Channel, Playback};
use crate::services::stremium::StremiumError;

/// Which channel listing a caller wants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feed {
    /// Interactive browsing and search
    Browse,
    /// M3U export
    Playlist,
    /// XMLTV export (full program lookahead)
    Guide,
}

impl Feed {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feed::Browse => "browse",
            Feed::Playlist => "playlist",
            Feed::Guide => "guide",
        }
    }
}

/// Upstream provider of live channels and playback data
#[async_trait]
pub trait ChannelSource: Send + Sync {
    async fn fetch_channels(&self) -> Result<Vec<Channel>, StremiumError>;

    /// Guide variant with the full upcoming program list
    async fn fetch_epg_channels(&self) -> Result<Vec<Channel>, StremiumError>;

    async fn fetch_playback(&self, channel_id: &str) -> Result<Playback, StremiumError>;

    /// Fetch the listing backing `feed`
    async fn fetch(&self, feed: Feed) -> Result<Vec<Channel>, StremiumError> {
        match feed {
            Feed::Guide => self.fetch_epg_channels().await,
            Feed::Browse | Feed::Playlist => self.fetch_channels().await,
        }
    }
}
