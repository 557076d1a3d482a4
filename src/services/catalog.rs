//! Catalog service: source + cache + aggregation, used by the route handlers

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Settings;
use crate::error::{CatalogError, CatalogResult};
use crate::models::{
    Channel, ChannelView, ExportResponse, Playback, PlaybackResolution, ProviderMap,
};
use crate::services::aggregator::{aggregate, now_playing, AggregateOptions};
use crate::services::channel_cache::ChannelCache;
use crate::services::export::{select_providers, write_export};
use crate::services::guide::render_guide;
use crate::services::metrics::EXPORTS;
use crate::services::playlist::render_playlist;
use crate::services::source::{ChannelSource, Feed};

/// Export document kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Playlist,
    Guide,
}

impl ExportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportKind::Playlist => "playlist",
            ExportKind::Guide => "guide",
        }
    }

    fn feed(&self) -> Feed {
        match self {
            ExportKind::Playlist => Feed::Playlist,
            ExportKind::Guide => Feed::Guide,
        }
    }
}

/// Playable URL served by this server for a channel
pub fn play_url(base_url: &str, channel_id: &str) -> String {
    format!("{}/play/{}", base_url, urlencoding::encode(channel_id))
}

/// Decide how a player should open `playback`
pub fn resolve_playback(
    playback: Playback,
    default_headers: &HashMap<String, String>,
) -> CatalogResult<PlaybackResolution> {
    let mut headers = default_headers.clone();
    let cookies = playback.cookie.unwrap_or_default();

    match playback.drm_info {
        None => Ok(PlaybackResolution::Hls {
            url: playback.url,
            headers,
            cookies,
        }),
        Some(drm) if drm.drm_scheme.eq_ignore_ascii_case("widevine") => {
            headers.extend(drm.drm_key_request_properties.unwrap_or_default());
            Ok(PlaybackResolution::Widevine {
                url: playback.url,
                license_url: drm.drm_license_url,
                headers,
                cookies,
            })
        }
        Some(drm) => Err(CatalogError::UnsupportedStream(format!(
            "DRM scheme '{}' is not supported",
            drm.drm_scheme
        ))),
    }
}

pub struct Catalog {
    source: Arc<dyn ChannelSource>,
    cache: ChannelCache,
    settings: Settings,
    base_url: String,
    default_headers: HashMap<String, String>,
}

impl Catalog {
    pub fn new(
        source: Arc<dyn ChannelSource>,
        cache: ChannelCache,
        settings: Settings,
        base_url: &str,
        user_agent: &str,
    ) -> Self {
        let default_headers =
            HashMap::from([("User-Agent".to_string(), user_agent.to_string())]);

        Self {
            source,
            cache,
            settings,
            base_url: base_url.trim_end_matches('/').to_string(),
            default_headers,
        }
    }

    pub fn cache(&self) -> &ChannelCache {
        &self.cache
    }

    /// Channel listing for `feed`; only the browse feed is served from cache
    pub async fn channels(&self, feed: Feed) -> CatalogResult<Arc<Vec<Channel>>> {
        if feed == Feed::Browse {
            if let Some(channels) = self.cache.get(feed).await {
                return Ok(channels);
            }
        }

        let channels = self.source.fetch(feed).await?;
        tracing::info!(feed = feed.as_str(), count = channels.len(), "fetched channels");

        if feed == Feed::Browse {
            return Ok(self.cache.insert(feed, channels).await);
        }
        Ok(Arc::new(channels))
    }

    /// Buckets for interactive browsing (includes "All" when useful)
    pub async fn browse(&self) -> CatalogResult<ProviderMap> {
        let channels = self.channels(Feed::Browse).await?;
        Ok(aggregate(&channels, AggregateOptions::browse(&self.settings)))
    }

    /// Buckets for exports, from a fresh fetch
    pub async fn export_buckets(&self, kind: ExportKind) -> CatalogResult<ProviderMap> {
        let channels = self.channels(kind.feed()).await?;
        Ok(aggregate(&channels, AggregateOptions::export(&self.settings)))
    }

    pub fn play_url(&self, channel_id: &str) -> String {
        play_url(&self.base_url, channel_id)
    }

    pub fn channel_view(&self, channel: &Channel) -> ChannelView {
        ChannelView {
            id: channel.id.clone(),
            title: channel.title.clone(),
            thumb: channel.thumb.clone(),
            plot: now_playing(channel),
            play_url: self.play_url(&channel.id),
        }
    }

    pub async fn playback(&self, channel_id: &str) -> CatalogResult<PlaybackResolution> {
        let playback = self.source.fetch_playback(channel_id).await?;
        resolve_playback(playback, &self.default_headers)
    }

    async fn prepare_export(
        &self,
        kind: ExportKind,
        selected: &[String],
    ) -> CatalogResult<(ProviderMap, Vec<String>)> {
        if selected.is_empty() {
            return Err(CatalogError::no_providers());
        }
        let buckets = self.export_buckets(kind).await?;
        let keys = select_providers(&buckets, selected)?;
        Ok((buckets, keys))
    }

    fn render(
        &self,
        kind: ExportKind,
        buckets: &ProviderMap,
        keys: &[String],
        out: &mut impl std::io::Write,
    ) -> CatalogResult<()> {
        match kind {
            ExportKind::Playlist => {
                render_playlist(buckets, keys, |id| play_url(&self.base_url, id), out)
            }
            ExportKind::Guide => render_guide(buckets, keys, out),
        }
    }

    /// Render an export document into memory
    pub async fn render_export(&self, kind: ExportKind, selected: &[String]) -> CatalogResult<Vec<u8>> {
        let result = async {
            let (buckets, keys) = self.prepare_export(kind, selected).await?;
            let mut out = Vec::new();
            self.render(kind, &buckets, &keys, &mut out)?;
            Ok::<_, CatalogError>(out)
        }
        .await;

        record_export(kind, &result);
        result
    }

    /// Render an export document into `output`, replacing it atomically
    pub async fn write_export(
        &self,
        kind: ExportKind,
        selected: &[String],
        output: PathBuf,
    ) -> CatalogResult<ExportResponse> {
        let result = async {
            let (buckets, keys) = self.prepare_export(kind, selected).await?;
            if let Some(dir) = output.parent() {
                tokio::fs::create_dir_all(dir).await?;
            }
            let bytes = write_export(&output, |w| self.render(kind, &buckets, &keys, w)).await?;

            tracing::info!(
                kind = kind.as_str(),
                output = %output.display(),
                providers = keys.len(),
                bytes,
                "export written"
            );

            Ok::<_, CatalogError>(ExportResponse {
                output: output.display().to_string(),
                providers: keys,
                bytes,
            })
        }
        .await;

        record_export(kind, &result);
        result
    }
}

fn record_export<T>(kind: ExportKind, result: &CatalogResult<T>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(CatalogError::Configuration(_)) => "rejected",
        Err(_) => "error",
    };
    EXPORTS.with_label_values(&[kind.as_str(), outcome]).inc();
}
