//! Periodic purge of expired channel listings
//!
//! Expired entries are already skipped on read; this keeps the cache from
//! holding on to large guide listings nobody asks for again.

use std::time::Duration;
use tokio::time;

use crate::services::channel_cache::ChannelCache;

/// Configuration for the cleanup task
pub struct CleanupConfig {
    /// How often to run cleanup (in seconds)
    pub interval_secs: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

/// Run one purge pass
pub async fn run_cleanup(cache: &ChannelCache) -> usize {
    let purged = cache.purge_expired().await;
    if purged > 0 {
        tracing::info!(cache_gc_expired = purged, msg = "expired channel listings removed");
    }
    purged
}

/// Start the background cleanup task
/// Runs immediately on startup, then at the configured interval
pub async fn start_cleanup_task(cache: ChannelCache, config: CleanupConfig) {
    let interval = Duration::from_secs(config.interval_secs.max(1));

    tracing::info!(
        "Cleanup task started (interval: {}s, ttl: {}s)",
        interval.as_secs(),
        cache.ttl().as_secs()
    );

    let mut ticker = time::interval(interval);
    loop {
        ticker.tick().await;
        run_cleanup(&cache).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Channel;
    use crate::services::source::Feed;

    #[tokio::test]
    async fn test_run_cleanup() {
        let cache = ChannelCache::new(Duration::ZERO, 4);
        cache
            .insert(Feed::Guide, vec![Channel::new("1", "One", "Public")])
            .await;

        assert_eq!(run_cleanup(&cache).await, 1);
        assert_eq!(run_cleanup(&cache).await, 0);
    }
}
