use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::models::Channel;
use crate::services::metrics::CHANNEL_CACHE_HITS;
use crate::services::source::Feed;

struct CacheEntry {
    channels: Arc<Vec<Channel>>,
    fetched_at: Instant,
}

/// Short-lived cache of channel listings, keyed by feed
///
/// Entries older than the TTL are never returned. Least recently used
/// feeds are evicted once `max_entries` is reached.
#[derive(Clone)]
pub struct ChannelCache {
    entries: Arc<Mutex<LruCache<Feed, CacheEntry>>>,
    ttl: Duration,
}

impl ChannelCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Arc::new(Mutex::new(LruCache::new(capacity))),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached listing for `feed`, if still fresh
    pub async fn get(&self, feed: Feed) -> Option<Arc<Vec<Channel>>> {
        let mut entries = self.entries.lock().await;

        let expired = match entries.get(&feed) {
            Some(entry) if entry.fetched_at.elapsed() < self.ttl => {
                CHANNEL_CACHE_HITS.inc();
                return Some(Arc::clone(&entry.channels));
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.pop(&feed);
            tracing::debug!(feed = feed.as_str(), "channel cache entry expired");
        }

        None
    }

    pub async fn insert(&self, feed: Feed, channels: Vec<Channel>) -> Arc<Vec<Channel>> {
        let channels = Arc::new(channels);
        let mut entries = self.entries.lock().await;
        entries.put(
            feed,
            CacheEntry {
                channels: Arc::clone(&channels),
                fetched_at: Instant::now(),
            },
        );
        channels
    }

    /// Drop every expired entry, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let expired: Vec<Feed> = entries
            .iter()
            .filter(|(_, entry)| entry.fetched_at.elapsed() >= self.ttl)
            .map(|(feed, _)| *feed)
            .collect();

        for feed in &expired {
            entries.pop(feed);
        }

        expired.len()
    }

    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let count = entries.len();
        entries.clear();
        count
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}
