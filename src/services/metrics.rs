use lazy_static::lazy_static;
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

lazy_static! {
    /// Playlist/guide exports by kind and outcome
    pub static ref EXPORTS: IntCounterVec = register_int_counter_vec!(
        "stremium_exports_total",
        "Playlist and guide exports",
        &["kind", "outcome"]
    )
    .unwrap();

    /// Upstream API calls by operation and outcome
    pub static ref UPSTREAM_REQUESTS: IntCounterVec = register_int_counter_vec!(
        "stremium_upstream_requests_total",
        "Requests made to the Stremium API",
        &["operation", "outcome"]
    )
    .unwrap();

    pub static ref CHANNEL_CACHE_HITS: IntCounter = register_int_counter!(
        "stremium_channel_cache_hits_total",
        "Channel listings served from cache"
    )
    .unwrap();
}
