pub mod aggregator;
pub mod catalog;
pub mod channel_cache;
pub mod cleanup;
pub mod export;
pub mod guide;
pub mod metrics;
pub mod playlist;
pub mod selection;
pub mod source;
pub mod stremium;
