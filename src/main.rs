mod config;
mod error;
mod models;
mod routes;
mod services;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::services::{
    catalog::Catalog,
    channel_cache::ChannelCache,
    cleanup::{start_cleanup_task, CleanupConfig},
    selection::{FileSelectionStore, RedisSelectionStore, SelectionStore},
    stremium::StremiumClient,
};

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub catalog: Catalog,
    pub selection: Arc<dyn SelectionStore>,
    pub start_time: Instant,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stremium_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // Load configuration
    let config = Config::from_env();
    let port = config.port;

    tracing::info!("Starting Stremium Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app_env);

    // Upstream client
    let client = StremiumClient::new(
        &config.api_url,
        config.api_token.clone(),
        &config.user_agent,
        Duration::from_millis(config.fetch_timeout_ms),
    )?;
    if !client.is_authenticated() {
        tracing::warn!("STREMIUM_TOKEN not set, upstream requests are anonymous");
    }
    tracing::info!("Stremium API: {}", client.api_url());

    // Selection store: Redis when configured, JSON file otherwise
    let selection: Arc<dyn SelectionStore> = match &config.redis_url {
        Some(url) => {
            let store = RedisSelectionStore::new(url).await?;
            tracing::info!("Redis connected: {}", url);
            Arc::new(store)
        }
        None => {
            tracing::info!("Selections stored in {}", config.selection_file);
            Arc::new(FileSelectionStore::new(&config.selection_file))
        }
    };

    tracing::info!("Exports written under {}", config.export_dir);

    // Channel listing cache
    let cache = ChannelCache::new(
        Duration::from_secs(config.channel_cache_ttl_secs),
        config.channel_cache_max_entries,
    );
    tracing::info!(
        "Channel cache initialized (ttl: {}s)",
        config.channel_cache_ttl_secs
    );

    tokio::spawn(start_cleanup_task(
        cache.clone(),
        CleanupConfig {
            interval_secs: config.cache_purge_interval_secs,
        },
    ));

    let catalog = Catalog::new(
        Arc::new(client),
        cache,
        config.settings,
        &config.base_url,
        &config.user_agent,
    );
    tracing::info!(
        hide_public = config.settings.hide_public,
        hide_custom = config.settings.hide_custom,
        remove_numbers = config.settings.remove_numbers,
        "Catalog settings"
    );

    // Build application state
    let state = Arc::new(AppState {
        config,
        catalog,
        selection,
        start_time: Instant::now(),
    });

    let app = routes::router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
