use std::env;

/// Catalog toggles applied while grouping channels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Settings {
    /// Hide the built-in "public" provider while browsing
    pub hide_public: bool,
    /// Hide the built-in "custom" provider while browsing
    pub hide_custom: bool,
    /// Strip leading channel numbers ("1.1 ") from titles
    pub remove_numbers: bool,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,
    pub app_env: String,
    pub base_url: String,

    // Upstream
    pub api_url: String,
    pub api_token: Option<String>,
    pub fetch_timeout_ms: u64,

    // Channel cache
    pub channel_cache_ttl_secs: u64,
    pub channel_cache_max_entries: usize,
    pub cache_purge_interval_secs: u64,

    // Selections
    pub redis_url: Option<String>,
    pub selection_file: String,

    // Exports
    pub export_dir: String,

    // Catalog
    pub settings: Settings,

    // Misc
    pub user_agent: String,
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let port: u16 = env::var("PORT")
            .unwrap_or_else(|_| "3001".to_string())
            .parse()
            .unwrap_or(3001);

        Self {
            // Server
            port,
            app_env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            base_url: env::var("BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}", port))
                .trim_end_matches('/')
                .to_string(),

            // Upstream
            api_url: env::var("STREMIUM_API_URL")
                .unwrap_or_else(|_| "https://api.stremium.com/graphql".to_string()),
            api_token: env::var("STREMIUM_TOKEN").ok().filter(|t| !t.is_empty()),
            fetch_timeout_ms: env::var("FETCH_TIMEOUT_MS")
                .unwrap_or_else(|_| "30000".to_string())
                .parse()
                .unwrap_or(30_000), // 30 seconds

            // Channel cache
            channel_cache_ttl_secs: env::var("CHANNEL_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .unwrap_or(300), // 5 minutes
            channel_cache_max_entries: env::var("CHANNEL_CACHE_MAX_ENTRIES")
                .unwrap_or_else(|_| "8".to_string())
                .parse()
                .unwrap_or(8),
            cache_purge_interval_secs: env::var("CACHE_PURGE_INTERVAL_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),

            // Selections
            redis_url: env::var("REDIS_URL").ok().filter(|u| !u.is_empty()),
            selection_file: env::var("SELECTION_FILE")
                .unwrap_or_else(|_| ".stremium-selection.json".to_string()),

            // Exports
            export_dir: env::var("EXPORT_DIR").unwrap_or_else(|_| "./exports".to_string()),

            // Catalog
            settings: Settings {
                hide_public: env_bool("HIDE_PUBLIC", false),
                hide_custom: env_bool("HIDE_CUSTOM", false),
                remove_numbers: env_bool("REMOVE_NUMBERS", false),
            },

            user_agent: env::var("USER_AGENT").unwrap_or_else(|_| {
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36".to_string()
            }),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
