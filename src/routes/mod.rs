pub mod catalog;
pub mod health;
pub mod merge;
pub mod play;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// Build the dispatch table
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health endpoints
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))
        .route("/ready", get(health::ready))
        .route("/live", get(health::live))
        // Browse endpoints
        .route("/api/providers", get(catalog::list_providers))
        .route(
            "/api/providers/:key/channels",
            get(catalog::provider_channels),
        )
        .route("/api/search", get(catalog::search))
        .route("/api/cache/clear", post(merge::clear_cache))
        // Playback
        .route("/play/:id", get(play::play))
        // Merge (playlist/guide export)
        .route(
            "/api/merge/providers",
            get(merge::get_merge_providers).put(merge::set_merge_providers),
        )
        .route("/api/merge/playlist", post(merge::export_playlist))
        .route("/api/merge/epg", post(merge::export_epg))
        .route("/playlist.m3u", get(merge::playlist_m3u))
        .route("/epg.xml", get(merge::epg_xml))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use std::time::{Duration, Instant};
    use tower::ServiceExt;

    use crate::config::{Config, Settings};
    use crate::models::{Channel, DrmInfo, Playback};
    use crate::services::catalog::tests::{sample_channels, StaticSource};
    use crate::services::catalog::Catalog;
    use crate::services::channel_cache::ChannelCache;
    use crate::services::selection::{FileSelectionStore, SelectionStore};

    fn test_config(export_dir: &std::path::Path) -> Config {
        Config {
            port: 3001,
            app_env: "test".to_string(),
            base_url: "http://localhost:3001".to_string(),
            api_url: "http://upstream.invalid/graphql".to_string(),
            api_token: None,
            fetch_timeout_ms: 1000,
            channel_cache_ttl_secs: 300,
            channel_cache_max_entries: 4,
            cache_purge_interval_secs: 60,
            redis_url: None,
            selection_file: String::new(),
            export_dir: export_dir.to_string_lossy().to_string(),
            settings: Settings::default(),
            user_agent: "test-agent".to_string(),
        }
    }

    struct TestApp {
        app: Router,
        selection: Arc<FileSelectionStore>,
        dir: tempfile::TempDir,
    }

    fn test_app(source: StaticSource) -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let selection = Arc::new(FileSelectionStore::new(dir.path().join("selection.json")));
        let catalog = Catalog::new(
            Arc::new(source),
            ChannelCache::new(Duration::from_secs(300), 4),
            config.settings,
            &config.base_url,
            &config.user_agent,
        );

        let state = Arc::new(AppState {
            config,
            catalog,
            selection: selection.clone(),
            start_time: Instant::now(),
        });

        TestApp {
            app: router(state),
            selection,
            dir,
        }
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let (status, body) = send(app, Request::get(uri).body(Body::empty()).unwrap()).await;
        (status, serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null))
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_list_providers() {
        let t = test_app(StaticSource::new(sample_channels()));
        let (status, body) = get_json(&t.app, "/api/providers").await;

        assert_eq!(status, StatusCode::OK);
        let keys: Vec<&str> = body["providers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["key"].as_str().unwrap())
            .collect();
        assert_eq!(keys, vec!["all", "pluto tv", "custom", "public"]);
        assert_eq!(body["providers"][0]["count"], 3);
        assert!(body.get("channels").is_none());
    }

    #[tokio::test]
    async fn test_single_provider_lists_channels() {
        let channels = vec![
            Channel::new("b", "Bravo", "Xumo"),
            Channel::new("a", "alpha", "Xumo"),
        ];
        let t = test_app(StaticSource::new(channels));
        let (_, body) = get_json(&t.app, "/api/providers").await;

        assert_eq!(body["providers"].as_array().unwrap().len(), 1);
        assert_eq!(body["channels"][0]["id"], "a");
        assert_eq!(body["channels"][1]["playUrl"], "http://localhost:3001/play/b");
    }

    #[tokio::test]
    async fn test_provider_channels() {
        let t = test_app(StaticSource::new(sample_channels()));

        let (status, body) = get_json(&t.app, "/api/providers/public/channels").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Public");
        assert!(body["channels"][0]["plot"].as_str().unwrap().ends_with("\nNews"));

        let (status, _) = get_json(&t.app, "/api/providers/nope/channels").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_search_stores_query() {
        let t = test_app(StaticSource::new(sample_channels()));

        let (status, body) = get_json(&t.app, "/api/search?q=pluto").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["channels"].as_array().unwrap().len(), 1);
        assert_eq!(t.selection.get_search().await.unwrap(), "pluto");

        // repeats the stored search
        let (_, body) = get_json(&t.app, "/api/search").await;
        assert_eq!(body["name"], "Search: pluto");
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        let t = test_app(StaticSource::new(sample_channels()));
        let (status, _) = get_json(&t.app, "/api/search?q=%20").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_playlist_requires_selection() {
        let t = test_app(StaticSource::new(sample_channels()));
        let (status, body) = send(&t.app, Request::get("/playlist.m3u").body(Body::empty()).unwrap()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(body["error"].as_str().unwrap().contains("No providers"));
    }

    #[tokio::test]
    async fn test_merge_flow() {
        let t = test_app(StaticSource::new(sample_channels()));

        let (status, body) = send(
            &t.app,
            json_request("PUT", "/api/merge/providers", serde_json::json!({ "providers": ["Public", "Pluto TV"] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["providers"], serde_json::json!(["public", "pluto tv"]));

        let (_, body) = get_json(&t.app, "/api/merge/providers").await;
        let selected: Vec<&str> = body["providers"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|p| p["selected"] == true)
            .map(|p| p["key"].as_str().unwrap())
            .collect();
        assert_eq!(selected, vec!["pluto tv", "public"]);

        let (status, body) = send(&t.app, Request::get("/playlist.m3u").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        let text = String::from_utf8(body).unwrap();
        assert_eq!(text.matches("#EXTINF").count(), 2);
        assert!(!text.contains("My Stream"));

        let output = t.dir.path().join("epg.xml");
        let (status, body) = send(
            &t.app,
            json_request("POST", "/api/merge/epg", serde_json::json!({ "output": "epg.xml" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["providers"], serde_json::json!(["public", "pluto tv"]));
        assert_eq!(body["output"], output.display().to_string());

        let xml = std::fs::read_to_string(&output).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\" ?><tv>"));
        assert!(xml.ends_with("</tv>"));
    }

    #[tokio::test]
    async fn test_export_requires_output() {
        let t = test_app(StaticSource::new(sample_channels()));
        let (status, _) = send(
            &t.app,
            json_request("POST", "/api/merge/playlist", serde_json::json!({ "output": " " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_export_rejects_paths_outside_export_dir() {
        let t = test_app(StaticSource::new(sample_channels()));
        t.selection
            .set_selected_providers(vec!["public".to_string()])
            .await
            .unwrap();

        let outside = tempfile::tempdir().unwrap();
        let target = outside.path().join("config.toml");
        std::fs::write(&target, "important = true").unwrap();

        let outputs = [
            target.to_string_lossy().to_string(),
            format!("../{}", target.file_name().unwrap().to_string_lossy()),
            "nested/epg.xml".to_string(),
        ];
        for output in outputs {
            for uri in ["/api/merge/playlist", "/api/merge/epg"] {
                let (status, _) = send(
                    &t.app,
                    json_request("POST", uri, serde_json::json!({ "output": output })),
                )
                .await;
                assert_eq!(status, StatusCode::BAD_REQUEST, "{} {}", uri, output);
            }
        }

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "important = true");
        assert!(!t.dir.path().join("nested").exists());
    }

    #[tokio::test]
    async fn test_play_redirects_clear_stream() {
        let mut source = StaticSource::new(sample_channels());
        source.playback = Some(Playback {
            url: "https://cdn.example.com/live.m3u8".to_string(),
            drm_info: None,
            cookie: None,
        });
        let t = test_app(source);

        let response = t
            .app
            .clone()
            .oneshot(Request::get("/play/seven").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://cdn.example.com/live.m3u8"
        );
    }

    #[tokio::test]
    async fn test_play_unsupported_drm() {
        let mut source = StaticSource::new(sample_channels());
        source.playback = Some(Playback {
            url: "https://cdn.example.com/live.mpd".to_string(),
            drm_info: Some(DrmInfo {
                drm_scheme: "fairplay".to_string(),
                drm_license_url: String::new(),
                drm_key_request_properties: None,
            }),
            cookie: None,
        });
        let t = test_app(source);

        let (status, _) = get_json(&t.app, "/play/seven").await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_bad_gateway() {
        let mut source = StaticSource::new(vec![]);
        source.fail = true;
        let t = test_app(source);

        let (status, _) = get_json(&t.app, "/api/providers").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_health() {
        let t = test_app(StaticSource::new(sample_channels()));
        let (status, body) = get_json(&t.app, "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["selectionStore"]["backend"], "file");
    }
}
