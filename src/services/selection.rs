//! Persisted user selections (merge providers, last search)

use anyhow::Result;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

const MERGE_PROVIDERS_KEY: &str = "selection:merge_providers";
const SEARCH_KEY: &str = "selection:search";

fn normalize(providers: Vec<String>) -> Vec<String> {
    let mut keys: Vec<String> = Vec::with_capacity(providers.len());
    for key in providers.into_iter().map(|p| p.trim().to_lowercase()) {
        if !key.is_empty() && !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

/// Key-value store for the user's catalog choices
#[async_trait]
pub trait SelectionStore: Send + Sync {
    /// Provider keys (lower-cased) to include in exports
    async fn get_selected_providers(&self) -> Result<Vec<String>>;

    async fn set_selected_providers(&self, providers: Vec<String>) -> Result<()>;

    async fn get_search(&self) -> Result<String>;

    async fn set_search(&self, query: &str) -> Result<()>;

    async fn ping(&self) -> bool;

    fn backend(&self) -> &'static str;
}

// ============ Redis ============

/// Redis-backed selections, shared between server instances
#[derive(Clone)]
pub struct RedisSelectionStore {
    conn: ConnectionManager,
}

impl RedisSelectionStore {
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    async fn set_json<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<()> {
        let mut conn = self.conn.clone();
        let serialized = serde_json::to_string(value)?;
        let _: () = conn.set(key, serialized).await?;
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        match value {
            Some(v) => Ok(Some(serde_json::from_str(&v)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl SelectionStore for RedisSelectionStore {
    async fn get_selected_providers(&self) -> Result<Vec<String>> {
        let providers: Option<Vec<String>> = self.get_json(MERGE_PROVIDERS_KEY).await?;
        Ok(normalize(providers.unwrap_or_default()))
    }

    async fn set_selected_providers(&self, providers: Vec<String>) -> Result<()> {
        self.set_json(MERGE_PROVIDERS_KEY, &normalize(providers)).await
    }

    async fn get_search(&self) -> Result<String> {
        Ok(self.get_json(SEARCH_KEY).await?.unwrap_or_default())
    }

    async fn set_search(&self, query: &str) -> Result<()> {
        self.set_json(SEARCH_KEY, &query).await
    }

    async fn ping(&self) -> bool {
        let mut conn = self.conn.clone();
        let pong: Result<String, _> = redis::cmd("PING").query_async(&mut conn).await;
        matches!(pong.as_deref(), Ok("PONG"))
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

// ============ JSON file ============

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectionDocument {
    #[serde(default)]
    merge_providers: Vec<String>,
    #[serde(default)]
    search: String,
}

/// Single JSON document on disk, rewritten atomically
pub struct FileSelectionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSelectionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<SelectionDocument> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(doc) => Ok(doc),
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse selections {}: {}",
                        self.path.display(),
                        e
                    );
                    Ok(SelectionDocument::default())
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SelectionDocument::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, doc: &SelectionDocument) -> Result<()> {
        let tmp_path = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(doc)?;

        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(content.as_bytes()).await?;
        file.sync_all().await?;

        fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }

    async fn update<F: FnOnce(&mut SelectionDocument) + Send>(&self, apply: F) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        apply(&mut doc);
        self.save(&doc).await
    }
}

#[async_trait]
impl SelectionStore for FileSelectionStore {
    async fn get_selected_providers(&self) -> Result<Vec<String>> {
        Ok(normalize(self.load().await?.merge_providers))
    }

    async fn set_selected_providers(&self, providers: Vec<String>) -> Result<()> {
        let providers = normalize(providers);
        self.update(move |doc| doc.merge_providers = providers).await
    }

    async fn get_search(&self) -> Result<String> {
        Ok(self.load().await?.search)
    }

    async fn set_search(&self, query: &str) -> Result<()> {
        let query = query.to_string();
        self.update(move |doc| doc.search = query).await
    }

    async fn ping(&self) -> bool {
        self.load().await.is_ok()
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        let keys = normalize(vec![
            "Pluto TV".to_string(),
            " pluto tv ".to_string(),
            "".to_string(),
            "Public".to_string(),
        ]);
        assert_eq!(keys, vec!["pluto tv", "public"]);
    }

    #[tokio::test]
    async fn test_file_store_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSelectionStore::new(dir.path().join("selection.json"));

        assert!(store.get_selected_providers().await.unwrap().is_empty());
        assert_eq!(store.get_search().await.unwrap(), "");
        assert!(store.ping().await);
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("selection.json");
        let store = FileSelectionStore::new(&path);

        store
            .set_selected_providers(vec!["Public".to_string(), "Xumo".to_string()])
            .await
            .unwrap();
        store.set_search("news").await.unwrap();

        let reopened = FileSelectionStore::new(&path);
        assert_eq!(
            reopened.get_selected_providers().await.unwrap(),
            vec!["public", "xumo"]
        );
        assert_eq!(reopened.get_search().await.unwrap(), "news");
    }

    #[tokio::test]
    async fn test_file_store_corrupt_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("selection.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = FileSelectionStore::new(&path);
        assert!(store.get_selected_providers().await.unwrap().is_empty());
    }
}
