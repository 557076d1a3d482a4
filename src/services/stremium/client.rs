//! Stremium API Client
//!
//! HTTP client for the Stremium GraphQL endpoint.

use super::types::*;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error};

use crate::models::{Channel, Playback};
use crate::services::metrics::UPSTREAM_REQUESTS;
use crate::services::source::ChannelSource;

/// Stremium API Client
pub struct StremiumClient {
    http: Client,
    api_url: String,
    token: Option<String>,
    user_agent: String,
}

impl StremiumClient {
    /// Create a new Stremium client
    ///
    /// # Arguments
    /// * `api_url` - GraphQL endpoint
    /// * `token` - Bearer token, if the account is signed in
    /// * `user_agent` - User agent sent with every request
    /// * `timeout` - Per-request timeout
    pub fn new(
        api_url: &str,
        token: Option<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, StremiumError> {
        let http = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|e| StremiumError::Network(e.to_string()))?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
            user_agent: user_agent.to_string(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Run a GraphQL operation and decode its `data` payload
    async fn query<T: DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, StremiumError> {
        debug!("Stremium API request: {}", operation);

        let body = GraphQlRequest {
            operation_name: operation,
            query,
            variables,
        };

        let mut request = self
            .http
            .post(&self.api_url)
            .header("User-Agent", &self.user_agent)
            .json(&body);

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StremiumError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StremiumError::Http(status.as_u16()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| StremiumError::Network(e.to_string()))?;

        parse_response(operation, &text)
    }

    async fn fetch_list<T: DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        extract: fn(T) -> Vec<Channel>,
    ) -> Result<Vec<Channel>, StremiumError> {
        let result = self
            .query::<T>(operation, query, serde_json::json!({}))
            .await
            .map(extract);

        let outcome = if result.is_ok() { "ok" } else { "error" };
        UPSTREAM_REQUESTS
            .with_label_values(&[operation, outcome])
            .inc();

        result
    }
}

/// First `max` characters of `text`, cut on a char boundary
fn truncate_chars(text: &str, max: usize) -> &str {
    text.char_indices().nth(max).map_or(text, |(i, _)| &text[..i])
}

/// Decode a GraphQL response body
pub(crate) fn parse_response<T: DeserializeOwned>(
    operation: &str,
    text: &str,
) -> Result<T, StremiumError> {
    if text.trim().is_empty() || text == "null" {
        return Err(StremiumError::EmptyResponse);
    }

    let envelope: GraphQlResponse<T> = serde_json::from_str(text).map_err(|e| {
        error!(
            "Failed to parse Stremium response for '{}': {}",
            operation, e
        );
        debug!("Response text: {}", truncate_chars(text, 500));
        StremiumError::Parse(e.to_string())
    })?;

    if let Some(err) = envelope.errors.first() {
        return Err(StremiumError::Api(err.message.clone()));
    }

    envelope.data.ok_or(StremiumError::EmptyResponse)
}

#[async_trait]
impl ChannelSource for StremiumClient {
    async fn fetch_channels(&self) -> Result<Vec<Channel>, StremiumError> {
        self.fetch_list::<ChannelsData>("Channels", CHANNELS_QUERY, |data| data.channels)
            .await
    }

    async fn fetch_epg_channels(&self) -> Result<Vec<Channel>, StremiumError> {
        self.fetch_list::<EpgData>("Epg", EPG_QUERY, |data| data.epg)
            .await
    }

    async fn fetch_playback(&self, channel_id: &str) -> Result<Playback, StremiumError> {
        let data: PlayData = self
            .query("Play", PLAY_QUERY, serde_json::json!({ "id": channel_id }))
            .await?;

        data.play.ok_or(StremiumError::EmptyResponse)
    }
}

/// Stremium API Error types
#[derive(Debug)]
pub enum StremiumError {
    /// Network/connection error
    Network(String),
    /// HTTP error (non-2xx status)
    Http(u16),
    /// JSON parsing error
    Parse(String),
    /// Error reported inside the GraphQL envelope
    Api(String),
    /// Empty response from server
    EmptyResponse,
}

impl std::fmt::Display for StremiumError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StremiumError::Network(e) => write!(f, "Network error: {}", e),
            StremiumError::Http(code) => write!(f, "HTTP error: {}", code),
            StremiumError::Parse(e) => write!(f, "Parse error: {}", e),
            StremiumError::Api(e) => write!(f, "API error: {}", e),
            StremiumError::EmptyResponse => write!(f, "Empty response"),
        }
    }
}

impl std::error::Error for StremiumError {}
