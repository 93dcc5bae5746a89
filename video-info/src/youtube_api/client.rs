//! Core YouTube API client functionality and authentication management.

use crate::Error;
use crate::credentials::StoredCredential;
use crate::oauth::OAuthManager;
use crate::youtube_api::videos::VideoListResponse;
use eyre::Context;
use http::Method;
use jiff::Timestamp;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::instrument;

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Client for interacting with the YouTube Data API v3.
///
/// This client wraps an OAuth2 credential and provides methods to call YouTube API endpoints.
/// Expired access tokens are refreshed in memory before a request goes out; the refreshed token
/// is not written back to the credential cache.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    /// The current OAuth2 credential.
    credential: Arc<Mutex<StoredCredential>>,
    /// OAuth manager for refreshing tokens
    oauth_manager: Arc<OAuthManager>,
    /// HTTP client for API requests
    client: reqwest::Client,
    api_base: String,
}

impl YouTubeClient {
    pub fn new(
        credential: StoredCredential,
        oauth_manager: Arc<OAuthManager>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            credential: Arc::new(Mutex::new(credential)),
            oauth_manager,
            client,
            api_base: API_BASE.to_string(),
        }
    }

    /// Points the client at something other than `https://www.googleapis.com/youtube/v3`.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Returns a clone of the credential currently in use.
    pub async fn token(&self) -> StoredCredential {
        self.credential.lock().await.clone()
    }

    /// Gets a guaranteed-fresh access token, refreshing if necessary.
    #[instrument(skip(self))]
    async fn fresh_access_token(&self) -> eyre::Result<String> {
        let mut credential = self.credential.lock().await;

        if !credential.is_valid(Timestamp::now()) {
            tracing::debug!("access token expired, attempting refresh");

            if credential.refresh(&self.oauth_manager).await? {
                tracing::debug!("access token successfully refreshed");
            } else {
                tracing::error!("access token refresh failed, client is unusable");
                eyre::bail!("Unable to refresh expired access token");
            }
        }

        Ok(credential.access_token().to_string())
    }

    /// Makes an authenticated GET request to the YouTube API.
    ///
    /// Non-success statuses become [`Error::Transport`] carrying the status and the body Google
    /// sent back (which names the reason, e.g. `quotaExceeded`).
    #[instrument(skip(self), level = tracing::Level::TRACE)]
    async fn make_authenticated_request(
        &self,
        method: Method,
        path: &str,
        query_params: &[(&str, &str)],
    ) -> Result<reqwest::Response, Error> {
        let access_token = self.fresh_access_token().await.map_err(Error::auth)?;
        let url = format!("{}/{}", self.api_base, path);

        let response = self
            .client
            .request(method.clone(), &url)
            .bearer_auth(access_token)
            .query(query_params)
            .send()
            .await
            .with_context(|| format!("send {} request to YouTube API: {}", method, url))
            .map_err(Error::transport)?;

        let status_code = response.status();
        if !status_code.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(Error::transport(eyre::eyre!(
                "YouTube API {} request failed with status {}: {}",
                method,
                status_code,
                error_text
            )));
        }

        Ok(response)
    }

    /// Gets the snippet, content details and statistics of a single video.
    ///
    /// Uses the `videos.list` API. The raw list response is returned as is: an unknown ID is
    /// not an error here, it just comes back with no items. One request, no retries.
    ///
    /// # Required Scopes
    ///
    /// * `https://www.googleapis.com/auth/youtube.readonly`
    /// * `https://www.googleapis.com/auth/youtube`
    /// * `https://www.googleapis.com/auth/youtube.force-ssl`
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/videos/list>
    #[instrument(skip(self))]
    pub async fn get_video_details(&self, video_id: &str) -> Result<VideoListResponse, Error> {
        let query_params = [("part", "snippet,contentDetails,statistics"), ("id", video_id)];

        let response = self
            .make_authenticated_request(Method::GET, "videos", &query_params)
            .await?;

        let videos: VideoListResponse = response
            .json()
            .await
            .context("parse YouTube videos API response as JSON")
            .map_err(Error::transport)?;

        tracing::debug!(
            video_id,
            returned_items = videos.items.len(),
            "fetched video details"
        );

        Ok(videos)
    }
}
