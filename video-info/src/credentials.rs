//! The on-disk credential cache and the decision of how to get a usable token.
//!
//! A run reuses the cached credential while it is still valid, refreshes it when it has expired
//! but carries a refresh token, and only otherwise sends the user through interactive consent.
//! Whatever was newly obtained is written back to the cache.

use crate::Error;
use crate::config::Config;
use crate::oauth::{ClientConfig, OAuthManager};
use crate::youtube_api::YouTubeClient;
use eyre::Context;
use jiff::{SignedDuration, Timestamp};
use oauth2::TokenResponse;
use oauth2::basic::BasicTokenResponse;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

/// Subtracted from the advertised lifetime so a token never expires mid-request.
const EXPIRY_MARGIN: SignedDuration = SignedDuration::from_secs(300);

/// Assumed lifetime when the token endpoint doesn't say.
const DEFAULT_LIFETIME: SignedDuration = SignedDuration::from_secs(55 * 60);

/// An OAuth token together with the moment it stops being usable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCredential {
    token: BasicTokenResponse,
    expires_at: Timestamp,
}

impl StoredCredential {
    /// Wraps a token that was just issued.
    pub fn new(token: BasicTokenResponse) -> Self {
        Self::issued_at(token, Timestamp::now())
    }

    /// Wraps a token issued at `now`, computing its expiry from `expires_in`.
    pub fn issued_at(token: BasicTokenResponse, now: Timestamp) -> Self {
        Self {
            expires_at: Self::expiry(&token, now),
            token,
        }
    }

    pub fn raw_token(&self) -> &BasicTokenResponse {
        &self.token
    }

    pub fn expires_at(&self) -> Timestamp {
        self.expires_at
    }

    pub fn access_token(&self) -> &str {
        self.token.access_token().secret()
    }

    pub fn is_valid(&self, now: Timestamp) -> bool {
        now < self.expires_at
    }

    pub fn can_refresh(&self) -> bool {
        self.token.refresh_token().is_some()
    }

    /// Swaps in a freshly refreshed token, restarting the expiry clock.
    ///
    /// Returns `false` without touching `self` when the token can't be refreshed any more.
    pub async fn refresh(&mut self, oauth_manager: &OAuthManager) -> eyre::Result<bool> {
        let Some(mut fresh) = oauth_manager
            .refresh_token(&self.token)
            .await
            .context("refresh OAuth token")?
        else {
            return Ok(false);
        };

        // Google usually leaves the refresh token out of refresh responses
        if fresh.refresh_token().is_none() {
            fresh.set_refresh_token(self.token.refresh_token().cloned());
        }
        *self = Self::new(fresh);
        tracing::debug!(expires_at = %self.expires_at, "refreshed access token");
        Ok(true)
    }

    /// Reads the cache at `path`, or `None` if there is no cache yet.
    pub async fn load(path: &Path) -> Result<Option<Self>, Error> {
        let json = match tokio::fs::read_to_string(path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("read credential cache {}", path.display()))
                    .map_err(Error::auth);
            }
        };
        tracing::info!(path = %path.display(), "loading credentials from file");
        serde_json::from_str::<Self>(&json)
            .with_context(|| format!("parse credential cache {}", path.display()))
            .map(Some)
            .map_err(Error::auth)
    }

    pub async fn save(&self, path: &Path) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(self)
            .context("serialize credential")
            .map_err(Error::auth)?;
        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        // the cache holds a long-lived refresh token, so it is for the owner's eyes only
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options
            .open(path)
            .await
            .with_context(|| format!("open credential cache {}", path.display()))
            .map_err(Error::auth)?;
        #[cfg(unix)]
        {
            // caches written by older versions may still be world-readable
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .await
                .with_context(|| format!("restrict credential cache {}", path.display()))
                .map_err(Error::auth)?;
        }
        file.write_all(json.as_bytes())
            .await
            .and(file.flush().await)
            .with_context(|| format!("write credential cache {}", path.display()))
            .map_err(Error::auth)?;
        tracing::debug!(path = %path.display(), "saved credentials");
        Ok(())
    }

    fn expiry(token: &BasicTokenResponse, now: Timestamp) -> Timestamp {
        let lifetime = token
            .expires_in()
            .and_then(|d| SignedDuration::try_from(d).ok())
            .map_or(DEFAULT_LIFETIME, |d| d - EXPIRY_MARGIN);
        now.checked_add(lifetime).unwrap_or(Timestamp::MAX)
    }
}

/// How to end up with a usable credential, given what (if anything) is cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAction {
    /// The cached credential is still valid.
    Reuse,
    /// The cached credential expired but can be refreshed without the user.
    Refresh,
    /// The user has to grant access in their browser.
    Consent,
}

impl AuthAction {
    pub fn decide(cached: Option<&StoredCredential>, now: Timestamp) -> Self {
        match cached {
            Some(credential) if credential.is_valid(now) => Self::Reuse,
            Some(credential) if credential.can_refresh() => Self::Refresh,
            _ => Self::Consent,
        }
    }
}

/// Produces an authenticated [`YouTubeClient`], going through the cache, a refresh, or consent.
///
/// The client secrets file is always required since the client may need to refresh the token
/// later on.
#[tracing::instrument(skip_all, fields(cache = %config.token_cache.display()))]
pub async fn authorize(config: &Config) -> Result<YouTubeClient, Error> {
    let client_config = ClientConfig::from_file(&config.client_secret)
        .await
        .map_err(Error::auth)?;
    let oauth_manager =
        OAuthManager::new(client_config, config.port, !config.no_browser).map_err(Error::auth)?;

    let cached = StoredCredential::load(&config.token_cache).await?;
    let action = AuthAction::decide(cached.as_ref(), Timestamp::now());
    tracing::debug!(?action, "picked authentication strategy");

    let credential = match (action, cached) {
        (AuthAction::Reuse, Some(credential)) => credential,
        (AuthAction::Refresh, Some(mut credential)) => {
            if credential
                .refresh(&oauth_manager)
                .await
                .context("refresh cached credential")
                .map_err(Error::auth)?
            {
                credential.save(&config.token_cache).await?;
                credential
            } else {
                tracing::warn!("token refresh failed, getting new token via full OAuth");
                consent(&oauth_manager, &config.token_cache).await?
            }
        }
        _ => consent(&oauth_manager, &config.token_cache).await?,
    };

    let http_client = reqwest::Client::builder()
        .build()
        .map_err(Error::transport)?;
    Ok(YouTubeClient::new(
        credential,
        Arc::new(oauth_manager),
        http_client,
    ))
}

async fn consent(oauth_manager: &OAuthManager, cache: &Path) -> Result<StoredCredential, Error> {
    let token = oauth_manager
        .authenticate()
        .await
        .context("authorize user to YouTube")
        .map_err(Error::auth)?;
    let credential = StoredCredential::new(token);
    credential.save(cache).await?;
    Ok(credential)
}
