//! OAuth 2.0 management for YouTube API authentication.
//!
//! This module encapsulates the installed-application flow used to authorize against the YouTube
//! Data API: reading the client secrets Google hands out, walking the user through consent with
//! a local redirect listener, and exchanging refresh tokens for new access tokens.

use bytes::Bytes;
use eyre::Context;
use http_body_util::Full;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode, body};
use oauth2::basic::{BasicClient, BasicErrorResponseType, BasicTokenResponse};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    RedirectUrl, RequestTokenError, Scope, TokenResponse, TokenUrl, reqwest,
};
use serde::Deserialize;
use std::convert::Infallible;
use std::future::Future;
use std::path::Path;

/// The only scope this tool asks for.
pub const SCOPE: &str = "https://www.googleapis.com/auth/youtube.force-ssl";

const OAUTH_DONE: &str =
    "The authentication flow has completed. You may close this window.";

/// The OAuth client registration from a Google Cloud `client_secret.json`.
///
/// Google nests the interesting fields under `installed` for desktop clients and under `web` for
/// web clients. Either works for the loopback redirect used here.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub client_id: ClientId,
    pub client_secret: ClientSecret,
    pub auth_uri: AuthUrl,
    pub token_uri: TokenUrl,
}

#[derive(Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientConfig>,
    web: Option<ClientConfig>,
}

impl ClientConfig {
    pub fn from_json(json: &str) -> eyre::Result<Self> {
        let file: ClientSecretFile =
            serde_json::from_str(json).context("parse client secret JSON")?;
        file.installed
            .or(file.web)
            .ok_or_else(|| eyre::eyre!("client secret has neither an `installed` nor a `web` client"))
    }

    pub async fn from_file(path: &Path) -> eyre::Result<Self> {
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("read client secret file {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("load {}", path.display()))
    }
}

/// Manages OAuth 2.0 authentication flows for YouTube API access.
///
/// Both the interactive consent flow and refresh-token exchanges go through here so they share
/// one client registration and one HTTP client.
#[derive(Debug, Clone)]
pub struct OAuthManager {
    client: ClientConfig,
    /// Local port the consent redirect lands on. `0` picks any free port.
    port: u16,
    open_browser: bool,
    http_client: reqwest::Client,
}

impl OAuthManager {
    pub fn new(client: ClientConfig, port: u16, open_browser: bool) -> eyre::Result<Self> {
        let http_client = reqwest::ClientBuilder::new()
            // SSRF no thank you.
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("build OAuth HTTP client")?;
        Ok(Self {
            client,
            port,
            open_browser,
            http_client,
        })
    }

    /// Performs a complete OAuth 2.0 authorization flow to obtain a new access token.
    ///
    /// This binds the local redirect listener, sends the user to Google's consent page (in their
    /// browser, or by printing the URL), waits for the redirect carrying the authorization code,
    /// and exchanges that code for a token. There is no timeout: this waits until the user
    /// finishes or the process is killed.
    #[tracing::instrument(skip(self), err)]
    pub async fn authenticate(&self) -> eyre::Result<BasicTokenResponse> {
        let csrf = CsrfToken::new_random();
        let (redirect_url, eventually_authorization_code) = self
            .setup_redirect(csrf.clone())
            .await
            .context("set up redirect endpoint")?;

        let client = BasicClient::new(self.client.client_id.clone())
            .set_client_secret(self.client.client_secret.clone())
            .set_auth_uri(self.client.auth_uri.clone())
            .set_token_uri(self.client.token_uri.clone())
            .set_redirect_uri(redirect_url);

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let (auth_url, _csrf_token) = client
            // We never re-use the CSRF since we only go through the flow exactly once.
            .authorize_url(move || csrf.clone())
            .add_scope(Scope::new(SCOPE.to_string()))
            // Google only issues a refresh token for offline access
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .set_pkce_challenge(pkce_challenge)
            .url();

        tracing::info!(url = %auth_url, "asking user to follow OAuth flow");
        let opened = self.open_browser
            && match webbrowser::open(auth_url.as_str()) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(error = %e, "could not open browser");
                    false
                }
            };
        if !opened {
            eprintln!("Please visit this URL to authorize this application: {auth_url}");
        }

        let authorization_code = eventually_authorization_code
            .await
            .context("await user authorization code")?;

        let token_result = client
            .exchange_code(authorization_code)
            .set_pkce_verifier(pkce_verifier)
            .request_async(&self.http_client)
            .await
            .context("exchange authorization code with access token")?;

        Ok(token_result)
    }

    /// Trades the refresh token inside `token` for a new access token.
    ///
    /// `Ok(None)` means there is nothing to trade: either `token` has no refresh token, or Google
    /// answered `invalid_grant` because the grant was revoked or has lapsed. Only a full
    /// [`Self::authenticate`] helps then. Every other failure is an error.
    pub async fn refresh_token(
        &self,
        token: &BasicTokenResponse,
    ) -> eyre::Result<Option<BasicTokenResponse>> {
        let Some(refresh_token) = token.refresh_token() else {
            tracing::debug!("token carries no refresh token");
            return Ok(None);
        };

        let exchange = BasicClient::new(self.client.client_id.clone())
            .set_client_secret(self.client.client_secret.clone())
            .set_token_uri(self.client.token_uri.clone())
            .exchange_refresh_token(refresh_token)
            .request_async(&self.http_client)
            .await;

        match exchange {
            Ok(fresh) => Ok(Some(fresh)),
            Err(RequestTokenError::ServerResponse(response))
                if *response.error() == BasicErrorResponseType::InvalidGrant =>
            {
                tracing::warn!(
                    description = response.error_description().map(String::as_str),
                    "refresh token no longer accepted"
                );
                Ok(None)
            }
            Err(e) => Err(e).context("exchange refresh token"),
        }
    }

    /// Sets up a local HTTP server to receive the OAuth authorization callback.
    ///
    /// The listener is bound before this returns, so the redirect URL is live by the time the
    /// user is sent to the consent page. It stops listening once a callback carrying either a
    /// code or an error has arrived.
    async fn setup_redirect(
        &self,
        csrf: CsrfToken,
    ) -> eyre::Result<(
        RedirectUrl,
        impl Future<Output = eyre::Result<AuthorizationCode>>,
    )> {
        let socket = tokio::net::TcpListener::bind(("127.0.0.1", self.port))
            .await
            .with_context(|| format!("bind to 127.0.0.1:{}", self.port))?;
        let addr = socket.local_addr().context("get local address")?;
        let url = RedirectUrl::new(format!("http://{addr}/"))
            .context("construct redirect url")?;
        let (tx, rx) = tokio::sync::oneshot::channel();
        tokio::spawn(async move {
            let (got, mut gotten) = tokio::sync::mpsc::channel(1);
            let r = async move {
                // Browsers like to open speculative connections, so keep accepting until some
                // connection delivers the redirect.
                loop {
                    tokio::select! {
                        accepted = socket.accept() => {
                            let (conn, _) = accepted.context("accept")?;
                            let conn = hyper_util::rt::TokioIo::new(conn);
                            let csrf = csrf.clone();
                            let got = got.clone();
                            let service = service_fn(move |req: Request<body::Incoming>| {
                                let csrf = csrf.clone();
                                let got = got.clone();
                                async move {
                                    let callback = Callback::from_query(
                                        req.uri().query().unwrap_or(""),
                                        csrf.secret(),
                                    );
                                    let (status, page, outcome) = match callback {
                                        Callback::Authorized(code) => {
                                            (StatusCode::OK, OAUTH_DONE, Some(Ok(code)))
                                        }
                                        Callback::Rejected(reason) => (
                                            StatusCode::BAD_REQUEST,
                                            "Authorization failed. You may close this window.",
                                            Some(Err(reason)),
                                        ),
                                        Callback::Unrelated => {
                                            (StatusCode::NOT_FOUND, "Not found", None)
                                        }
                                    };
                                    if let Some(outcome) = outcome {
                                        // only the first outcome counts
                                        let _ = got.try_send(outcome);
                                    }
                                    let mut response = Response::new(Full::<Bytes>::from(page));
                                    *response.status_mut() = status;
                                    Ok::<_, Infallible>(response)
                                }
                            });
                            tokio::spawn(async move {
                                if let Err(e) = hyper::server::conn::http1::Builder::new()
                                    .keep_alive(false)
                                    .serve_connection(conn, service)
                                    .await
                                {
                                    tracing::debug!(error = %e, "redirect connection failed");
                                }
                            });
                        }
                        outcome = gotten.recv() => {
                            return match outcome {
                                Some(Ok(code)) => Ok(code),
                                Some(Err(reason)) => Err(eyre::eyre!(reason)),
                                None => eyre::bail!("redirect handler went away"),
                            };
                        }
                    }
                }
            };
            let _ = tx.send(r.await);
        });
        Ok((url, async move {
            rx.await.context("redirect future dropped prematurely")?
        }))
    }
}

/// What a request to the redirect listener turned out to be.
#[derive(Debug)]
enum Callback {
    Authorized(AuthorizationCode),
    Rejected(String),
    /// Not an OAuth redirect at all (e.g. the browser asking for a favicon).
    Unrelated,
}

impl Callback {
    fn from_query(query: &str, expected_state: &str) -> Self {
        let mut presented_state = None;
        let mut presented_code = None;
        let mut presented_error = None;
        for (k, v) in form_urlencoded::parse(query.as_bytes()) {
            match &*k {
                "state" => presented_state = Some(v),
                "code" => presented_code = Some(v),
                "error" => presented_error = Some(v),
                _ => {}
            }
        }

        if presented_code.is_none() && presented_error.is_none() {
            return Self::Unrelated;
        }
        if presented_state.as_deref() != Some(expected_state) {
            return Self::Rejected("invalid csrf token".to_string());
        }
        if let Some(error) = presented_error {
            return Self::Rejected(format!("authorization denied: {error}"));
        }
        match presented_code {
            Some(code) => Self::Authorized(AuthorizationCode::new(code.into_owned())),
            None => Self::Unrelated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{INSTALLED_SECRET, MockEndpoint};

    #[test]
    fn installed_client_secret() {
        let config = ClientConfig::from_json(INSTALLED_SECRET).unwrap();
        assert_eq!(config.client_id.as_str(), "1234-abcd.apps.googleusercontent.com");
        assert_eq!(config.client_secret.secret(), "GOCSPX-not-really");
        assert_eq!(config.token_uri.as_str(), "https://oauth2.googleapis.com/token");
    }

    #[test]
    fn web_client_secret() {
        let json = INSTALLED_SECRET.replace("\"installed\"", "\"web\"");
        let config = ClientConfig::from_json(&json).unwrap();
        assert_eq!(config.auth_uri.as_str(), "https://accounts.google.com/o/oauth2/auth");
    }

    #[test]
    fn client_secret_without_client() {
        assert!(ClientConfig::from_json(r#"{"service_account": {}}"#).is_err());
        assert!(ClientConfig::from_json("not json").is_err());
    }

    #[test]
    fn client_secret_debug_is_redacted() {
        let config = ClientConfig::from_json(INSTALLED_SECRET).unwrap();
        assert!(!format!("{config:?}").contains("GOCSPX-not-really"));
    }

    #[tokio::test]
    async fn missing_client_secret_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClientConfig::from_file(&dir.path().join("client_secret.json"))
            .await
            .unwrap_err();
        assert!(format!("{err:?}").contains("client_secret.json"));
    }

    #[test]
    fn callback_with_code() {
        let callback = Callback::from_query("state=abc&code=4%2F0AX&scope=x", "abc");
        let code = match callback {
            Callback::Authorized(code) => code,
            other => panic!("expected a code, got {other:?}"),
        };
        assert_eq!(code.secret(), "4/0AX");
    }

    #[test]
    fn callback_with_wrong_state() {
        let callback = Callback::from_query("state=evil&code=123", "abc");
        assert!(matches!(callback, Callback::Rejected(ref r) if r == "invalid csrf token"));
        let callback = Callback::from_query("code=123", "abc");
        assert!(matches!(callback, Callback::Rejected(_)));
    }

    #[test]
    fn callback_with_denied_consent() {
        let callback = Callback::from_query("error=access_denied&state=abc", "abc");
        assert!(
            matches!(callback, Callback::Rejected(ref r) if r == "authorization denied: access_denied")
        );
    }

    #[test]
    fn callback_unrelated() {
        assert!(matches!(Callback::from_query("", "abc"), Callback::Unrelated));
        assert!(matches!(
            Callback::from_query("state=abc", "abc"),
            Callback::Unrelated
        ));
    }

    fn manager() -> OAuthManager {
        OAuthManager::new(ClientConfig::from_json(INSTALLED_SECRET).unwrap(), 0, false).unwrap()
    }

    #[tokio::test]
    async fn redirect_listener_yields_code() {
        let csrf = CsrfToken::new("expected-state".to_string());
        let manager = manager();
        let (url, code) = manager.setup_redirect(csrf).await.unwrap();
        // the URL has to name the address family the listener is bound to
        assert!(url.as_str().starts_with("http://127.0.0.1:"));

        let response = ::reqwest::get(format!("{}?state=expected-state&code=the-code", url.as_str()))
            .await
            .unwrap();
        assert_eq!(response.status(), ::reqwest::StatusCode::OK);
        assert_eq!(response.text().await.unwrap(), OAUTH_DONE);

        assert_eq!(code.await.unwrap().secret(), "the-code");
    }

    #[tokio::test]
    async fn redirect_listener_surfaces_denial() {
        let csrf = CsrfToken::new("expected-state".to_string());
        let manager = manager();
        let (url, code) = manager.setup_redirect(csrf).await.unwrap();

        let response =
            ::reqwest::get(format!("{}?error=access_denied&state=expected-state", url.as_str()))
                .await
                .unwrap();
        assert_eq!(response.status(), ::reqwest::StatusCode::BAD_REQUEST);

        let err = code.await.unwrap_err();
        assert!(format!("{err:?}").contains("access_denied"));
    }

    #[tokio::test]
    async fn refresh_without_refresh_token() {
        let token = BasicTokenResponse::new(
            oauth2::AccessToken::new("at".to_string()),
            oauth2::basic::BasicTokenType::Bearer,
            oauth2::EmptyExtraTokenFields {},
        );
        assert!(manager().refresh_token(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn revoked_refresh_token_yields_none() {
        let mut token_endpoint = MockEndpoint::serve(
            StatusCode::BAD_REQUEST,
            r#"{"error":"invalid_grant","error_description":"Token has been expired or revoked."}"#,
        )
        .await
        .unwrap();
        let secret = INSTALLED_SECRET.replace(
            "https://oauth2.googleapis.com/token",
            &format!("{}/token", token_endpoint.base_url),
        );
        let manager =
            OAuthManager::new(ClientConfig::from_json(&secret).unwrap(), 0, false).unwrap();

        let mut token = BasicTokenResponse::new(
            oauth2::AccessToken::new("at".to_string()),
            oauth2::basic::BasicTokenType::Bearer,
            oauth2::EmptyExtraTokenFields {},
        );
        token.set_refresh_token(Some(oauth2::RefreshToken::new("revoked".to_string())));

        assert!(manager.refresh_token(&token).await.unwrap().is_none());
        let seen = token_endpoint.next_request().await;
        assert!(seen.body.contains("refresh_token=revoked"));
    }
}
