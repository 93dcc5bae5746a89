//! Mock HTTP endpoint for exercising the API client and token refresh without Google.
//!
//! [`MockEndpoint::serve`] answers every request on one local connection with the same canned
//! response and reports what it was asked through [`MockEndpoint::next_request`].

use bytes::Bytes;
use eyre::{Context, Result};
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode, body};
use std::convert::Infallible;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// A desktop-client `client_secret.json` as downloaded from the Cloud Console.
pub(crate) const INSTALLED_SECRET: &str = r#"{
    "installed": {
        "client_id": "1234-abcd.apps.googleusercontent.com",
        "project_id": "video-info",
        "auth_uri": "https://accounts.google.com/o/oauth2/auth",
        "token_uri": "https://oauth2.googleapis.com/token",
        "auth_provider_x509_cert_url": "https://www.googleapis.com/oauth2/v1/certs",
        "client_secret": "GOCSPX-not-really",
        "redirect_uris": ["http://localhost"]
    }
}"#;

/// A `videos.list` answer for one video. Like most public videos it has no dislike count.
pub(crate) const VIDEO_RESPONSE: &str = r#"{
    "kind": "youtube#videoListResponse",
    "etag": "abc",
    "items": [{
        "kind": "youtube#video",
        "etag": "def",
        "id": "jNQXAC9IVRw",
        "snippet": {
            "publishedAt": "2005-04-24T03:31:52Z",
            "channelId": "UC4QobU6STFB0P71PMvOGN5A",
            "title": "Me at the zoo",
            "description": "The first video on YouTube.",
            "channelTitle": "jawed",
            "categoryId": "1"
        },
        "contentDetails": {
            "duration": "PT19S",
            "dimension": "2d",
            "definition": "sd"
        },
        "statistics": {
            "viewCount": "123",
            "likeCount": "456",
            "favoriteCount": "0",
            "commentCount": "789"
        }
    }],
    "pageInfo": {"totalResults": 1, "resultsPerPage": 1}
}"#;

/// What the client sent, as seen by the mock.
#[derive(Debug, Clone)]
pub(crate) struct SeenRequest {
    pub(crate) method: http::Method,
    pub(crate) path: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) authorization: Option<String>,
    pub(crate) body: String,
}

impl SeenRequest {
    pub(crate) fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

pub(crate) struct MockEndpoint {
    pub(crate) base_url: String,
    seen: mpsc::UnboundedReceiver<SeenRequest>,
}

impl MockEndpoint {
    /// Start serving `body` with `status` on an ephemeral localhost port.
    pub(crate) async fn serve(status: StatusCode, body: impl Into<String>) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind mock endpoint")?;
        let addr = listener.local_addr().context("get mock address")?;
        let canned = Bytes::from(body.into());
        let (tx, seen) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let Ok((conn, _)) = listener.accept().await else {
                return;
            };
            let service = service_fn(move |req: Request<body::Incoming>| {
                let tx = tx.clone();
                let canned = canned.clone();
                async move {
                    let (parts, incoming) = req.into_parts();
                    let received = incoming
                        .collect()
                        .await
                        .map(|b| String::from_utf8_lossy(&b.to_bytes()).into_owned())
                        .unwrap_or_default();
                    let _ = tx.send(SeenRequest {
                        method: parts.method,
                        path: parts.uri.path().to_string(),
                        query: form_urlencoded::parse(
                            parts.uri.query().unwrap_or("").as_bytes(),
                        )
                        .into_owned()
                        .collect(),
                        authorization: parts
                            .headers
                            .get(http::header::AUTHORIZATION)
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string),
                        body: received,
                    });
                    let mut response = Response::new(Full::new(canned));
                    *response.status_mut() = status;
                    response.headers_mut().insert(
                        http::header::CONTENT_TYPE,
                        http::HeaderValue::from_static("application/json"),
                    );
                    Ok::<_, Infallible>(response)
                }
            });
            let _ = hyper::server::conn::http1::Builder::new()
                .serve_connection(hyper_util::rt::TokioIo::new(conn), service)
                .await;
        });

        Ok(Self {
            base_url: format!("http://{addr}"),
            seen,
        })
    }

    pub(crate) async fn next_request(&mut self) -> SeenRequest {
        self.seen
            .recv()
            .await
            .expect("mock endpoint was asked at least once")
    }
}
