//! GitHub REST API client for the repositories endpoints.
//!
//! Each operation is exactly one HTTP round-trip that returns a decoded
//! [`RemoteRepository`] or a classified [`ClientError`]. There is no retry,
//! caching, pagination or redirect following; a 3xx is an unexpected status.
//! Authentication, API versioning and the timeout are applied in one shared
//! request path.
//!
//! | Operation | Method | Path                    | Success |
//! |-----------|--------|-------------------------|---------|
//! | get       | GET    | `/repos/{owner}/{name}` | 200     |
//! | create    | POST   | `/user/repos`           | 201     |
//! | update    | PATCH  | `/repos/{owner}/{name}` | 200     |
//! | delete    | DELETE | `/repos/{owner}/{name}` | 204     |

use std::sync::Arc;

use reqwest::{header, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::config::ProviderConfig;
use crate::error::{ClientError, ProviderError, TransportError};
use crate::types::{CreateRepository, RemoteRepository, UpdateRepository};

/// Versioned media type sent in the `Accept` header.
pub const ACCEPT_MEDIA_TYPE: &str = "application/vnd.github.v3+json";

/// Header pinning the REST API version.
pub const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";

/// REST API version this client speaks.
pub const API_VERSION: &str = "2022-11-28";

/// Maximum length of response body to log
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Status and fully drained body of one response.
struct RawResponse {
    status: StatusCode,
    body: Vec<u8>,
}

/// Client for the GitHub repositories API.
///
/// Cloning is cheap and clones share the connection pool. The client holds no
/// mutable state, so one instance can serve concurrent transitions on
/// different resources.
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    config: Arc<ProviderConfig>,
}

impl GitHubClient {
    /// Build a client from a static configuration.
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| {
                ProviderError::Configuration(format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    /// Fetch a repository. A 404 is reported as [`ClientError::NotFound`].
    #[instrument(skip(self, ctx), name = "github.get_repo")]
    pub async fn get(
        &self,
        ctx: &CancellationToken,
        owner: &str,
        name: &str,
    ) -> Result<RemoteRepository, ClientError> {
        let raw = self
            .send(ctx, Method::GET, &repo_path(owner, name), None)
            .await?;

        match raw.status {
            StatusCode::OK => decode(&raw),
            StatusCode::NOT_FOUND => Err(ClientError::NotFound),
            _ => Err(unexpected_status(raw)),
        }
    }

    /// Create a repository for the authenticated user.
    #[instrument(skip(self, ctx, directive), name = "github.create_repo", fields(name = %directive.name))]
    pub async fn create(
        &self,
        ctx: &CancellationToken,
        directive: &CreateRepository,
    ) -> Result<RemoteRepository, ClientError> {
        let body = encode(directive)?;
        let raw = self
            .send(ctx, Method::POST, "/user/repos", Some(body))
            .await?;

        match raw.status {
            StatusCode::CREATED => decode(&raw),
            _ => Err(unexpected_status(raw)),
        }
    }

    /// Update the mutable settings of a repository.
    #[instrument(skip(self, ctx, directive), name = "github.update_repo")]
    pub async fn update(
        &self,
        ctx: &CancellationToken,
        owner: &str,
        name: &str,
        directive: &UpdateRepository,
    ) -> Result<RemoteRepository, ClientError> {
        let body = encode(directive)?;
        let raw = self
            .send(ctx, Method::PATCH, &repo_path(owner, name), Some(body))
            .await?;

        match raw.status {
            StatusCode::OK => decode(&raw),
            _ => Err(unexpected_status(raw)),
        }
    }

    /// Delete a repository. Only 204 counts as success; a 404 is a
    /// [`ClientError::Remote`] like any other unexpected status.
    #[instrument(skip(self, ctx), name = "github.delete_repo")]
    pub async fn delete(
        &self,
        ctx: &CancellationToken,
        owner: &str,
        name: &str,
    ) -> Result<(), ClientError> {
        let raw = self
            .send(ctx, Method::DELETE, &repo_path(owner, name), None)
            .await?;

        match raw.status {
            StatusCode::NO_CONTENT => Ok(()),
            _ => Err(unexpected_status(raw)),
        }
    }

    /// Build, authenticate and send one request, then drain the response body.
    ///
    /// Fails with [`TransportError::Cancelled`] without touching the network if
    /// `ctx` is already cancelled, and aborts the round-trip if it is cancelled
    /// while in flight.
    async fn send(
        &self,
        ctx: &CancellationToken,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<RawResponse, ClientError> {
        if ctx.is_cancelled() {
            return Err(TransportError::Cancelled.into());
        }

        debug!(%method, path, "Sending GitHub API request");

        let url = format!("{}{}", self.config.base_url, path);
        let mut request = self
            .http
            .request(method, url)
            .bearer_auth(&self.config.token)
            .header(header::ACCEPT, ACCEPT_MEDIA_TYPE)
            .header(API_VERSION_HEADER, API_VERSION);
        if let Some(body) = body {
            request = request
                .header(header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let round_trip = async move {
            let response = request.send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>(RawResponse {
                status,
                body: body.to_vec(),
            })
        };

        tokio::select! {
            biased;
            _ = ctx.cancelled() => Err(TransportError::Cancelled.into()),
            result = round_trip => result.map_err(|e| self.transport_error(e)),
        }
    }

    fn transport_error(&self, err: reqwest::Error) -> ClientError {
        let err = if err.is_timeout() {
            TransportError::TimedOut(self.config.timeout())
        } else {
            TransportError::Http(err)
        };
        ClientError::Transport(err)
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn repo_path(owner: &str, name: &str) -> String {
    format!(
        "/repos/{}/{}",
        urlencoding::encode(owner),
        urlencoding::encode(name)
    )
}

fn encode<T: Serialize>(payload: &T) -> Result<Vec<u8>, ClientError> {
    serde_json::to_vec(payload).map_err(ClientError::Encode)
}

fn decode<T: DeserializeOwned>(raw: &RawResponse) -> Result<T, ClientError> {
    serde_json::from_slice(&raw.body).map_err(ClientError::Decode)
}

fn unexpected_status(raw: RawResponse) -> ClientError {
    let body = String::from_utf8_lossy(&raw.body);
    warn!(
        status = raw.status.as_u16(),
        body = %sanitize_for_log(&body),
        "GitHub API returned an unexpected status"
    );
    ClientError::remote(raw.status.as_u16(), error_message(&raw.body))
}

/// The `message` field of a GitHub error body.
fn error_message(body: &[u8]) -> Option<String> {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: String,
    }

    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .map(|b| b.message)
}

/// Truncate a response body and strip control characters before logging it.
fn sanitize_for_log(body: &str) -> String {
    let truncated: String = body.chars().take(MAX_LOG_BODY_LENGTH).collect();
    let truncated = if truncated.len() < body.len() {
        format!("{}... [truncated, {} bytes total]", truncated, body.len())
    } else {
        truncated
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}
