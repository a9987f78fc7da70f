// Camera HTTP client
//
// Wraps `reqwest::Client` with the camera's CGI URL scheme and digest
// authentication. One `DeviceClient` per camera; credentials are never
// shared between devices.

use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures_core::Stream;
use futures_util::StreamExt;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use secrecy::SecretString;
use tracing::{debug, trace};
use url::Url;

use crate::attach::{AttachRecord, classify_block};
use crate::digest;
use crate::error::Error;
use crate::transport::TransportConfig;
use crate::wire::{
    KeyValues, boundary_from_content_type, extract_block_body, parse_key_value_text,
    split_multipart_blocks,
};

const CGI_PATH: &str = "cgi-bin/videoStatServer.cgi";

/// Longest error body we keep for diagnostics.
const MAX_ERROR_BODY: usize = 512;

type BlockStream = Pin<Box<dyn Stream<Item = Result<Bytes, Error>> + Send>>;

// ── DeviceClient ─────────────────────────────────────────────────────

/// HTTP client for one people-counting camera.
///
/// Every request is first sent without credentials; a `401` digest
/// challenge is answered once. A second `401` is reported as
/// [`Error::Authentication`].
pub struct DeviceClient {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    password: SecretString,
    transport: TransportConfig,
}

impl DeviceClient {
    /// Create a client for the camera at `base_url` (e.g. `http://10.0.0.5:80/`).
    pub fn new(
        base_url: Url,
        username: String,
        password: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(
            http,
            base_url,
            username,
            password,
            transport.clone(),
        ))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        username: String,
        password: SecretString,
        transport: TransportConfig,
    ) -> Self {
        Self {
            http,
            base_url,
            username,
            password,
            transport,
        }
    }

    /// Base URL for a plain-HTTP camera at `host:port`.
    pub fn http_base_url(host: &str, port: u16) -> Result<Url, Error> {
        Ok(Url::parse(&format!("http://{host}:{port}/"))?)
    }

    /// The camera base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Open the long-lived `attach` stream for `channel`.
    ///
    /// Returns once the response headers arrived with a success status
    /// and a multipart boundary. The stream itself is read with
    /// [`AttachStream::next_record`].
    pub async fn attach(&self, channel: u32, heartbeat_secs: u64) -> Result<AttachStream, Error> {
        let url = self.cgi_url(&[
            ("action", "attach".into()),
            ("channel", channel.to_string()),
            ("heartbeat", heartbeat_secs.to_string()),
        ])?;

        let resp = self.get_authenticated(url, None).await?;

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        debug!(content_type = %content_type, "attach stream opened");

        let boundary =
            boundary_from_content_type(&content_type).ok_or_else(|| Error::MissingBoundary {
                content_type: content_type.clone(),
            })?;

        let chunks = guard_idle(resp, self.transport.idle_timeout);
        let blocks: BlockStream = Box::pin(split_multipart_blocks(chunks, Some(boundary)));

        Ok(AttachStream {
            blocks,
            content_type,
        })
    }

    /// One-shot `getSummary` for `channel`, optionally filtered by rule area.
    pub async fn get_summary(
        &self,
        channel: u32,
        rule_area: Option<&str>,
    ) -> Result<KeyValues, Error> {
        let mut query = vec![
            ("action", "getSummary".to_owned()),
            ("channel", channel.to_string()),
        ];
        if let Some(name) = rule_area {
            query.push(("name", name.to_owned()));
        }
        let url = self.cgi_url(&query)?;

        let resp = self
            .get_authenticated(url, Some(self.transport.request_timeout))
            .await?;
        let body = resp.text().await?;
        trace!(body = %body, "getSummary response");

        Ok(parse_key_value_text(&body))
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn cgi_url(&self, query: &[(&str, String)]) -> Result<Url, Error> {
        let mut url = self.base_url.join(CGI_PATH)?;
        url.query_pairs_mut()
            .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        Ok(url)
    }

    /// GET `url`, answering a digest challenge if the camera sends one.
    async fn get_authenticated(
        &self,
        url: Url,
        timeout: Option<Duration>,
    ) -> Result<reqwest::Response, Error> {
        debug!("GET {}", url);

        let resp = self.request(url.clone(), timeout, None).send().await?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return check_status(resp).await;
        }

        let challenge =
            digest::digest_challenge(resp.headers()).ok_or_else(|| Error::Authentication {
                message: "camera requires authentication but sent no digest challenge".into(),
            })?;
        let authorization =
            digest::authorization(&challenge, &url, &self.username, &self.password)?;

        let resp = self
            .request(url, timeout, Some(authorization))
            .send()
            .await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: format!("credentials for '{}' rejected", self.username),
            });
        }
        check_status(resp).await
    }

    fn request(
        &self,
        url: Url,
        timeout: Option<Duration>,
        authorization: Option<String>,
    ) -> reqwest::RequestBuilder {
        let mut request = self.http.get(url);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        if let Some(value) = authorization {
            request = request.header(AUTHORIZATION, value);
        }
        request
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let mut body = resp.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    Err(Error::Status {
        status: status.as_u16(),
        body,
    })
}

/// Turn the response body into a chunk stream that fails when the camera
/// goes quiet for longer than `idle`, and reports a clean end as
/// [`Error::StreamEnded`] (the attach stream is never supposed to end).
fn guard_idle(
    resp: reqwest::Response,
    idle: Duration,
) -> impl Stream<Item = Result<Bytes, Error>> + Send {
    async_stream::stream! {
        let mut chunks = std::pin::pin!(resp.bytes_stream());
        loop {
            match tokio::time::timeout(idle, chunks.next()).await {
                Ok(Some(Ok(chunk))) => yield Ok(chunk),
                Ok(Some(Err(e))) => {
                    yield Err(Error::Transport(e));
                    return;
                }
                Ok(None) => {
                    yield Err(Error::StreamEnded);
                    return;
                }
                Err(_) => {
                    yield Err(Error::IdleTimeout { secs: idle.as_secs() });
                    return;
                }
            }
        }
    }
}

// ── AttachStream ─────────────────────────────────────────────────────

/// An open attach stream, decoded block by block.
///
/// Strictly sequential: records come out in the order the camera sent
/// them. Any error is terminal for this connection.
pub struct AttachStream {
    blocks: BlockStream,
    content_type: String,
}

impl AttachStream {
    /// The `Content-Type` the camera declared for this stream.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Wait for the next non-empty block and classify it.
    ///
    /// Blocks without a body are skipped. Heartbeats are returned so the
    /// caller can observe liveness.
    pub async fn next_record(&mut self) -> Result<AttachRecord, Error> {
        loop {
            let block = self.blocks.next().await.ok_or(Error::StreamEnded)??;
            if let Some(body) = extract_block_body(&block) {
                trace!(body = %body, "attach block");
                return Ok(classify_block(&body));
            }
        }
    }
}
