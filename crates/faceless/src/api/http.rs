//! `reqwest` implementation of [`VideoApi`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::media::MediaResolver;
use super::models::{CreateVideoRequest, Video, VideoListResponse};
use super::VideoApi;
use crate::config::Settings;
use crate::error::{ApiError, ConfigError, FacelessError};

/// Maximum length for error bodies carried into error messages.
const MAX_ERROR_BODY_LENGTH: usize = 200;

/// Default connect timeout for HTTP requests (10 seconds).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default request timeout for HTTP requests (30 seconds).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Which call produced a response; decides how a 4xx is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Create,
    Get,
    List,
    Delete,
    Download,
}

impl Operation {
    fn describe(&self) -> &'static str {
        match self {
            Operation::Create => "create video",
            Operation::Get => "fetch video",
            Operation::List => "list videos",
            Operation::Delete => "delete video",
            Operation::Download => "download video",
        }
    }
}

/// Extracts a readable message from an error body, truncating long bodies.
///
/// FastAPI-style `{"detail": "..."}` bodies yield just the detail.
fn error_message(body: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string));
    let message = detail.unwrap_or_else(|| body.trim().to_string());

    if message.len() > MAX_ERROR_BODY_LENGTH {
        let mut cut = MAX_ERROR_BODY_LENGTH;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}... (truncated)", &message[..cut])
    } else {
        message
    }
}

/// Maps a non-2xx status onto the error taxonomy.
fn classify(operation: Operation, id: Option<&str>, status: StatusCode, body: &str) -> ApiError {
    let message = error_message(body);

    if status == StatusCode::NOT_FOUND {
        return ApiError::NotFound(id.unwrap_or("videos").to_string());
    }

    if status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
    {
        return ApiError::Transient(format!(
            "Failed to {} ({}): {}",
            operation.describe(),
            status,
            message
        ));
    }

    match operation {
        Operation::Create => ApiError::CreationRejected {
            status: status.as_u16(),
            message,
        },
        _ => ApiError::Rejected {
            status: status.as_u16(),
            message,
        },
    }
}

fn transport_error(operation: Operation, err: reqwest::Error) -> ApiError {
    if err.is_decode() {
        ApiError::Decode(format!("{}: {}", operation.describe(), err))
    } else {
        ApiError::Transient(format!("Failed to {}: {}", operation.describe(), err))
    }
}

/// Creates an HTTP client with the given timeouts.
fn create_http_client(
    connect_timeout: Duration,
    request_timeout: Duration,
) -> Result<Client, ConfigError> {
    Client::builder()
        .connect_timeout(connect_timeout)
        .timeout(request_timeout)
        .build()
        .map_err(|e| ConfigError::Validation {
            message: format!("Failed to create HTTP client: {}", e),
        })
}

/// `video.mp4` downloads into `video.mp4.part`.
fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

async fn write_body(response: &mut Response, path: &Path) -> Result<u64, FacelessError> {
    let io_err = |source: std::io::Error| FacelessError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = tokio::fs::File::create(path).await.map_err(io_err)?;
    let mut written: u64 = 0;

    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| transport_error(Operation::Download, e))?
    {
        file.write_all(&chunk).await.map_err(io_err)?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(io_err)?;

    Ok(written)
}

/// Moves a complete download into place, or discards the partial file.
async fn finish_download(
    tmp: &Path,
    dest: &Path,
    result: Result<u64, FacelessError>,
) -> Result<u64, FacelessError> {
    match result {
        Ok(written) => {
            tokio::fs::rename(tmp, dest)
                .await
                .map_err(|source| FacelessError::Io {
                    path: dest.to_path_buf(),
                    source,
                })?;
            Ok(written)
        }
        Err(e) => {
            if let Err(cleanup) = tokio::fs::remove_file(tmp).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to remove partial download {}: {}", tmp.display(), cleanup);
                }
            }
            Err(e)
        }
    }
}

/// Video API client over HTTP.
#[derive(Clone)]
pub struct HttpVideoApi {
    client: Client,
    media: MediaResolver,
}

impl HttpVideoApi {
    /// Creates a client for `base_url` with the default timeouts.
    pub fn new(base_url: &str) -> Result<Self, FacelessError> {
        Self::with_timeouts(base_url, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeouts(
        base_url: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, FacelessError> {
        Ok(Self {
            client: create_http_client(connect_timeout, request_timeout)?,
            media: MediaResolver::new(base_url),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, FacelessError> {
        Self::with_timeouts(
            &settings.api_base_url,
            settings.connect_timeout(),
            settings.request_timeout(),
        )
    }

    /// Resolver bound to the same base URL as this client.
    pub fn media(&self) -> &MediaResolver {
        &self.media
    }

    /// URL for a single video. Ids that cannot name one path segment are
    /// reported as not found without sending a request.
    fn video_url(&self, id: &str, suffix: Option<&str>) -> Result<String, ApiError> {
        if matches!(id, "" | "." | "..") {
            return Err(ApiError::NotFound(id.to_string()));
        }
        Ok(self.media.video_endpoint(id, suffix))
    }

    async fn send(
        &self,
        request: RequestBuilder,
        operation: Operation,
        id: Option<&str>,
    ) -> Result<Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(operation, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = classify(operation, id, status, &body);
        debug!("{} returned {}: {}", operation.describe(), status, err);
        Err(err)
    }

    /// Streams the rendered video to `dest`, returning the number of bytes written.
    ///
    /// Bytes go to a `.part` file next to `dest` that is renamed once the
    /// body is complete; an interrupted download leaves nothing behind.
    pub async fn download_to(&self, id: &str, dest: &Path) -> Result<u64, FacelessError> {
        let url = self.video_url(id, Some("download"))?;
        info!("Downloading video {} to {}", id, dest.display());

        let mut response = self
            .send(self.client.get(&url), Operation::Download, Some(id))
            .await?;

        let tmp = partial_path(dest);
        let result = write_body(&mut response, &tmp).await;
        let written = finish_download(&tmp, dest, result).await?;

        info!("Downloaded {} bytes for video {}", written, id);
        Ok(written)
    }
}

#[async_trait]
impl VideoApi for HttpVideoApi {
    async fn create_video(&self, request: &CreateVideoRequest) -> Result<Video, ApiError> {
        info!(
            "Creating video for topic '{}' ({}s)",
            request.topic, request.duration
        );
        let response = self
            .send(
                self.client.post(self.media.endpoint("videos")).json(request),
                Operation::Create,
                None,
            )
            .await?;

        let video: Video = response
            .json()
            .await
            .map_err(|e| transport_error(Operation::Create, e))?;
        info!("Created video job {}", video.id);
        Ok(video.normalized())
    }

    async fn get_video(&self, id: &str) -> Result<Video, ApiError> {
        let url = self.video_url(id, None)?;
        let response = self
            .send(self.client.get(url), Operation::Get, Some(id))
            .await?;

        let video: Video = response
            .json()
            .await
            .map_err(|e| transport_error(Operation::Get, e))?;
        Ok(video.normalized())
    }

    async fn list_videos(&self) -> Result<Vec<Video>, ApiError> {
        let response = self
            .send(
                self.client.get(self.media.endpoint("videos")),
                Operation::List,
                None,
            )
            .await?;

        let list: VideoListResponse = response
            .json()
            .await
            .map_err(|e| transport_error(Operation::List, e))?;
        if let Some(total) = list.total {
            if total as usize != list.videos.len() {
                warn!(
                    "Backend reported {} videos but returned {}",
                    total,
                    list.videos.len()
                );
            }
        }
        Ok(list.videos.into_iter().map(Video::normalized).collect())
    }

    async fn delete_video(&self, id: &str) -> Result<(), ApiError> {
        let url = self.video_url(id, None)?;
        self.send(self.client.delete(url), Operation::Delete, Some(id))
            .await?;
        info!("Deleted video {}", id);
        Ok(())
    }
}
