//! Client side of the video job API.
//!
//! [`VideoApi`] is the seam the poller and dashboard depend on;
//! [`HttpVideoApi`] is the `reqwest` implementation used in production.

pub mod http;
pub mod media;
pub mod models;

use async_trait::async_trait;

use crate::error::ApiError;

pub use http::HttpVideoApi;
pub use media::MediaResolver;
pub use models::{CreateVideoRequest, Video, VideoListResponse, VideoStatus, PROGRESS_STEPS};

/// Operations the dashboard needs from the video backend.
#[async_trait]
pub trait VideoApi: Send + Sync {
    /// `POST /videos`
    async fn create_video(&self, request: &CreateVideoRequest) -> Result<Video, ApiError>;

    /// `GET /videos/{id}`
    async fn get_video(&self, id: &str) -> Result<Video, ApiError>;

    /// `GET /videos`, in backend order.
    async fn list_videos(&self) -> Result<Vec<Video>, ApiError>;

    /// `DELETE /videos/{id}`
    async fn delete_video(&self, id: &str) -> Result<(), ApiError>;
}
