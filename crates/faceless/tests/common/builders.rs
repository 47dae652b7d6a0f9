//! Builders for video projections used across tests.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};

use faceless::{Video, VideoStatus};

/// Builder for creating `Video` projections.
pub struct VideoBuilder {
    video: Video,
}

impl VideoBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            video: Video {
                id: id.to_string(),
                topic: "10 facts about space".to_string(),
                status: VideoStatus::Pending,
                progress: 0,
                script: None,
                audio_url: None,
                video_url: None,
                thumbnail_url: None,
                error_message: None,
                created_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
                updated_at: None,
            },
        }
    }

    pub fn topic(mut self, topic: &str) -> Self {
        self.video.topic = topic.to_string();
        self
    }

    pub fn status(mut self, status: VideoStatus, progress: u8) -> Self {
        self.video.status = status;
        self.video.progress = progress;
        self
    }

    pub fn script(mut self, script: &str) -> Self {
        self.video.script = Some(script.to_string());
        self
    }

    pub fn video_url(mut self, url: &str) -> Self {
        self.video.video_url = Some(url.to_string());
        self
    }

    pub fn thumbnail_url(mut self, url: &str) -> Self {
        self.video.thumbnail_url = Some(url.to_string());
        self
    }

    pub fn error_message(mut self, message: &str) -> Self {
        self.video.error_message = Some(message.to_string());
        self
    }

    pub fn build(self) -> Video {
        self.video
    }
}

pub fn pending(id: &str) -> Video {
    VideoBuilder::new(id).build()
}

pub fn at(id: &str, status: VideoStatus, progress: u8) -> Video {
    VideoBuilder::new(id).status(status, progress).build()
}

pub fn completed(id: &str) -> Video {
    VideoBuilder::new(id)
        .status(VideoStatus::Completed, 100)
        .video_url(&format!("media/{}.mp4", id))
        .build()
}

pub fn failed(id: &str, reason: &str) -> Video {
    VideoBuilder::new(id)
        .status(VideoStatus::Failed, 40)
        .error_message(reason)
        .build()
}
