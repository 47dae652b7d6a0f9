//! Local library of finished videos.
//!
//! Persistence is a capability ([`LibraryStore`]) injected into [`Library`],
//! so the file-backed store can be swapped for [`MemoryStore`] in tests or
//! when embedding the client.

pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::{MediaResolver, Video};
use crate::error::LibraryError;

pub use store::{JsonFileStore, LibraryStore, MemoryStore};

/// A finished video remembered locally, with media paths already resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LibraryEntry {
    pub id: String,
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub download_url: String,
    pub created_at: DateTime<Utc>,
    pub saved_at: DateTime<Utc>,
}

impl LibraryEntry {
    pub fn from_video(video: &Video, media: &MediaResolver) -> Self {
        Self {
            id: video.id.clone(),
            topic: video.topic.clone(),
            video_url: video.video_url.as_deref().and_then(|p| media.resolve(p)),
            thumbnail_url: video.thumbnail_url.as_deref().and_then(|p| media.resolve(p)),
            download_url: media.download_url(&video.id),
            created_at: video.created_at,
            saved_at: Utc::now(),
        }
    }
}

/// Library operations over an injected store.
pub struct Library<S: LibraryStore> {
    store: S,
}

impl<S: LibraryStore> Library<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// All entries in insertion order.
    pub fn list(&self) -> Result<Vec<LibraryEntry>, LibraryError> {
        self.store.load()
    }

    pub fn get(&self, id: &str) -> Result<Option<LibraryEntry>, LibraryError> {
        Ok(self.store.load()?.into_iter().find(|entry| entry.id == id))
    }

    /// Adds an entry, replacing any existing entry with the same id in place.
    pub fn add(&self, entry: LibraryEntry) -> Result<(), LibraryError> {
        let mut entries = self.store.load()?;
        match entries.iter_mut().find(|existing| existing.id == entry.id) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
        debug!("Library now holds {} entries", entries.len());
        self.store.save(&entries)
    }

    /// Removes the entry with `id`. Returns whether anything was removed.
    pub fn remove(&self, id: &str) -> Result<bool, LibraryError> {
        let mut entries = self.store.load()?;
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        if entries.len() == before {
            return Ok(false);
        }
        self.store.save(&entries)?;
        Ok(true)
    }
}
