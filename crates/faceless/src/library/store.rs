use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use super::LibraryEntry;
use crate::error::LibraryError;

/// Persistence capability for the library collection.
pub trait LibraryStore: Send + Sync {
    fn load(&self) -> Result<Vec<LibraryEntry>, LibraryError>;
    fn save(&self, entries: &[LibraryEntry]) -> Result<(), LibraryError>;
}

/// Stores the library as a JSON array in a single file.
///
/// A missing file reads as an empty library. Writes go to a sibling
/// temporary file that is renamed over the target.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> LibraryError {
        LibraryError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl LibraryStore for JsonFileStore {
    fn load(&self) -> Result<Vec<LibraryEntry>, LibraryError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(&self.path, e)),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, entries: &[LibraryEntry]) -> Result<(), LibraryError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(parent, e))?;
        }

        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| self.io_error(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(&self.path, e))?;

        debug!(
            "Saved {} library entries to {}",
            entries.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<Vec<LibraryEntry>>,
}

impl MemoryStore {
    pub fn with_entries(entries: Vec<LibraryEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }
}

impl LibraryStore for MemoryStore {
    fn load(&self) -> Result<Vec<LibraryEntry>, LibraryError> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .map_err(|_| LibraryError::LockPoisoned)
    }

    fn save(&self, entries: &[LibraryEntry]) -> Result<(), LibraryError> {
        let mut guard = self.entries.lock().map_err(|_| LibraryError::LockPoisoned)?;
        *guard = entries.to_vec();
        Ok(())
    }
}

impl<S: LibraryStore + ?Sized> LibraryStore for std::sync::Arc<S> {
    fn load(&self) -> Result<Vec<LibraryEntry>, LibraryError> {
        (**self).load()
    }

    fn save(&self, entries: &[LibraryEntry]) -> Result<(), LibraryError> {
        (**self).save(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn entry(id: &str) -> LibraryEntry {
        LibraryEntry {
            id: id.to_string(),
            topic: "Rainforests".to_string(),
            video_url: Some(format!("http://localhost:8000/api/media/{}.mp4", id)),
            thumbnail_url: None,
            download_url: format!("http://localhost:8000/api/videos/{}/download", id),
            created_at: Utc::now(),
            saved_at: Utc::now(),
        }
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("library.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_creates_parent_and_reloads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("library.json");
        let store = JsonFileStore::new(&path);

        store.save(&[entry("a"), entry("b")]).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let reopened = JsonFileStore::new(&path);
        let entries = reopened.load().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].id, "b");
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("library.json");
        fs::write(&path, "{not json").unwrap();

        let err = JsonFileStore::new(&path).load().unwrap_err();
        assert!(matches!(err, LibraryError::Serialize(_)));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::with_entries(vec![entry("a")]);
        assert_eq!(store.load().unwrap().len(), 1);
        store.save(&[]).unwrap();
        assert!(store.load().unwrap().is_empty());
    }
}
