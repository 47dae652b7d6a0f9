//! Application state shared by all commands.

use std::sync::Arc;

use tracing::{info, warn};

use faceless::{
    Dashboard, FacelessError, HttpVideoApi, JsonFileStore, LibraryStore, MemoryStore, Settings,
};

pub struct AppState {
    pub settings: Settings,
    /// HTTP client, also used directly for downloads.
    pub api: Arc<HttpVideoApi>,
    pub dashboard: Arc<Dashboard>,
}

impl AppState {
    pub fn new(settings: Settings) -> Result<Self, FacelessError> {
        let api = Arc::new(HttpVideoApi::from_settings(&settings)?);
        let store = open_library_store(&settings);
        let dashboard = Arc::new(Dashboard::new(api.clone(), &settings, store));

        Ok(Self {
            settings,
            api,
            dashboard,
        })
    }
}

/// Opens the file-backed library, or an in-memory one when no data
/// directory can be determined.
fn open_library_store(settings: &Settings) -> Arc<dyn LibraryStore> {
    match settings.resolved_library_path() {
        Some(path) => {
            info!("Using library at {}", path.display());
            Arc::new(JsonFileStore::new(path))
        }
        None => {
            warn!("Could not determine a data directory, library will not be saved");
            Arc::new(MemoryStore::default())
        }
    }
}
