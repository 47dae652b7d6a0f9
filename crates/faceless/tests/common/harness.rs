//! Scripted backend and dashboard harness.
//!
//! `FakeVideoApi` answers from queues set up by the test and counts every
//! call, so tests can assert exactly how many requests a flow made.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use faceless::api::CreateVideoRequest;
use faceless::{
    ApiError, Dashboard, JsonFileStore, LibraryStore, MemoryStore, Settings, Video, VideoApi,
    VideoStatus,
};

use super::builders::VideoBuilder;

/// In-memory video backend driven by scripted responses.
#[derive(Default)]
pub struct FakeVideoApi {
    create_result: Mutex<Option<Result<Video, ApiError>>>,
    create_delay: Mutex<Option<Duration>>,
    get_delay: Mutex<Option<Duration>>,
    get_script: Mutex<VecDeque<Result<Video, ApiError>>>,
    /// Status reported once the script is exhausted.
    get_fallback: Mutex<Option<VideoStatus>>,
    list_result: Mutex<Option<Result<Vec<Video>, ApiError>>>,
    delete_result: Mutex<Option<Result<(), ApiError>>>,

    pub created: Mutex<Vec<CreateVideoRequest>>,
    pub fetched_ids: Mutex<Vec<String>>,
    pub deleted_ids: Mutex<Vec<String>>,
    create_calls: AtomicUsize,
    get_calls: AtomicUsize,
    list_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl FakeVideoApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on_create(&self, result: Result<Video, ApiError>) {
        *self.create_result.lock().unwrap() = Some(result);
    }

    /// Makes creation take `delay` before answering.
    pub fn delay_create(&self, delay: Duration) {
        *self.create_delay.lock().unwrap() = Some(delay);
    }

    /// Makes the next status fetch hang for `delay` before answering.
    pub fn delay_next_get(&self, delay: Duration) {
        *self.get_delay.lock().unwrap() = Some(delay);
    }

    /// Queues responses for successive status fetches.
    pub fn script_get<I>(&self, responses: I)
    where
        I: IntoIterator<Item = Result<Video, ApiError>>,
    {
        self.get_script.lock().unwrap().extend(responses);
    }

    /// Answers every unscripted status fetch with `status`.
    pub fn fallback_get(&self, status: VideoStatus) {
        *self.get_fallback.lock().unwrap() = Some(status);
    }

    pub fn on_list(&self, result: Result<Vec<Video>, ApiError>) {
        *self.list_result.lock().unwrap() = Some(result);
    }

    pub fn on_delete(&self, result: Result<(), ApiError>) {
        *self.delete_result.lock().unwrap() = Some(result);
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.create_calls() + self.get_calls() + self.list_calls() + self.delete_calls()
    }
}

#[async_trait]
impl VideoApi for FakeVideoApi {
    async fn create_video(&self, request: &CreateVideoRequest) -> Result<Video, ApiError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.created.lock().unwrap().push(request.clone());

        let delay = *self.create_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.create_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| {
                Ok(VideoBuilder::new("job-1")
                    .topic(&request.topic)
                    .build())
            })
    }

    async fn get_video(&self, id: &str) -> Result<Video, ApiError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.fetched_ids.lock().unwrap().push(id.to_string());

        let delay = self.get_delay.lock().unwrap().take();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(response) = self.get_script.lock().unwrap().pop_front() {
            return response;
        }
        match *self.get_fallback.lock().unwrap() {
            Some(status) => Ok(VideoBuilder::new(id).status(status, 10).build()),
            None => Err(ApiError::Transient("no scripted response".to_string())),
        }
    }

    async fn list_videos(&self) -> Result<Vec<Video>, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.list_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn delete_video(&self, id: &str) -> Result<(), ApiError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.deleted_ids.lock().unwrap().push(id.to_string());
        self.delete_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(Ok(()))
    }
}

/// A dashboard wired to a `FakeVideoApi` and an in-memory library.
pub struct TestHarness {
    pub api: Arc<FakeVideoApi>,
    pub store: Arc<MemoryStore>,
    pub settings: Settings,
    pub dashboard: Arc<Dashboard>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let api = FakeVideoApi::new();
        let store = Arc::new(MemoryStore::default());
        let dashboard = Arc::new(Dashboard::new(
            api.clone(),
            &settings,
            store.clone() as Arc<dyn LibraryStore>,
        ));

        Self {
            api,
            store,
            settings,
            dashboard,
        }
    }

    /// Lets the paused clock run for `secs` seconds.
    pub async fn advance(&self, secs: u64) {
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }
}

/// A file-backed library in its own temp directory.
pub struct TempLibrary {
    _temp_dir: TempDir,
    pub store: JsonFileStore,
}

impl TempLibrary {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = JsonFileStore::new(temp_dir.path().join("data").join("library.json"));
        Self {
            _temp_dir: temp_dir,
            store,
        }
    }
}
