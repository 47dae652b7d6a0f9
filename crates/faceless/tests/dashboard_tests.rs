//! Dashboard flows: submission, history, confirmed deletion and library sync.

mod common;

use faceless::{
    ApiError, DeleteOutcome, FacelessError, PollState, ValidationError, VideoStatus,
};

use common::{at, completed, pending, TestHarness, VideoBuilder};

fn approve(_: &str) -> bool {
    true
}

fn decline(_: &str) -> bool {
    false
}

#[tokio::test(start_paused = true)]
async fn test_empty_topic_makes_no_request() {
    let h = TestHarness::new();

    for topic in ["", "   ", "\t\n"] {
        let err = h.dashboard.submit(topic, 60).await.unwrap_err();
        assert!(matches!(
            err,
            FacelessError::Validation(ValidationError::EmptyTopic)
        ));
    }

    assert_eq!(h.api.total_calls(), 0);
    assert!(h.dashboard.error().is_some());
    assert_eq!(h.dashboard.snapshot().poll, PollState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_duration_out_of_range_makes_no_request() {
    let h = TestHarness::new();

    for duration in [0, 29, 181, 600] {
        let err = h
            .dashboard
            .submit("10 facts about space", duration)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FacelessError::Validation(ValidationError::DurationOutOfRange { .. })
        ));
    }
    assert_eq!(h.api.create_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_submit_then_poll_to_completion() {
    let h = TestHarness::new();
    h.api.on_create(Ok(pending("job-1")));
    h.api.script_get([
        Ok(at("job-1", VideoStatus::GeneratingScript, 20)),
        Ok(completed("job-1")),
    ]);

    let video = h
        .dashboard
        .submit("  10 facts about space  ", 60)
        .await
        .expect("submission succeeds");
    assert_eq!(video.id, "job-1");
    assert_eq!(h.api.create_calls(), 1);
    {
        let created = h.api.created.lock().unwrap();
        assert_eq!(created[0].topic, "10 facts about space");
        assert_eq!(created[0].duration, 60);
    }

    let snapshot = h.dashboard.snapshot();
    assert!(snapshot.poll.is_polling());
    assert!(!snapshot.submitting);
    assert!(snapshot.error.is_none());

    h.advance(60).await;
    assert_eq!(h.api.get_calls(), 2);
    match h.dashboard.snapshot().poll {
        PollState::Terminal(video) => assert_eq!(video.status, VideoStatus::Completed),
        other => panic!("expected terminal, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_creation_rejected_displays_nothing() {
    let h = TestHarness::new();
    h.api.on_create(Err(ApiError::CreationRejected {
        status: 422,
        message: "Topic too short".to_string(),
    }));

    let err = h.dashboard.submit("ok", 60).await.unwrap_err();
    assert!(matches!(
        err,
        FacelessError::Api(ApiError::CreationRejected { status: 422, .. })
    ));

    let snapshot = h.dashboard.snapshot();
    assert_eq!(snapshot.poll, PollState::Idle);
    assert!(snapshot.error.unwrap().contains("Topic too short"));

    h.advance(30).await;
    assert_eq!(h.api.get_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_submission_is_refused() {
    let h = TestHarness::new();
    h.api.delay_create(std::time::Duration::from_secs(2));
    h.api.fallback_get(VideoStatus::Pending);

    let (first, second) = tokio::join!(
        h.dashboard.submit("Ancient Rome", 60),
        h.dashboard.submit("Deep sea creatures", 60),
    );

    assert!(first.is_ok());
    assert!(matches!(second, Err(FacelessError::SubmissionInProgress)));
    assert_eq!(h.api.create_calls(), 1);
    assert!(!h.dashboard.is_submitting());

    // The guard is released, so a later submission goes through.
    h.dashboard.submit("Volcanoes", 90).await.unwrap();
    assert_eq!(h.api.create_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_new_submission_replaces_displayed_job() {
    let h = TestHarness::new();
    h.api.fallback_get(VideoStatus::Pending);

    h.api.on_create(Ok(pending("job-a")));
    h.dashboard.submit("Ancient Rome", 60).await.unwrap();
    h.advance(4).await;

    h.api.on_create(Ok(pending("job-b")));
    h.dashboard.submit("Volcanoes", 60).await.unwrap();
    h.advance(7).await;

    let ids = h.api.fetched_ids.lock().unwrap().clone();
    assert_eq!(ids, vec!["job-a", "job-b", "job-b"]);
    assert_eq!(h.dashboard.snapshot().poll.job_id(), Some("job-b"));
}

#[tokio::test(start_paused = true)]
async fn test_refresh_history_keeps_backend_order() {
    let h = TestHarness::new();
    h.api
        .on_list(Ok(vec![completed("b"), pending("a"), completed("c")]));

    let videos = h.dashboard.refresh_history().await.unwrap();
    let ids: Vec<_> = videos.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a", "c"]);
    assert_eq!(h.dashboard.history().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_failure_keeps_previous_list() {
    let h = TestHarness::new();
    h.api.on_list(Ok(vec![completed("a")]));
    h.dashboard.refresh_history().await.unwrap();

    h.api
        .on_list(Err(ApiError::Transient("connection refused".to_string())));
    assert!(h.dashboard.refresh_history().await.is_err());

    let history = h.dashboard.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, "a");
}

#[tokio::test(start_paused = true)]
async fn test_declined_delete_sends_nothing() {
    let h = TestHarness::new();
    h.api.on_list(Ok(vec![completed("a")]));
    h.dashboard.refresh_history().await.unwrap();

    let prompts = std::sync::Mutex::new(Vec::new());
    let recorder = |prompt: &str| {
        prompts.lock().unwrap().push(prompt.to_string());
        false
    };

    let outcome = h.dashboard.delete("a", &recorder).await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Declined);
    assert_eq!(h.api.delete_calls(), 0);
    assert_eq!(h.dashboard.history().len(), 1);
    assert_eq!(prompts.lock().unwrap().len(), 1);

    let outcome = h.dashboard.delete("a", &decline).await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Declined);
    assert_eq!(h.api.delete_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_delete_displayed_job_clears_display() {
    let h = TestHarness::new();
    h.api.on_list(Ok(vec![pending("a"), completed("b")]));
    h.api.fallback_get(VideoStatus::Rendering);
    h.dashboard.refresh_history().await.unwrap();

    h.dashboard.watch("a").await.unwrap();
    h.advance(4).await;
    assert!(h.dashboard.snapshot().poll.is_polling());
    let polls_before = h.api.get_calls();

    let outcome = h.dashboard.delete("a", &approve).await.unwrap();
    assert_eq!(
        outcome,
        DeleteOutcome::Deleted {
            cleared_display: true
        }
    );

    let snapshot = h.dashboard.snapshot();
    assert_eq!(snapshot.poll, PollState::Idle);
    let ids: Vec<_> = snapshot.history.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, vec!["b"]);

    h.advance(30).await;
    assert_eq!(h.api.get_calls(), polls_before);
}

#[tokio::test(start_paused = true)]
async fn test_delete_other_job_keeps_display() {
    let h = TestHarness::new();
    h.api.on_list(Ok(vec![pending("a"), completed("b")]));
    h.api.fallback_get(VideoStatus::Rendering);
    h.dashboard.refresh_history().await.unwrap();
    h.dashboard.watch("a").await.unwrap();

    let outcome = h.dashboard.delete("b", &approve).await.unwrap();
    assert_eq!(
        outcome,
        DeleteOutcome::Deleted {
            cleared_display: false
        }
    );
    assert!(h.dashboard.snapshot().poll.is_polling());
    assert_eq!(h.dashboard.history().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_delete_failure_leaves_list_unchanged() {
    let h = TestHarness::new();
    h.api.on_list(Ok(vec![completed("a"), completed("b")]));
    h.api.on_delete(Err(ApiError::Transient("502 Bad Gateway".to_string())));
    h.dashboard.refresh_history().await.unwrap();

    assert!(h.dashboard.delete("a", &approve).await.is_err());
    assert_eq!(h.api.delete_calls(), 1);
    assert_eq!(h.dashboard.history().len(), 2);
    assert!(h.dashboard.error().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_completion_records_library_and_refreshes_history() {
    let h = TestHarness::new();
    let sync = h.dashboard.spawn_history_sync();

    let done = VideoBuilder::new("job-1")
        .status(VideoStatus::Completed, 100)
        .video_url("media/job-1.mp4")
        .thumbnail_url("https://cdn.example.com/job-1.jpg")
        .build();
    h.api.on_create(Ok(pending("job-1")));
    h.api.script_get([Ok(done.clone())]);
    h.api.on_list(Ok(vec![done]));

    h.dashboard.submit("10 facts about space", 60).await.unwrap();
    h.advance(10).await;

    assert_eq!(h.api.list_calls(), 1);
    assert_eq!(h.dashboard.history().len(), 1);

    let entry = h
        .dashboard
        .library()
        .get("job-1")
        .unwrap()
        .expect("completed video is recorded");
    assert_eq!(
        entry.video_url.as_deref(),
        Some("http://localhost:8000/api/media/job-1.mp4")
    );
    assert_eq!(
        entry.thumbnail_url.as_deref(),
        Some("https://cdn.example.com/job-1.jpg")
    );

    // Deleting the job also forgets it locally.
    h.dashboard.delete("job-1", &approve).await.unwrap();
    assert!(h.dashboard.library().get("job-1").unwrap().is_none());

    sync.abort();
}

#[tokio::test(start_paused = true)]
async fn test_teardown_stops_polling() {
    let h = TestHarness::new();
    h.api.fallback_get(VideoStatus::Pending);
    h.dashboard.submit("Ancient Rome", 60).await.unwrap();
    h.advance(4).await;

    h.dashboard.teardown();
    let polls = h.api.get_calls();
    h.advance(60).await;

    assert_eq!(h.api.get_calls(), polls);
    assert_eq!(h.dashboard.snapshot().poll, PollState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_snapshot_serializes_for_front_ends() {
    let h = TestHarness::new();
    h.api.on_create(Ok(pending("job-1")));
    h.dashboard.submit("Ancient Rome", 60).await.unwrap();

    let json = serde_json::to_value(h.dashboard.snapshot()).unwrap();
    assert_eq!(json["poll"]["state"], "polling");
    assert_eq!(json["submitting"], false);
    assert!(json["history"].as_array().unwrap().is_empty());
    assert!(json.get("error").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_history_sync_ends_with_dashboard() {
    let h = TestHarness::new();
    let sync = h.dashboard.spawn_history_sync();

    drop(h);
    sync.await.expect("sync task exits cleanly");
}

#[tokio::test(start_paused = true)]
async fn test_deleted_video_stays_deleted_after_late_completion() {
    let h = TestHarness::new();
    let sync = h.dashboard.spawn_history_sync();

    h.api.script_get([Ok(completed("job-1"))]);
    h.api.on_list(Ok(vec![completed("job-1"), completed("job-2")]));

    // The completion event is queued but the sync task has not run yet.
    h.dashboard.watch("job-1").await.unwrap();
    h.dashboard.delete("job-1", &approve).await.unwrap();
    h.advance(1).await;

    assert!(h.dashboard.library().get("job-1").unwrap().is_none());
    let ids: Vec<_> = h.dashboard.history().into_iter().map(|v| v.id).collect();
    assert_eq!(ids, vec!["job-2"]);

    assert!(!h.dashboard.record_in_library(&completed("job-1")).unwrap());
    assert!(h.dashboard.library().list().unwrap().is_empty());

    sync.abort();
}

#[tokio::test(start_paused = true)]
async fn test_space_facts_scenario_from_wire_json() {
    let h = TestHarness::new();
    let projection = |json: &str| -> faceless::Video { serde_json::from_str(json).unwrap() };

    h.api.on_create(Ok(projection(
        r#"{"id":"abc","topic":"10 facts about space","status":"pending","progress":0,
            "created_at":"2026-03-01T12:00:00"}"#,
    )));
    h.api.script_get([
        Ok(projection(
            r#"{"id":"abc","topic":"10 facts about space","status":"processing","progress":40,
                "created_at":"2026-03-01T12:00:00"}"#,
        )),
        Ok(projection(
            r#"{"id":"abc","topic":"10 facts about space","status":"completed","progress":100,
                "video_url":"media/abc.mp4","created_at":"2026-03-01T12:00:00"}"#,
        )),
    ]);

    assert_eq!(h.dashboard.snapshot().poll, PollState::Idle);
    h.dashboard.submit("10 facts about space", 60).await.unwrap();
    {
        let created = h.api.created.lock().unwrap();
        assert_eq!(created[0].topic, "10 facts about space");
        assert_eq!(created[0].duration, 60);
    }
    assert!(h.dashboard.snapshot().poll.is_polling());

    h.advance(4).await;
    match h.dashboard.snapshot().poll {
        PollState::Polling(video) => {
            assert_eq!(video.status, VideoStatus::Processing);
            assert_eq!(video.progress, 40);
        }
        other => panic!("expected polling, got {:?}", other),
    }

    h.advance(60).await;
    assert_eq!(h.api.get_calls(), 2);

    let video = match h.dashboard.snapshot().poll {
        PollState::Terminal(video) => video,
        other => panic!("expected terminal, got {:?}", other),
    };
    assert_eq!(video.status, VideoStatus::Completed);
    assert_eq!(video.progress, 100);
    assert_eq!(
        video
            .video_url
            .as_deref()
            .and_then(|path| h.dashboard.media().resolve(path))
            .as_deref(),
        Some("http://localhost:8000/api/media/abc.mp4")
    );
}
