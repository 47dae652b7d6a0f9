//! Video job commands.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use faceless::{DeleteOutcome, FacelessError, MediaResolver, PollEventKind, Video, VideoStatus};

use super::{print_json, ApiResponse};
use crate::events;
use crate::state::AppState;

/// A video together with its resolved media links.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoView<'a> {
    #[serde(flatten)]
    video: &'a Video,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved_video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved_thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    download_url: Option<String>,
}

impl<'a> VideoView<'a> {
    fn new(video: &'a Video, media: &MediaResolver) -> Self {
        Self {
            video,
            resolved_video_url: video.video_url.as_deref().and_then(|p| media.resolve(p)),
            resolved_thumbnail_url: video.thumbnail_url.as_deref().and_then(|p| media.resolve(p)),
            download_url: (video.status == VideoStatus::Completed)
                .then(|| media.download_url(&video.id)),
        }
    }
}

fn print_video(state: &AppState, video: &Video, json: bool) {
    let view = VideoView::new(video, state.dashboard.media());
    if json {
        print_json(&ApiResponse::ok(&view));
        return;
    }

    println!("{}  {}", video.id, video.topic);
    println!("  status:   {} ({}%)", video.status.label(), video.progress);
    println!(
        "  created:  {}",
        video.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    if let Some(reason) = &video.error_message {
        println!("  error:    {}", reason);
    }
    if let Some(url) = &view.resolved_video_url {
        println!("  video:    {}", url);
    }
    if let Some(url) = &view.resolved_thumbnail_url {
        println!("  thumb:    {}", url);
    }
    if let Some(url) = &view.download_url {
        println!("  download: {}", url);
    }
}

/// Follows a started watch to its end, tearing it down on Ctrl-C.
async fn follow_to_end(
    state: &AppState,
    rx: tokio::sync::broadcast::Receiver<faceless::PollEvent>,
    video: Video,
    json: bool,
) -> Result<(), FacelessError> {
    if video.is_finished() {
        return finish(state, video, json);
    }

    if !json {
        eprintln!("{}", events::progress_line(&video));
    }

    let outcome = tokio::select! {
        event = events::follow(rx, &video.id, json) => event,
        _ = tokio::signal::ctrl_c() => {
            state.dashboard.teardown();
            None
        }
    };

    let Some(event) = outcome else {
        if !json {
            eprintln!(
                "Stopped watching. The video keeps processing; resume with `faceless watch {}`.",
                video.id
            );
        }
        return Err(FacelessError::Unfinished {
            id: video.id,
            reason: "watch interrupted".to_string(),
        });
    };

    match (event.kind, event.video) {
        (PollEventKind::Completed | PollEventKind::Failed, Some(latest)) => {
            finish(state, latest, json)
        }
        _ => Err(FacelessError::Unfinished {
            id: video.id,
            reason: event.message,
        }),
    }
}

fn finish(state: &AppState, video: Video, json: bool) -> Result<(), FacelessError> {
    if video.status == VideoStatus::Completed {
        if let Err(e) = state.dashboard.record_in_library(&video) {
            warn!("Could not save video {} to library: {}", video.id, e);
        }
    }

    let outcome = outcome(&video);
    // With --json a failure is reported once, by the error envelope
    if !json || outcome.is_ok() {
        print_video(state, &video, json);
    }
    outcome
}

/// A failed job ends the command with an error.
fn outcome(video: &Video) -> Result<(), FacelessError> {
    if video.status != VideoStatus::Failed {
        return Ok(());
    }
    Err(FacelessError::Unfinished {
        id: video.id.clone(),
        reason: video
            .error_message
            .clone()
            .unwrap_or_else(|| "generation failed".to_string()),
    })
}

pub async fn create(
    state: &AppState,
    topic: &str,
    duration: Option<u32>,
    no_wait: bool,
    json: bool,
) -> Result<(), FacelessError> {
    let duration = duration.unwrap_or(state.settings.default_duration_secs);
    let rx = state.dashboard.subscribe();

    let video = state.dashboard.submit(topic, duration).await?;
    info!("Created video {}", video.id);

    if no_wait {
        state.dashboard.teardown();
        print_video(state, &video, json);
        return Ok(());
    }

    if !json {
        eprintln!("Generating video {} for '{}'", video.id, video.topic);
    }
    follow_to_end(state, rx, video, json).await
}

pub async fn watch(state: &AppState, id: &str, json: bool) -> Result<(), FacelessError> {
    let rx = state.dashboard.subscribe();
    let video = state.dashboard.watch(id).await?;
    follow_to_end(state, rx, video, json).await
}

pub async fn status(state: &AppState, id: &str, json: bool) -> Result<(), FacelessError> {
    let video = state.dashboard.status(id).await?;
    print_video(state, &video, json);
    Ok(())
}

pub async fn list(state: &AppState, json: bool) -> Result<(), FacelessError> {
    let videos = state.dashboard.refresh_history().await?;

    if json {
        let views: Vec<_> = videos
            .iter()
            .map(|video| VideoView::new(video, state.dashboard.media()))
            .collect();
        print_json(&ApiResponse::ok(views));
        return Ok(());
    }

    if videos.is_empty() {
        println!("No videos yet.");
        return Ok(());
    }

    for video in &videos {
        println!(
            "{:<36}  {:<18} {:>3}%  {}  {}",
            video.id,
            video.status.label(),
            video.progress,
            video.created_at.format("%Y-%m-%d %H:%M"),
            video.topic
        );
    }
    Ok(())
}

/// Asks on the terminal; anything but `y`/`yes` declines.
fn ask(prompt: &str) -> bool {
    eprint!("{} [y/N] ", prompt);
    let _ = std::io::stderr().flush();

    let mut answer = String::new();
    match std::io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

pub async fn delete(state: &AppState, id: &str, yes: bool, json: bool) -> Result<(), FacelessError> {
    let confirm = |prompt: &str| yes || ask(prompt);
    let outcome = state.dashboard.delete(id, &confirm).await?;

    if json {
        print_json(&ApiResponse::ok(outcome));
        return Ok(());
    }

    match outcome {
        DeleteOutcome::Declined => println!("Kept {}.", id),
        DeleteOutcome::Deleted { .. } => println!("Deleted {}.", id),
    }
    Ok(())
}

pub async fn download(
    state: &AppState,
    id: &str,
    output: Option<PathBuf>,
    json: bool,
) -> Result<(), FacelessError> {
    let dest = output.unwrap_or_else(|| PathBuf::from(format!("{}.mp4", id)));
    let bytes = state.api.download_to(id, &dest).await?;

    if json {
        print_json(&ApiResponse::ok(serde_json::json!({
            "path": dest,
            "bytes": bytes,
        })));
    } else {
        println!("Saved {} ({} bytes)", dest.display(), bytes);
    }
    Ok(())
}

pub fn url(state: &AppState, path: &str, json: bool) -> Result<(), FacelessError> {
    let resolved = state.dashboard.media().resolve(path);

    if json {
        print_json(&ApiResponse::ok(resolved));
    } else if let Some(url) = resolved {
        println!("{}", url);
    }
    Ok(())
}
