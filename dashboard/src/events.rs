//! Renders poll events on the terminal.

use std::io::Write;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use faceless::api::PROGRESS_STEPS;
use faceless::{PollEvent, PollEventKind, Video};

const BAR_WIDTH: usize = 30;

/// Draws `[#####-----]  45%  Fetching Clips (3/5)`.
pub fn progress_line(video: &Video) -> String {
    let progress = usize::from(video.progress.min(100));
    let filled = progress * BAR_WIDTH / 100;
    let step = match video.status.step_index() {
        Some(index) => format!(" ({}/{})", index + 1, PROGRESS_STEPS.len()),
        None => String::new(),
    };

    format!(
        "[{}{}] {:>3}%  {}{}",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        progress,
        video.status.label(),
        step
    )
}

/// Follows events for `job_id` until a final one arrives.
///
/// Progress goes to stderr unless `quiet`. The generated script is printed
/// once, as soon as it shows up. Returns the final event, or `None` if the
/// broadcaster closed first.
pub async fn follow(
    mut rx: broadcast::Receiver<PollEvent>,
    job_id: &str,
    quiet: bool,
) -> Option<PollEvent> {
    let mut script_shown = false;
    let mut last_line = String::new();

    loop {
        match rx.recv().await {
            Ok(event) if event.job_id == job_id => {
                if !quiet {
                    render(&event, &mut script_shown, &mut last_line);
                }
                if event.kind.is_final() {
                    info!("Stopped following video {}: {:?}", job_id, event.kind);
                    return Some(event);
                }
            }
            Ok(event) => {
                debug!("Ignoring event for video {}", event.job_id);
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("Progress display lagged, missed {} events", n);
            }
            Err(broadcast::error::RecvError::Closed) => {
                info!("Progress broadcaster closed");
                return None;
            }
        }
    }
}

fn render(event: &PollEvent, script_shown: &mut bool, last_line: &mut String) {
    let mut err = std::io::stderr().lock();

    if let Some(video) = &event.video {
        if !*script_shown {
            if let Some(script) = &video.script {
                let _ = writeln!(err, "\nScript:\n{}\n", script.trim());
                *script_shown = true;
            }
        }
    }

    let line = match (event.kind, &event.video) {
        (PollEventKind::PollError, _) => format!("  (retrying) {}", event.message),
        (PollEventKind::Failed, _) | (PollEventKind::Abandoned, _) => {
            format!("Failed: {}", event.message.trim_start_matches("Failed: "))
        }
        (PollEventKind::Cancelled, _) => "Stopped watching.".to_string(),
        (_, Some(video)) => progress_line(video),
        (_, None) => event.message.clone(),
    };

    // Unchanged progress is not repeated on every tick
    if line != *last_line {
        let _ = writeln!(err, "{}", line);
        *last_line = line;
    }
}
