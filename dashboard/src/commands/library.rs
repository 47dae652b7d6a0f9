//! Local library commands.

use tracing::info;

use faceless::FacelessError;

use super::{print_json, ApiResponse};
use crate::state::AppState;

pub fn list(state: &AppState, json: bool) -> Result<(), FacelessError> {
    let entries = state.dashboard.library().list()?;

    if json {
        print_json(&ApiResponse::ok(&entries));
        return Ok(());
    }

    if entries.is_empty() {
        println!("Your library is empty.");
        return Ok(());
    }

    for entry in &entries {
        println!(
            "{}  {}  {}",
            entry.saved_at.format("%Y-%m-%d %H:%M"),
            entry.id,
            entry.topic
        );
        if let Some(url) = &entry.video_url {
            println!("    video:    {}", url);
        }
        println!("    download: {}", entry.download_url);
    }
    Ok(())
}

pub fn remove(state: &AppState, id: &str, json: bool) -> Result<(), FacelessError> {
    let removed = state.dashboard.library().remove(id)?;
    info!("Library remove {}: {}", id, removed);

    if json {
        print_json(&ApiResponse::ok(removed));
    } else if removed {
        println!("Removed {} from your library.", id);
    } else {
        println!("{} is not in your library.", id);
    }
    Ok(())
}
