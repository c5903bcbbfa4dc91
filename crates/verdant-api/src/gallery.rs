use std::time::SystemTime;

use axum::{Json, extract::State, http::StatusCode};
use tokio::fs;
use tracing::error;

use verdant_types::api::GalleryEntry;

use crate::state::AppState;

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// GET /api/gallery: assembled images, most recently written first.
pub async fn gallery(State(state): State<AppState>) -> Result<Json<Vec<GalleryEntry>>, StatusCode> {
    let dir = state.uploads.output_dir();
    let mut entries = fs::read_dir(dir).await.map_err(|e| {
        error!("Failed to list {}: {}", dir.display(), e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let mut images: Vec<(SystemTime, String)> = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read entry in {}: {}", dir.display(), e);
                return Err(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !is_image(&name) {
            continue;
        }
        // Entry may vanish between listing and stat during a re-upload.
        let Ok(meta) = entry.metadata().await else {
            continue;
        };
        if !meta.is_file() {
            continue;
        }
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        images.push((modified, name));
    }

    images.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

    Ok(Json(
        images
            .into_iter()
            .map(|(_, name)| GalleryEntry {
                url: format!("/uploads/{name}"),
                name,
            })
            .collect(),
    ))
}

fn is_image(name: &str) -> bool {
    if name.starts_with('.') {
        return false;
    }
    name.rsplit_once('.').is_some_and(|(_, ext)| {
        IMAGE_EXTENSIONS
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(known))
    })
}
