//! # Menu Upload Handler
//!
//! Accepts up to `max_files` menu photos, extracts the items of every page and
//! records them in a new session. Images are not generated here; each item is
//! returned as `pending` and illustrated later through `/api/generate-image`.

use super::{AppError, AppState};
use crate::{state::GENERATED_DIR, static_url::make_static_url};
use axum::{extract::State, Json};
use axum_extra::extract::{multipart::MultipartError, Multipart};
use menuvision::{
    metadata::write_page_metadata,
    session::{new_session_id, save_session, PageItem, SessionMetadata},
    types::PageMetadata,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// The multipart field carrying the menu pages.
pub const UPLOAD_FIELD: &str = "menu_images";
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "heic", "webp"];

// --- API Payloads ---

#[derive(Serialize, Debug)]
pub struct UploadedPageInfo {
    pub name: String,
    pub url: String,
    pub page: usize,
}

#[derive(Serialize, Debug)]
pub struct PendingItem {
    pub id: String,
    pub name: String,
    pub price: String,
    pub description: String,
    pub image_url: Option<String>,
    #[serde(rename = "imageStatus")]
    pub image_status: &'static str,
    pub page: usize,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub session_id: String,
    pub pages: Vec<UploadedPageInfo>,
    pub items: Vec<PendingItem>,
}

/// One uploaded file, already validated.
struct MenuUpload {
    original_name: String,
    file_name: String,
    bytes: Vec<u8>,
}

/// Reduces an uploaded file name to ASCII letters, digits, `.`, `-` and `_`.
///
/// Whitespace becomes `_`; leading dots and underscores are stripped so the
/// result can never climb out of the upload directory.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') => Some(c),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect();
    cleaned.trim_start_matches(['.', '_']).to_string()
}

pub fn allowed_file(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Reads and validates every `menu_images` part before anything touches the disk.
async fn read_uploads(
    multipart: &mut Multipart,
    max_files: usize,
) -> Result<Vec<MenuUpload>, AppError> {
    let invalid = |e: MultipartError| AppError::BadRequest(format!("Invalid upload: {e}"));
    let mut uploads = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(invalid)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let Some(original_name) = field.file_name().filter(|n| !n.is_empty()).map(str::to_string)
        else {
            continue;
        };
        let bytes = field.bytes().await.map_err(invalid)?.to_vec();
        let page = uploads.len() + 1;
        let file_name = match sanitize_filename(&original_name) {
            name if name.is_empty() => format!("menu_page_{page}.jpg"),
            name => name,
        };
        if !allowed_file(&file_name) {
            return Err(AppError::BadRequest(format!(
                "Unsupported file type for {original_name}."
            )));
        }
        uploads.push(MenuUpload {
            original_name,
            // Page-prefixed so two uploads with the same name never collide.
            file_name: format!("{page:02}-{file_name}"),
            bytes,
        });
    }

    if uploads.is_empty() {
        return Err(AppError::BadRequest(
            "Please select at least one image file.".to_string(),
        ));
    }
    if uploads.len() > max_files {
        return Err(AppError::BadRequest(format!(
            "You can upload a maximum of {max_files} menu pages per run."
        )));
    }
    Ok(uploads)
}

async fn cleanup_session_directories(directories: &[&Path]) {
    for directory in directories {
        if let Err(e) = tokio::fs::remove_dir_all(directory).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to clean up {}: {e}", directory.display());
            }
        }
    }
}

/// The handler for `POST /api/process`.
pub async fn process_menu_handler(
    State(app_state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ProcessResponse>, AppError> {
    let uploads = read_uploads(&mut multipart, app_state.config.max_files).await?;

    let session_id = new_session_id();
    let upload_dir = app_state.upload_root().join(&session_id);
    let output_base_dir = app_state.output_root().join(&session_id);
    info!(
        "Session {session_id}: processing {} menu page(s)",
        uploads.len()
    );

    match process_session(&app_state, &session_id, &upload_dir, uploads).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            cleanup_session_directories(&[&upload_dir, &output_base_dir]).await;
            Err(e)
        }
    }
}

async fn process_session(
    app_state: &AppState,
    session_id: &str,
    upload_dir: &Path,
    uploads: Vec<MenuUpload>,
) -> Result<ProcessResponse, AppError> {
    tokio::fs::create_dir_all(upload_dir).await?;

    let mut session = SessionMetadata::new(session_id, app_state.config.image.clone());
    let mut pages = Vec::with_capacity(uploads.len());
    let mut items = Vec::new();

    for (idx, upload) in uploads.into_iter().enumerate() {
        let page = idx + 1;
        let saved_path: PathBuf = upload_dir.join(&upload.file_name);
        tokio::fs::write(&saved_path, &upload.bytes).await?;
        pages.push(UploadedPageInfo {
            name: upload.original_name,
            url: make_static_url(&app_state.static_root, &saved_path),
            page,
        });

        let extracted = app_state.pipeline.extract_path(&saved_path).await?;

        let output_dir_rel = format!("{GENERATED_DIR}/{session_id}/page_{page:02}");
        let page_items = session.add_page(page, &output_dir_rel, &extracted);
        items.extend(page_items.iter().map(|item| PendingItem {
            id: item.id.clone(),
            name: item.name.clone(),
            price: item.price.clone(),
            description: item.description.clone(),
            image_url: None,
            image_status: "pending",
            page,
        }));

        let page_metadata: PageMetadata<PageItem> = PageMetadata {
            menu_source: saved_path.display().to_string(),
            items: page_items,
        };
        write_page_metadata(&app_state.static_root.join(&output_dir_rel), &page_metadata).await?;
    }

    save_session(&app_state.output_root(), &session).await?;
    info!(
        "Session {session_id}: extracted {} item(s) from {} page(s)",
        items.len(),
        pages.len()
    );

    Ok(ProcessResponse {
        session_id: session_id.to_string(),
        pages,
        items,
    })
}
