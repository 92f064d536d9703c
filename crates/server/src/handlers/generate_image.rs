//! # Single-Item Image Handler
//!
//! Generates the illustration of one session item with the provider settings
//! stored in that session. A failure only affects the requested item.

use super::{AppError, AppState};
use crate::static_url::{make_static_url, relative_to_static};
use axum::{body::Bytes, extract::State, Json};
use menuvision::{
    fanout::generate_item_image,
    metadata::update_page_item_image,
    providers::factory::create_image_provider,
    session::{load_session, save_session},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const READY: &str = "ready";

// --- API Payloads ---

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub item_id: Option<String>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageResponse {
    pub item_id: String,
    pub image_url: String,
    pub status: &'static str,
    pub page: usize,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// The handler for `POST /api/generate-image`.
///
/// An unparseable body is treated like an empty one.
pub async fn generate_image_handler(
    State(app_state): State<AppState>,
    body: Bytes,
) -> Result<Json<GenerateImageResponse>, AppError> {
    let request: GenerateImageRequest = serde_json::from_slice(&body).unwrap_or_default();
    let (Some(session_id), Some(item_id)) =
        (non_blank(request.session_id), non_blank(request.item_id))
    else {
        return Err(AppError::BadRequest(
            "sessionId and itemId are required.".to_string(),
        ));
    };

    let static_root = &app_state.static_root;
    let output_root = app_state.output_root();
    let session = load_session(&output_root, &session_id)
        .await
        .ok_or_else(|| AppError::NotFound("Session not found.".to_string()))?;
    let target = session
        .find_item(&item_id)
        .cloned()
        .ok_or_else(|| AppError::NotFound("Item not found in session.".to_string()))?;

    if let Some(existing) = target.image_path.as_deref() {
        let existing_path = static_root.join(existing);
        if tokio::fs::try_exists(&existing_path).await.unwrap_or(false) {
            return Ok(Json(GenerateImageResponse {
                item_id,
                image_url: make_static_url(static_root, &existing_path),
                status: READY,
                page: target.page,
            }));
        }
    }

    if target.output_dir.is_empty() {
        return Err(AppError::BadRequest(
            "Output directory missing for item.".to_string(),
        ));
    }
    let output_dir = static_root.join(&target.output_dir);
    tokio::fs::create_dir_all(&output_dir).await?;

    let provider = create_image_provider(
        &session.image,
        &app_state.credentials,
        &app_state.endpoints,
    )?;
    info!(
        "Generating image for {item_id} with {}",
        provider.name()
    );
    let asset = generate_item_image(
        provider.as_ref(),
        &target.menu_item(),
        &output_dir,
        target.sequence.max(1),
        &session.image.image_format,
    )
    .await?;

    let relative = relative_to_static(static_root, &asset.file_path)
        .unwrap_or_else(|| asset.file_path.display().to_string());

    // Other items of the same session may finish concurrently.
    {
        let _guard = app_state.session_lock.lock().await;
        let mut latest = load_session(&output_root, &session_id)
            .await
            .unwrap_or(session);
        if let Some(item) = latest.find_item_mut(&item_id) {
            item.image_path = Some(relative.clone());
        }
        save_session(&output_root, &latest).await?;
        match update_page_item_image(&output_dir, &item_id, &relative).await {
            Ok(true) => {}
            Ok(false) => warn!("{item_id} is missing from the page metadata"),
            Err(e) => warn!("Failed to update page metadata for {item_id}: {e}"),
        }
    }

    Ok(Json(GenerateImageResponse {
        item_id,
        image_url: make_static_url(static_root, &asset.file_path),
        status: READY,
        page: target.page,
    }))
}
