//! # Page Metadata
//!
//! Reading and writing the `menu_items.json` document of a page output
//! directory. Documents are pretty-printed UTF-8 with non-ASCII text kept as is.

use crate::{constants::PAGE_METADATA_FILENAME, errors::MenuError, types::PageMetadata};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

pub fn page_metadata_path(page_dir: &Path) -> PathBuf {
    page_dir.join(PAGE_METADATA_FILENAME)
}

/// Writes the whole document, replacing any previous version.
pub async fn write_page_metadata<T: Serialize>(
    page_dir: &Path,
    metadata: &PageMetadata<T>,
) -> Result<PathBuf, MenuError> {
    tokio::fs::create_dir_all(page_dir).await?;
    let path = page_metadata_path(page_dir);
    let json = serde_json::to_string_pretty(metadata)?;
    tokio::fs::write(&path, json).await?;
    debug!("Wrote page metadata to {}", path.display());
    Ok(path)
}

pub async fn load_page_metadata<T: DeserializeOwned>(
    page_dir: &Path,
) -> Result<PageMetadata<T>, MenuError> {
    let raw = tokio::fs::read_to_string(page_metadata_path(page_dir)).await?;
    Ok(serde_json::from_str(&raw)?)
}

/// Sets `image_path` on the entry whose `id` is `item_id` and rewrites the document.
///
/// Returns `Ok(false)` when the document or the entry does not exist. Unknown
/// fields of the document are preserved.
pub async fn update_page_item_image(
    page_dir: &Path,
    item_id: &str,
    image_path: &str,
) -> Result<bool, MenuError> {
    let path = page_metadata_path(page_dir);
    if !tokio::fs::try_exists(&path).await? {
        return Ok(false);
    }
    let mut document: Value = serde_json::from_str(&tokio::fs::read_to_string(&path).await?)?;
    let entry = document
        .get_mut("items")
        .and_then(Value::as_array_mut)
        .and_then(|items| {
            items
                .iter_mut()
                .find(|entry| entry.get("id").and_then(Value::as_str) == Some(item_id))
        });
    let Some(entry) = entry else {
        return Ok(false);
    };
    entry["image_path"] = Value::String(image_path.to_string());
    tokio::fs::write(&path, serde_json::to_string_pretty(&document)?).await?;
    Ok(true)
}
