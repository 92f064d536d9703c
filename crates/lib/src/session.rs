//! # Sessions
//!
//! A session groups the pages uploaded together. Its `session.json` remembers
//! every extracted item and the image settings in force when it was created, so
//! images can be generated one item at a time later on.

use crate::{
    constants::SESSION_METADATA_FILENAME,
    errors::MenuError,
    settings::ImageSettings,
    types::MenuItem,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;
use uuid::Uuid;

/// The first 8 hex characters of a random UUID v4.
pub fn new_session_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// `{session_id}-p{page:02}-i{sequence:02}`
pub fn item_id(session_id: &str, page: usize, sequence: usize) -> String {
    format!("{session_id}-p{page:02}-i{sequence:02}")
}

/// One item as remembered by the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionItem {
    pub id: String,
    pub name: String,
    pub price: String,
    pub description: String,
    pub page: usize,
    pub sequence: usize,
    /// The page output directory, relative to the static root.
    pub output_dir: String,
    /// The generated image, relative to the static root.
    pub image_path: Option<String>,
}

impl SessionItem {
    pub fn menu_item(&self) -> MenuItem {
        MenuItem {
            name: self.name.clone(),
            price: self.price.clone(),
            description: self.description.clone(),
        }
    }
}

/// One item as written into a session page's `menu_items.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageItem {
    pub id: String,
    pub name: String,
    pub price: String,
    pub description: String,
    pub page: usize,
    pub sequence: usize,
    pub image_path: Option<String>,
}

impl From<&SessionItem> for PageItem {
    fn from(item: &SessionItem) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            price: item.price.clone(),
            description: item.description.clone(),
            page: item.page,
            sequence: item.sequence,
            image_path: item.image_path.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub session_id: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub image: ImageSettings,
    #[serde(default)]
    pub items: Vec<SessionItem>,
}

impl SessionMetadata {
    pub fn new(session_id: impl Into<String>, image: ImageSettings) -> Self {
        Self {
            session_id: session_id.into(),
            created_at: Utc::now(),
            image,
            items: Vec::new(),
        }
    }

    /// Appends the items of one page, numbering them from 1 in extraction order.
    pub fn add_page(&mut self, page: usize, output_dir: &str, items: &[MenuItem]) -> Vec<PageItem> {
        let added: Vec<SessionItem> = items
            .iter()
            .enumerate()
            .map(|(idx, item)| SessionItem {
                id: item_id(&self.session_id, page, idx + 1),
                name: item.name.clone(),
                price: item.price.clone(),
                description: item.description.clone(),
                page,
                sequence: idx + 1,
                output_dir: output_dir.to_string(),
                image_path: None,
            })
            .collect();
        let page_items = added.iter().map(PageItem::from).collect();
        self.items.extend(added);
        page_items
    }

    pub fn find_item(&self, item_id: &str) -> Option<&SessionItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub fn find_item_mut(&mut self, item_id: &str) -> Option<&mut SessionItem> {
        self.items.iter_mut().find(|item| item.id == item_id)
    }
}

pub fn session_metadata_path(output_root: &Path, session_id: &str) -> PathBuf {
    output_root.join(session_id).join(SESSION_METADATA_FILENAME)
}

pub async fn save_session(output_root: &Path, metadata: &SessionMetadata) -> Result<PathBuf, MenuError> {
    let path = session_metadata_path(output_root, &metadata.session_id);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, serde_json::to_string_pretty(metadata)?).await?;
    Ok(path)
}

/// Loads a session. Missing or unreadable documents yield `None`.
pub async fn load_session(output_root: &Path, session_id: &str) -> Option<SessionMetadata> {
    if session_id.is_empty() || session_id.contains(['/', '\\', '.']) {
        return None;
    }
    let path = session_metadata_path(output_root, session_id);
    let raw = tokio::fs::read_to_string(&path).await.ok()?;
    match serde_json::from_str(&raw) {
        Ok(metadata) => Some(metadata),
        Err(e) => {
            warn!("Ignoring unreadable session metadata {}: {e}", path.display());
            None
        }
    }
}
