use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A single cleaned menu listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    pub price: String,
    pub description: String,
}

/// A menu item together with the illustration generated for it.
///
/// `image_path` is `None` when image generation was skipped or deferred.
/// The sequence is only used to restore extraction order and is not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedItem {
    #[serde(flatten)]
    pub item: MenuItem,
    pub image_path: Option<String>,
    #[serde(skip)]
    pub sequence: usize,
}

impl EnrichedItem {
    pub fn pending(item: MenuItem, sequence: usize) -> Self {
        Self {
            item,
            image_path: None,
            sequence,
        }
    }
}

/// The only extensions a generated asset may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageExtension {
    Png,
    Jpg,
}

impl ImageExtension {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageExtension::Png => "png",
            ImageExtension::Jpg => "jpg",
        }
    }
}

impl fmt::Display for ImageExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file written by the fan-out coordinator for one menu item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedAsset {
    pub sequence: usize,
    pub file_path: PathBuf,
    pub extension: ImageExtension,
}

/// Raw image bytes returned by an image provider, before naming.
#[derive(Debug, Clone, Default)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    /// A provider-supplied extension guess (from a URL suffix or content type).
    pub extension_hint: Option<String>,
}

/// The persisted `menu_items.json` document for one menu page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata<T = EnrichedItem> {
    pub menu_source: String,
    pub items: Vec<T>,
}

/// The outcome of processing one menu page.
#[derive(Debug, Clone)]
pub struct ProcessedMenu {
    pub metadata_path: PathBuf,
    pub items: Vec<EnrichedItem>,
}
