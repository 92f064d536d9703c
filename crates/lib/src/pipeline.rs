//! # Menu Pipeline
//!
//! The per-page entry point: read a menu photo, extract its items, optionally
//! illustrate every item, then write `menu_items.json` next to the images.
//!
//! ```no_run
//! use menuvision::{MenuPipelineBuilder, settings::{Credentials, ImageSettings, ProviderEndpoints}};
//! use menuvision::providers::factory::{create_image_provider, create_vision_provider};
//! use std::path::Path;
//!
//! # async fn demo() -> Result<(), menuvision::MenuError> {
//! let credentials = Credentials {
//!     gemini_api_key: std::env::var("GEMINI_API_KEY").ok(),
//!     fal_api_key: std::env::var("FAL_KEY").ok(),
//! };
//! let endpoints = ProviderEndpoints::default();
//! let settings = ImageSettings::default();
//! let pipeline = MenuPipelineBuilder::new()
//!     .vision_provider(create_vision_provider("gemini-2.5-flash", &credentials, &endpoints)?)
//!     .image_provider(create_image_provider(&settings, &credentials, &endpoints)?)
//!     .image_format(&settings.image_format)
//!     .max_workers(4)
//!     .build()?;
//! let processed = pipeline
//!     .process_menu(Path::new("menu.jpg"), Path::new("menu_output"), true)
//!     .await?;
//! println!("{}", processed.metadata_path.display());
//! # Ok(())
//! # }
//! ```

use crate::{
    constants::{DEFAULT_IMAGE_FORMAT, DEFAULT_MAX_WORKERS},
    errors::{ConfigError, MenuError},
    extract::MenuExtractor,
    fanout,
    metadata::write_page_metadata,
    preprocess::mime_type_for_path,
    providers::{ai::VisionProvider, image::ImageProvider},
    types::{EnrichedItem, MenuItem, PageMetadata, ProcessedMenu},
};
use std::path::Path;
use tracing::info;

/// Orchestrates extraction and image generation for one menu page at a time.
#[derive(Debug, Clone)]
pub struct MenuPipeline {
    extractor: MenuExtractor,
    image_provider: Option<Box<dyn ImageProvider>>,
    image_format: String,
    max_workers: usize,
}

/// A builder for creating `MenuPipeline` instances.
pub struct MenuPipelineBuilder {
    vision_provider: Option<Box<dyn VisionProvider>>,
    image_provider: Option<Box<dyn ImageProvider>>,
    image_format: String,
    max_workers: usize,
}

impl Default for MenuPipelineBuilder {
    fn default() -> Self {
        Self {
            vision_provider: None,
            image_provider: None,
            image_format: DEFAULT_IMAGE_FORMAT.to_string(),
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }
}

impl MenuPipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vision_provider(mut self, provider: Box<dyn VisionProvider>) -> Self {
        self.vision_provider = Some(provider);
        self
    }

    /// Sets the image provider. Without one, only extraction is possible.
    pub fn image_provider(mut self, provider: Box<dyn ImageProvider>) -> Self {
        self.image_provider = Some(provider);
        self
    }

    /// The configured format, used when a provider gives no extension hint.
    pub fn image_format(mut self, image_format: &str) -> Self {
        self.image_format = image_format.to_string();
        self
    }

    pub fn max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn build(self) -> Result<MenuPipeline, ConfigError> {
        let vision_provider = self
            .vision_provider
            .ok_or_else(ConfigError::missing_gemini_key)?;
        Ok(MenuPipeline {
            extractor: MenuExtractor::new(vision_provider),
            image_provider: self.image_provider,
            image_format: self.image_format,
            max_workers: self.max_workers.max(1),
        })
    }
}

impl MenuPipeline {
    pub fn extractor(&self) -> &MenuExtractor {
        &self.extractor
    }

    pub fn image_provider(&self) -> Option<&dyn ImageProvider> {
        self.image_provider.as_deref()
    }

    /// Reads a menu photo from disk and extracts its items.
    pub async fn extract_path(&self, menu_path: &Path) -> Result<Vec<MenuItem>, MenuError> {
        if !tokio::fs::try_exists(menu_path).await.unwrap_or(false) {
            return Err(MenuError::MenuImageNotFound(menu_path.to_path_buf()));
        }
        let bytes = tokio::fs::read(menu_path).await?;
        info!("Extracting menu items from {}", menu_path.display());
        Ok(self
            .extractor
            .extract(&bytes, mime_type_for_path(menu_path))
            .await?)
    }

    /// Processes one menu page into `output_dir`.
    ///
    /// With `generate_images`, every item is illustrated and the first failure
    /// aborts the page before any metadata is written. Without it, items are
    /// recorded with a `null` image path.
    pub async fn process_menu(
        &self,
        menu_path: &Path,
        output_dir: &Path,
        generate_images: bool,
    ) -> Result<ProcessedMenu, MenuError> {
        let provider = match (generate_images, self.image_provider.as_deref()) {
            (true, None) => return Err(ConfigError::ImageProviderNotConfigured.into()),
            (true, Some(provider)) => Some(provider),
            (false, _) => None,
        };

        let items = self.extract_path(menu_path).await?;
        tokio::fs::create_dir_all(output_dir).await?;

        let items: Vec<EnrichedItem> = match provider {
            Some(provider) => {
                fanout::run(
                    provider,
                    items,
                    output_dir,
                    &self.image_format,
                    self.max_workers,
                )
                .await?
            }
            None => items
                .into_iter()
                .enumerate()
                .map(|(idx, item)| EnrichedItem::pending(item, idx + 1))
                .collect(),
        };

        let metadata = PageMetadata {
            menu_source: menu_path.display().to_string(),
            items,
        };
        let metadata_path = write_page_metadata(output_dir, &metadata).await?;
        info!(
            "Processed {} menu items into {}",
            metadata.items.len(),
            metadata_path.display()
        );

        Ok(ProcessedMenu {
            metadata_path,
            items: metadata.items,
        })
    }
}
