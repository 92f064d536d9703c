//! # Image Fan-out
//!
//! Generates one illustration per menu item with bounded concurrency. Items are
//! numbered from 1 in extraction order; completions arrive in any order and are
//! sorted back by sequence before anything is returned.
//!
//! Two failure policies are offered:
//! - [`run`] lets every item finish, then reports the first failure for the whole page.
//! - [`run_isolated`] reports a result per item, so one failure never hides the others.

use crate::{
    errors::ImageGenerationError,
    naming::{asset_filename, resolve_extension},
    prompts::menu::build_dish_prompt,
    providers::image::ImageProvider,
    types::{EnrichedItem, GeneratedAsset, MenuItem},
};
use futures::stream::{self, StreamExt};
use std::path::Path;
use tracing::{debug, info, warn};

/// The result of one item in [`run_isolated`].
#[derive(Debug)]
pub struct ItemOutcome {
    pub sequence: usize,
    pub item: MenuItem,
    pub result: Result<GeneratedAsset, ImageGenerationError>,
}

/// Generates and writes the image for a single item.
pub async fn generate_item_image(
    provider: &dyn ImageProvider,
    item: &MenuItem,
    output_dir: &Path,
    sequence: usize,
    image_format: &str,
) -> Result<GeneratedAsset, ImageGenerationError> {
    let prompt = build_dish_prompt(item);
    debug!(sequence, provider = provider.name(), "--> Dish prompt: {prompt}");

    let image = provider.generate(&prompt).await?;
    let extension = resolve_extension(image_format, image.extension_hint.as_deref());
    let file_path = output_dir.join(asset_filename(sequence, &item.name, extension));

    tokio::fs::write(&file_path, &image.bytes)
        .await
        .map_err(|source| ImageGenerationError::Write {
            path: file_path.clone(),
            source,
        })?;

    debug!(sequence, "Saved {}", file_path.display());
    Ok(GeneratedAsset {
        sequence,
        file_path,
        extension,
    })
}

/// Generates all images, failing the whole batch if any item fails.
///
/// Every submitted item runs to completion or failure before this returns.
/// When several items fail, the error of the lowest sequence is reported.
pub async fn run(
    provider: &dyn ImageProvider,
    items: Vec<MenuItem>,
    output_dir: &Path,
    image_format: &str,
    concurrency: usize,
) -> Result<Vec<EnrichedItem>, ImageGenerationError> {
    let width = concurrency.max(1);
    info!("Generating {} images with {width} workers", items.len());

    let mut results: Vec<(usize, Result<EnrichedItem, ImageGenerationError>)> =
        stream::iter(items.into_iter().enumerate())
            .map(|(idx, item)| async move {
                let sequence = idx + 1;
                let result =
                    generate_item_image(provider, &item, output_dir, sequence, image_format)
                        .await
                        .map(|asset| EnrichedItem {
                            item,
                            image_path: Some(asset.file_path.display().to_string()),
                            sequence,
                        });
                (sequence, result)
            })
            .buffer_unordered(width)
            .collect()
            .await;

    results.sort_by_key(|(sequence, _)| *sequence);
    results.into_iter().map(|(_, result)| result).collect()
}

/// Generates all images, reporting success or failure per item.
///
/// This is the library-level API for callers that want partial results, such
/// as a page where a few dishes may be retried later one by one.
pub async fn run_isolated(
    provider: &dyn ImageProvider,
    items: Vec<MenuItem>,
    output_dir: &Path,
    image_format: &str,
    concurrency: usize,
) -> Vec<ItemOutcome> {
    let width = concurrency.max(1);

    let mut outcomes: Vec<ItemOutcome> = stream::iter(items.into_iter().enumerate())
        .map(|(idx, item)| async move {
            let sequence = idx + 1;
            let result =
                generate_item_image(provider, &item, output_dir, sequence, image_format).await;
            if let Err(e) = &result {
                warn!(sequence, "Image generation failed for '{}': {e}", item.name);
            }
            ItemOutcome {
                sequence,
                item,
                result,
            }
        })
        .buffer_unordered(width)
        .collect()
        .await;

    outcomes.sort_by_key(|outcome| outcome.sequence);
    outcomes
}
