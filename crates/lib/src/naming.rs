//! # Asset Naming
//!
//! Deterministic, filesystem-safe file names for generated dish images.
//! Sequence numbers are unique within a page, so names never collide there.

use crate::types::ImageExtension;

/// The slug used when a name contains no ASCII letters or digits.
pub const FALLBACK_SLUG: &str = "menu-item";

/// Lowercases `name` and collapses every run of characters outside `[a-z0-9]`
/// into a single hyphen, trimming hyphens from both ends.
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_hyphen = false;
    for c in name.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c);
        } else {
            pending_hyphen = true;
        }
    }
    if out.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        out
    }
}

/// `{sequence:02}-{slug}.{extension}`
pub fn asset_filename(sequence: usize, name: &str, extension: ImageExtension) -> String {
    format!("{sequence:02}-{}.{extension}", slug(name))
}

fn clean_extension(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    match lowered.trim_start_matches('.') {
        "jpeg" => "jpg".to_string(),
        other => other.to_string(),
    }
}

fn as_known(ext: &str) -> Option<ImageExtension> {
    match ext {
        "png" => Some(ImageExtension::Png),
        "jpg" => Some(ImageExtension::Jpg),
        _ => None,
    }
}

/// Resolves the final extension of a generated asset.
///
/// `raw` is the provider's hint when it gave one, otherwise the configured format.
/// Anything that is not png/jpg falls back to the hint, then to png.
pub fn normalize_extension(raw: &str, hint: Option<&str>) -> ImageExtension {
    as_known(&clean_extension(raw))
        .or_else(|| hint.and_then(|h| as_known(&clean_extension(h))))
        .unwrap_or(ImageExtension::Png)
}

/// Picks the raw extension the same way for every provider: hint first, then format.
pub fn resolve_extension(image_format: &str, hint: Option<&str>) -> ImageExtension {
    let raw = hint.filter(|h| !h.is_empty()).unwrap_or(image_format);
    normalize_extension(raw, hint)
}
