//! # Shared Constants
//!
//! This module provides a centralized location for constants that are shared across
//! the crates in the `menuvision` workspace.

/// Provider tag for the direct image-generation model.
pub const GEMINI_IMAGE_PROVIDER: &str = "gemini_imagen";

/// Provider tag for the third-party FAL HTTP image API.
pub const FAL_IMAGE_PROVIDER: &str = "fal_flux_krea";

pub const DEFAULT_IMAGE_PROVIDER: &str = FAL_IMAGE_PROVIDER;
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const FLASH_LITE_MODEL: &str = "gemini-2.5-flash-lite";
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-3.0-generate-002";
pub const DEFAULT_IMAGE_FORMAT: &str = "png";
pub const DEFAULT_FAL_MODEL: &str = "fal-ai/flux/krea";
pub const DEFAULT_FAL_IMAGE_SIZE: &str = "square_hd";

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const FAL_API_BASE: &str = "https://fal.run";

/// Upper bound for a single provider request, including downloads.
pub const REQUEST_TIMEOUT_SECS: u64 = 120;

/// The longer edge of a menu photo is scaled down to this many pixels before upload.
pub const MAX_UPLOAD_DIMENSION: u32 = 2048;

pub const DEFAULT_MAX_WORKERS: usize = 4;

/// The metadata document written into every page output directory.
pub const PAGE_METADATA_FILENAME: &str = "menu_items.json";

/// The metadata document written into every server session directory.
pub const SESSION_METADATA_FILENAME: &str = "session.json";
