//! # API Route Handlers
//!
//! This module organizes all the Axum route handlers for the `menuvision-server`.
//! Uploading pages and generating images are separate steps, so the browser can
//! show extracted items right away and request pictures one item at a time.

pub mod general;
pub mod generate_image;
pub mod process;

// Re-export all handlers under a single `handlers::` path for the router.
pub use general::*;
pub use generate_image::*;
pub use process::*;

// Shared items used by multiple handler modules.
use super::{errors::AppError, state::AppState};
