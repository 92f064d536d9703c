pub mod gemini;

use crate::{errors::ExtractionError, preprocess::PreparedImage};
use async_trait::async_trait;
use dyn_clone::DynClone;
use std::fmt::Debug;

/// The raw answer of a vision model, before any JSON parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisionResponse {
    /// All text parts of all candidates, concatenated and trimmed.
    pub text: String,
    /// Normalized finish reasons, one per candidate (or prompt block).
    pub finish_reasons: Vec<String>,
}

/// A trait for interacting with a vision-capable model.
///
/// Implementations send one image plus an instruction prompt and report what
/// the model produced. Deciding whether that output is usable is left to the
/// extraction client.
#[async_trait]
pub trait VisionProvider: Send + Sync + Debug + DynClone {
    async fn generate_from_image(
        &self,
        prompt: &str,
        image: &PreparedImage,
    ) -> Result<VisionResponse, ExtractionError>;
}

dyn_clone::clone_trait_object!(VisionProvider);
