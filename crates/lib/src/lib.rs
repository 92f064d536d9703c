//! # Menu Vision
//!
//! This crate digitizes a photographed restaurant menu into structured items and
//! illustrates every item with a generated image. It provides:
//!
//! - an extraction client over a vision-capable model ([`extract::MenuExtractor`]),
//! - interchangeable image providers behind [`providers::image::ImageProvider`],
//! - a bounded-concurrency fan-out that restores extraction order ([`fanout`]),
//! - flat-file page and session metadata ([`metadata`], [`session`]).

pub mod constants;
pub mod errors;
pub mod extract;
pub mod fanout;
pub mod metadata;
pub mod naming;
pub mod pipeline;
pub mod preprocess;
pub mod prompts;
pub mod providers;
pub mod session;
pub mod settings;
pub mod types;

pub use errors::{ConfigError, ExtractionError, ImageGenerationError, MenuError};
pub use pipeline::{MenuPipeline, MenuPipelineBuilder};
pub use types::{EnrichedItem, MenuItem, ProcessedMenu};
