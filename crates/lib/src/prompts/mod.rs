//! # Prompt Template Modules
//!
//! This module organizes the prompt templates used by the `menuvision` library.

pub mod menu;
