//! # Menu Prompts
//!
//! The extraction prompt sent with every menu photo and the style guidance
//! appended to every dish illustration prompt.

use crate::types::MenuItem;

pub const MENU_EXTRACTION_PROMPT: &str = r#"You are a Michelin-star menu curator. You will receive an image of a menu. Extract every distinct menu listing including its name, price or cost (include the currency symbol or numeric value exactly as shown), and a concise one-sentence description no longer than 30 words. If the menu already supplies a description, summarize it to a single sentence. Return strict JSON matching this schema: {"items": [{"name": "string", "price": "string", "description": "string"}]}."#;

pub const IMAGE_STYLE_GUIDANCE: &str = "Highly appetizing studio photography, natural lighting, shallow depth of field, served on restaurant-quality plating.";

/// Composes the image-generation prompt for a dish. The template is shared by all providers.
pub fn build_dish_prompt(item: &MenuItem) -> String {
    format!(
        "{} — {}. {}",
        item.name, item.description, IMAGE_STYLE_GUIDANCE
    )
}
