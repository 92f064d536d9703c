//! # Menu Extraction
//!
//! Sends one menu photo to a vision model and turns its answer into a cleaned,
//! ordered list of [`MenuItem`]s. The model is asked for strict JSON, but its
//! text is still parsed leniently: code fences are stripped and, failing that,
//! the outermost `{...}` span is tried.

use crate::{
    errors::ExtractionError,
    preprocess::prepare_menu_image,
    prompts::menu::MENU_EXTRACTION_PROMPT,
    providers::ai::VisionProvider,
    types::MenuItem,
};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::sync::LazyLock;
use tracing::{debug, info};

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```(?:json|JSON)?\s*([\s\S]*?)```").expect("code fence regex is valid")
});

/// The extraction client.
#[derive(Debug, Clone)]
pub struct MenuExtractor {
    provider: Box<dyn VisionProvider>,
}

impl MenuExtractor {
    pub fn new(provider: Box<dyn VisionProvider>) -> Self {
        Self { provider }
    }

    /// Extracts the menu items shown in `image_bytes`.
    pub async fn extract(
        &self,
        image_bytes: &[u8],
        mime_type: &str,
    ) -> Result<Vec<MenuItem>, ExtractionError> {
        let prepared = prepare_menu_image(image_bytes, mime_type);
        let response = self
            .provider
            .generate_from_image(MENU_EXTRACTION_PROMPT, &prepared)
            .await?;

        debug!("<-- Raw extraction text: {}", response.text);

        if response.text.trim().is_empty() {
            if response.finish_reasons.is_empty() {
                return Err(ExtractionError::EmptyResponse);
            }
            let reasons: BTreeSet<&str> =
                response.finish_reasons.iter().map(String::as_str).collect();
            return Err(ExtractionError::Halted {
                reasons: reasons.into_iter().collect::<Vec<_>>().join(", "),
            });
        }

        let items = parse_menu_payload(&response.text)?;
        info!("Extracted {} menu items", items.len());
        Ok(items)
    }
}

/// Parses the model's text into cleaned menu items.
pub fn parse_menu_payload(raw: &str) -> Result<Vec<MenuItem>, ExtractionError> {
    let payload = parse_lenient_json(raw)?;
    let entries = payload
        .get("items")
        .and_then(Value::as_array)
        .filter(|items| !items.is_empty())
        .ok_or(ExtractionError::NoItems)?;

    let cleaned: Vec<MenuItem> = entries
        .iter()
        .filter_map(Value::as_object)
        .filter_map(clean_item)
        .collect();

    if cleaned.is_empty() {
        return Err(ExtractionError::AllItemsEmpty);
    }
    Ok(cleaned)
}

fn parse_lenient_json(raw: &str) -> Result<Value, ExtractionError> {
    let trimmed = raw.trim();
    let first_error = match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    let unfenced = CODE_FENCE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim());
    if let Some(inner) = unfenced {
        if let Ok(value) = serde_json::from_str(inner) {
            return Ok(value);
        }
    }

    let haystack = unfenced.unwrap_or(trimmed);
    if let (Some(start), Some(end)) = (haystack.find('{'), haystack.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str(&haystack[start..=end]) {
                return Ok(value);
            }
        }
    }

    Err(ExtractionError::InvalidJson {
        source: first_error,
        raw: raw.to_string(),
    })
}

/// Renders a field as trimmed text. Falsy values (null, false, zero, empty
/// strings, arrays and objects) count as missing.
fn field_text(entry: &Map<String, Value>, key: &str) -> String {
    match entry.get(key) {
        None | Some(Value::Null) | Some(Value::Bool(false)) => String::new(),
        Some(Value::Bool(true)) => "True".to_string(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => String::new(),
        Some(Value::Array(a)) if a.is_empty() => String::new(),
        Some(Value::Object(o)) if o.is_empty() => String::new(),
        Some(other) => other.to_string().trim().to_string(),
    }
}

fn clean_item(entry: &Map<String, Value>) -> Option<MenuItem> {
    let name = field_text(entry, "name");
    if name.is_empty() {
        return None;
    }
    let mut price = field_text(entry, "price");
    if price.is_empty() {
        price = "N/A".to_string();
    }
    let mut description = field_text(entry, "description");
    if description.is_empty() {
        description = format!("A signature dish named {name}.");
    }
    Some(MenuItem {
        name,
        price,
        description,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_get_fallbacks() {
        let raw = r#"{"items":[{"name":"Truffle Risotto","price":"$24","description":"Creamy arborio rice with black truffle."},{"name":"Tiramisu","price":"","description":""}]}"#;
        let items = parse_menu_payload(raw).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Truffle Risotto");
        assert_eq!(items[0].price, "$24");
        assert_eq!(items[1].price, "N/A");
        assert_eq!(items[1].description, "A signature dish named Tiramisu.");
    }

    #[test]
    fn test_nameless_and_non_object_entries_are_dropped() {
        let raw = r#"{"items":["Soup", {"name": "  "}, {"name": " Salad ", "price": 12.5}]}"#;
        let items = parse_menu_payload(raw).unwrap();
        assert_eq!(
            items,
            vec![MenuItem {
                name: "Salad".into(),
                price: "12.5".into(),
                description: "A signature dish named Salad.".into(),
            }]
        );
    }

    #[test]
    fn test_fenced_json_is_accepted() {
        let raw = "```json\n{\"items\": [{\"name\": \"Gyoza\", \"price\": \"¥600\"}]}\n```";
        let items = parse_menu_payload(raw).unwrap();
        assert_eq!(items[0].name, "Gyoza");
        assert_eq!(items[0].price, "¥600");
    }

    #[test]
    fn test_braces_are_sliced_from_chatter() {
        let raw = "Here is the menu: {\"items\": [{\"name\": \"Pho\"}]} Enjoy!";
        let items = parse_menu_payload(raw).unwrap();
        assert_eq!(items[0].name, "Pho");
    }

    #[test]
    fn test_empty_items_is_an_error() {
        assert!(matches!(
            parse_menu_payload(r#"{"items": []}"#),
            Err(ExtractionError::NoItems)
        ));
        assert!(matches!(
            parse_menu_payload(r#"{"dishes": [{"name": "x"}]}"#),
            Err(ExtractionError::NoItems)
        ));
    }

    #[test]
    fn test_all_blank_names_is_an_error() {
        assert!(matches!(
            parse_menu_payload(r#"{"items": [{"name": ""}, 3]}"#),
            Err(ExtractionError::AllItemsEmpty)
        ));
    }

    #[test]
    fn test_garbage_is_invalid_json() {
        let err = parse_menu_payload("not json at all").unwrap_err();
        match err {
            ExtractionError::InvalidJson { raw, .. } => assert_eq!(raw, "not json at all"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_cleaned_items_are_never_blank() {
        let raw = r#"{"items":[{"name":"A","price":null,"description":"  "},{"name":"B","price":0},{"price":"$1"}]}"#;
        let items = parse_menu_payload(raw).unwrap();
        assert!(items.len() <= 3);
        for item in items {
            assert!(!item.name.trim().is_empty());
            assert!(!item.price.trim().is_empty());
            assert!(!item.description.trim().is_empty());
        }
    }

    #[test]
    fn test_empty_containers_count_as_missing() {
        let raw = r#"{"items":[{"name":{},"price":[]},{"name":"Soup","price":[],"description":{}},{"name":[],"price":"$2"}]}"#;
        let items = parse_menu_payload(raw).unwrap();
        assert_eq!(
            items,
            vec![MenuItem {
                name: "Soup".into(),
                price: "N/A".into(),
                description: "A signature dish named Soup.".into(),
            }]
        );
    }

    #[test]
    fn test_true_renders_capitalized() {
        let items = parse_menu_payload(r#"{"items":[{"name":"Water","price":true}]}"#).unwrap();
        assert_eq!(items[0].price, "True");
    }
}
