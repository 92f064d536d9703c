//! Mapping files on disk to the URLs the browser fetches them from.

use reqwest::Url;
use std::path::{Component, Path};

pub const STATIC_URL_PREFIX: &str = "/static";

/// Joins the normal components of a relative path with `/`.
pub fn to_url_path(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Returns the path of `path` relative to `static_root`, using `/` separators.
pub fn relative_to_static(static_root: &Path, path: &Path) -> Option<String> {
    let resolved = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    resolved
        .strip_prefix(static_root)
        .ok()
        .map(to_url_path)
}

/// `/static/<relative path>` for files under `static_root`, otherwise a `file://` URI.
pub fn make_static_url(static_root: &Path, path: &Path) -> String {
    match relative_to_static(static_root, path) {
        Some(relative) => format!("{STATIC_URL_PREFIX}/{relative}"),
        None => Url::from_file_path(path)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| format!("file://{}", path.display())),
    }
}
