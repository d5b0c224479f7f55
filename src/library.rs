use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::debug;

use crate::error::{FixturaError, Result};

#[derive(Debug)]
enum ItemSource {
    /// Text is read from the backing file on first access.
    File(PathBuf),
    /// Text was supplied up front (ad hoc items and tests).
    Inline,
}

/// A single named fixture backed by one file.
///
/// The text is loaded lazily on first access and cached for the lifetime of
/// the item. An item is immutable once its text has been loaded.
#[derive(Debug)]
pub struct LibraryItem {
    key: String,
    source: ItemSource,
    text: OnceLock<String>,
}

impl LibraryItem {
    pub fn from_file(key: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            key: key.into(),
            source: ItemSource::File(path.into()),
            text: OnceLock::new(),
        }
    }

    pub fn from_text(key: impl Into<String>, text: impl Into<String>) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(text.into());
        Self {
            key: key.into(),
            source: ItemSource::Inline,
            text: cell,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn source_path(&self) -> Option<&Path> {
        match &self.source {
            ItemSource::File(path) => Some(path),
            ItemSource::Inline => None,
        }
    }

    /// The item text, reading the backing file on first access.
    pub fn text(&self) -> Result<&str> {
        match &self.source {
            ItemSource::Inline => Ok(self.text.get_or_init(String::new).as_str()),
            ItemSource::File(path) => {
                if let Some(text) = self.text.get() {
                    return Ok(text.as_str());
                }
                let loaded = fs::read_to_string(path)?;
                debug!(key = %self.key, path = %path.display(), "loaded library item");
                Ok(self.text.get_or_init(|| loaded).as_str())
            }
        }
    }
}

/// The key → item store for one file-type family.
///
/// Built once at startup from an externally supplied list of discovered
/// files. No mutation or deletion after that, and no thread-safety
/// guarantees; callers serialize access themselves.
#[derive(Debug, Default)]
pub struct Catalog {
    items: HashMap<String, LibraryItem>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an item under its key. A duplicate key is skipped, not
    /// overwritten: overlapping search paths may legitimately discover the
    /// same item twice and the first registration wins.
    pub fn register(&mut self, item: LibraryItem) {
        if self.items.contains_key(item.key()) {
            debug!(key = %item.key(), "duplicate library key skipped");
            return;
        }
        self.items.insert(item.key().to_owned(), item);
    }

    /// Derives the catalog key from a discovered file path and registers a
    /// lazily-loaded item for it. Paths outside the root folder are skipped.
    pub fn register_file(&mut self, path: &Path, root_folder: &str, extension: &str) {
        match key_for_path(path, root_folder, extension) {
            Some(key) => self.register(LibraryItem::from_file(key, path)),
            None => debug!(path = %path.display(), root_folder, "path outside the library root, skipped"),
        }
    }

    /// The item text for a key, loading it from disk on first access.
    pub fn get(&self, key: &str) -> Result<&str> {
        self.items
            .get(key)
            .ok_or_else(|| FixturaError::ItemNotFound { key: key.to_owned() })?
            .text()
    }

    pub fn item(&self, key: &str) -> Option<&LibraryItem> {
        self.items.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Derives a catalog key from a discovered file path: the portion of the
/// path after the root folder name, with separators replaced by `.` and the
/// extension stripped.
pub fn key_for_path(path: &Path, root_folder: &str, extension: &str) -> Option<String> {
    let full = path.to_string_lossy();
    let index = full.find(root_folder)?;
    let relative = full[index + root_folder.len()..].trim_start_matches(['/', '\\']);
    let mut key = relative.replace(['/', '\\'], ".");
    if key.ends_with(extension) {
        let stripped_len = key.len() - extension.len();
        key.truncate(stripped_len);
    }
    if key.is_empty() { None } else { Some(key) }
}
