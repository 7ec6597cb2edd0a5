//! Load/save collaborator for the persisted highlight collection
//!
//! The persisted form is a JSON array of highlights, newest first. Anything
//! unreadable is treated as an empty collection.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::Result;
use crate::highlight::Highlight;

pub trait HighlightStore {
    /// Highlights saved under `key`; empty when absent or malformed
    fn load(&self, key: &str) -> Vec<Highlight>;

    fn save(&self, key: &str, highlights: &[Highlight]) -> Result<()>;
}

/// Parse a persisted collection, degrading to an empty list
#[must_use]
pub fn parse_highlights(content: &str) -> Vec<Highlight> {
    if content.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str(content) {
        Ok(highlights) => highlights,
        Err(e) => {
            warn!("Malformed highlight data, starting empty: {e}");
            Vec::new()
        }
    }
}

/// One JSON file per document, named after a hash of the document key
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("highlights_{}.json", key_hash(key)))
    }

    /// Read a highlight file directly
    pub fn read_file(path: &Path) -> Result<Vec<Highlight>> {
        let content = fs::read_to_string(path)?;
        Ok(parse_highlights(&content))
    }
}

impl HighlightStore for JsonFileStore {
    fn load(&self, key: &str) -> Vec<Highlight> {
        let path = self.path_for(key);
        if !path.exists() {
            debug!("No saved highlights at {path:?}");
            return Vec::new();
        }
        match Self::read_file(&path) {
            Ok(highlights) => {
                debug!("Loaded {} highlights from {path:?}", highlights.len());
                highlights
            }
            Err(e) => {
                warn!("Failed to read highlights from {path:?}: {e}");
                Vec::new()
            }
        }
    }

    fn save(&self, key: &str, highlights: &[Highlight]) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        let json = serde_json::to_string_pretty(highlights)?;
        let path = self.path_for(key);
        fs::write(&path, json)?;
        debug!("Saved {} highlights to {path:?}", highlights.len());
        Ok(())
    }
}

/// Store kept in memory, for tests and hosts that persist elsewhere
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed raw serialized data for `key`
    pub fn insert_raw(&self, key: &str, content: impl Into<String>) {
        self.documents
            .borrow_mut()
            .insert(key.to_string(), content.into());
    }

    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.documents.borrow().get(key).cloned()
    }
}

impl HighlightStore for MemoryStore {
    fn load(&self, key: &str) -> Vec<Highlight> {
        self.documents
            .borrow()
            .get(key)
            .map(|content| parse_highlights(content))
            .unwrap_or_default()
    }

    fn save(&self, key: &str, highlights: &[Highlight]) -> Result<()> {
        let json = serde_json::to_string(highlights)?;
        self.insert_raw(key, json);
        Ok(())
    }
}

fn key_hash(key: &str) -> String {
    let digest = md5::compute(key.as_bytes());
    format!("{digest:x}")
}
