//! JSON document storage.
//!
//! The whole application state lives in a single file:
//! ```text
//! /data/app_data.json
//! {
//!   "preparedMeals": [...],
//!   "pantry": [...],
//!   "shoppingList": [...],
//!   "recipes": [...]
//! }
//! ```
//!
//! The file is read in full and written in full. Writes go through a temp
//! file that is renamed over the target, so readers never see a torn file.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::Document;

/// Errors that can occur reading or writing the document file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error for {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] io::Error),
    #[error("Failed to parse {}: {}", .0.display(), .1)]
    Parse(PathBuf, #[source] serde_json::Error),
    #[error("Document {} is not a JSON object", .0.display())]
    NotAnObject(PathBuf),
    #[error("Failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// File-backed store for the application [`Document`].
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the document file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if the document file exists.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Loads the document.
    ///
    /// Never fails: a missing or unreadable file yields an empty document.
    /// The default collections are always present in the result.
    pub fn load(&self) -> Document {
        let mut document = match self.read() {
            Ok(document) => document,
            Err(StoreError::Io(_, e)) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("No data file at {}, starting empty", self.path.display());
                Document::default()
            }
            Err(e) => {
                tracing::warn!("{}; starting with an empty document", e);
                Document::default()
            }
        };
        document.ensure_defaults();
        document
    }

    /// Reads and parses the document file without any fallback.
    pub fn read(&self) -> Result<Document, StoreError> {
        let contents =
            fs::read_to_string(&self.path).map_err(|e| StoreError::Io(self.path.clone(), e))?;
        let value: serde_json::Value = serde_json::from_str(&contents)
            .map_err(|e| StoreError::Parse(self.path.clone(), e))?;
        Document::from_value(value).ok_or_else(|| StoreError::NotAnObject(self.path.clone()))
    }

    /// Saves the document, returning whether the write succeeded.
    ///
    /// Failures are logged, never propagated.
    pub fn save(&self, document: &Document) -> bool {
        match self.write(document) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to save data: {}", e);
                false
            }
        }
    }

    /// Serializes and atomically writes the document.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn write(&self, document: &Document) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::Io(parent.to_path_buf(), e))?;
        }

        let bytes = serde_json::to_vec_pretty(document)?;
        let temp_path = self.temp_path();

        let mut file =
            File::create(&temp_path).map_err(|e| StoreError::Io(temp_path.clone(), e))?;
        file.write_all(&bytes)
            .map_err(|e| StoreError::Io(temp_path.clone(), e))?;
        file.sync_all()
            .map_err(|e| StoreError::Io(temp_path.clone(), e))?;

        fs::rename(&temp_path, &self.path).map_err(|e| StoreError::Io(self.path.clone(), e))?;

        tracing::debug!(
            "Saved {} items to {}",
            document.item_count(),
            self.path.display()
        );
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}
