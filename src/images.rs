//! Uploaded image storage.
//!
//! Images live flat in one directory. Client-supplied filenames are reduced
//! to a safe basename before touching the filesystem.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extensions accepted for upload (compared case-insensitively).
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("No file part in the request")]
    MissingFile,
    #[error("No file selected")]
    EmptyFilename,
    #[error("Uploaded file is empty")]
    EmptyFile,
    #[error("File type not allowed: {0}")]
    DisallowedExtension(String),
    #[error("I/O error for {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] io::Error),
}

/// Reduces a client filename to a safe basename.
///
/// Drops any directory components, turns whitespace into `_`, removes every
/// character outside `[A-Za-z0-9._-]` and strips leading dots. Returns `None`
/// if nothing usable is left.
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some('_')
            } else if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                Some(c)
            } else {
                None
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches(['.', '_']).trim_end_matches('.');
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

fn extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Returns true if the filename has an allowed image extension.
pub fn allowed_extension(filename: &str) -> bool {
    extension(filename).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

/// Content type to serve a stored file with.
pub fn content_type_for(filename: &str) -> &'static str {
    match extension(filename).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Directory of uploaded images.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Validates and writes an upload, returning the stored filename.
    ///
    /// Creates the directory if needed. An existing file with the same name
    /// is replaced.
    pub async fn save(&self, raw_name: &str, bytes: &[u8]) -> Result<String, ImageError> {
        if raw_name.trim().is_empty() {
            return Err(ImageError::EmptyFilename);
        }
        let filename = sanitize_filename(raw_name)
            .ok_or_else(|| ImageError::DisallowedExtension(raw_name.to_string()))?;
        if !allowed_extension(&filename) {
            return Err(ImageError::DisallowedExtension(filename));
        }
        if bytes.is_empty() {
            return Err(ImageError::EmptyFile);
        }

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ImageError::Io(self.dir.clone(), e))?;

        let path = self.dir.join(&filename);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| ImageError::Io(path.clone(), e))?;

        tracing::info!("Stored image {} ({} bytes)", filename, bytes.len());
        Ok(filename)
    }

    /// Reads a stored image and its content type.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    pub async fn read(&self, raw_name: &str) -> Result<Option<(Vec<u8>, &'static str)>, ImageError> {
        let Some(filename) = sanitize_filename(raw_name) else {
            return Ok(None);
        };
        let path = self.dir.join(&filename);

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some((bytes, content_type_for(&filename)))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ImageError::Io(path, e)),
        }
    }
}
