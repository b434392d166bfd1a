//! Zip backups of the data file and uploaded images.
//!
//! Archive layout:
//! ```text
//! app_data.json
//! images/
//!   cake.jpg
//!   ...
//! ```
//!
//! The archive is assembled in a temporary file that is removed when it goes
//! out of scope, whether or not the backup succeeded. Downloads read it back
//! through [`ArchiveReader`], which owns the file until the body is done.

use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::{self, Seek};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use tempfile::{NamedTempFile, TempPath};
use thiserror::Error;
use tokio::io::{AsyncRead, ReadBuf};
use walkdir::WalkDir;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Directory prefix for images inside the archive.
pub const IMAGES_PREFIX: &str = "images";

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("Data file {} does not exist", .0.display())]
    MissingStore(PathBuf),
    #[error("I/O error for {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] io::Error),
    #[error("Failed to write archive: {0}")]
    Zip(#[from] ZipError),
    #[error("Failed to walk image directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Failed to move archive into place: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// File name offered to clients downloading a backup.
pub fn archive_file_name(now: DateTime<Utc>) -> String {
    format!("homepantry-backup-{}.zip", now.format("%Y%m%d-%H%M%S"))
}

/// Builds a backup archive in a temporary file, rewound to the start.
pub fn archive(data_file: &Path, image_dir: &Path) -> Result<NamedTempFile, BackupError> {
    let mut archive = build_archive(NamedTempFile::new(), data_file, image_dir)?;
    archive
        .as_file_mut()
        .rewind()
        .map_err(|e| BackupError::Io(archive.path().to_path_buf(), e))?;
    Ok(archive)
}

/// Async reader over a temporary archive.
///
/// The file is deleted when the reader is dropped, including when a
/// download is abandoned halfway.
#[derive(Debug)]
pub struct ArchiveReader {
    file: tokio::fs::File,
    size: u64,
    _path: TempPath,
}

impl ArchiveReader {
    pub fn new(archive: NamedTempFile) -> Result<Self, BackupError> {
        let size = archive
            .as_file()
            .metadata()
            .map_err(|e| BackupError::Io(archive.path().to_path_buf(), e))?
            .len();
        let (file, path) = archive.into_parts();
        Ok(Self {
            file: tokio::fs::File::from_std(file),
            size,
            _path: path,
        })
    }

    /// Archive size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }
}

impl AsyncRead for ArchiveReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.file).poll_read(cx, buf)
    }
}

/// Writes a backup archive to `output`.
///
/// The archive is built next to `output` and renamed over it, so a failed
/// export never leaves a partial file behind.
pub fn export_to(data_file: &Path, image_dir: &Path, output: &Path) -> Result<(), BackupError> {
    let dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let archive = build_archive(NamedTempFile::new_in(dir), data_file, image_dir)?;
    archive.persist(output)?;
    Ok(())
}

fn build_archive(
    temp: io::Result<NamedTempFile>,
    data_file: &Path,
    image_dir: &Path,
) -> Result<NamedTempFile, BackupError> {
    if !data_file.is_file() {
        return Err(BackupError::MissingStore(data_file.to_path_buf()));
    }

    let mut archive = temp.map_err(|e| BackupError::Io(std::env::temp_dir(), e))?;
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut entries = 0usize;

    {
        let mut zip = ZipWriter::new(archive.as_file_mut());

        let name = data_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "app_data.json".to_string());
        add_file(&mut zip, name, data_file, options)?;
        entries += 1;

        if image_dir.is_dir() {
            for entry in WalkDir::new(image_dir).follow_links(true).sort_by_file_name() {
                let entry = entry?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let Ok(rel) = entry.path().strip_prefix(image_dir) else {
                    continue;
                };
                let name = format!(
                    "{}/{}",
                    IMAGES_PREFIX,
                    rel.to_string_lossy().replace('\\', "/")
                );
                add_file(&mut zip, name, entry.path(), options)?;
                entries += 1;
            }
        }

        zip.finish()?;
    }

    tracing::info!("Built backup archive with {} entries", entries);
    Ok(archive)
}

fn add_file<W: io::Write + io::Seek>(
    zip: &mut ZipWriter<W>,
    name: String,
    source: &Path,
    options: SimpleFileOptions,
) -> Result<(), BackupError> {
    let mut file = File::open(source).map_err(|e| BackupError::Io(source.to_path_buf(), e))?;
    zip.start_file(name, options)?;
    io::copy(&mut file, zip).map_err(|e| BackupError::Io(source.to_path_buf(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::{Cursor, Read};
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;
    use zip::ZipArchive;

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let data_file = temp_dir.path().join("app_data.json");
        let image_dir = temp_dir.path().join("images");
        (temp_dir, data_file, image_dir)
    }

    fn archive_bytes(data_file: &Path, image_dir: &Path) -> Result<Vec<u8>, BackupError> {
        let mut bytes = Vec::new();
        archive(data_file, image_dir)?.read_to_end(&mut bytes).unwrap();
        Ok(bytes)
    }

    fn entry_names(bytes: Vec<u8>) -> Vec<String> {
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        names
    }

    #[test]
    fn test_archive_file_name() {
        let now = DateTime::parse_from_rfc3339("2025-06-01T08:09:10Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(archive_file_name(now), "homepantry-backup-20250601-080910.zip");
    }

    #[test]
    fn test_missing_store_is_error() {
        let (_temp, data_file, image_dir) = setup();

        let result = archive_bytes(&data_file, &image_dir);

        assert!(matches!(result, Err(BackupError::MissingStore(_))));
    }

    #[test]
    fn test_archive_contains_document_and_images() {
        let (_temp, data_file, image_dir) = setup();
        fs::write(&data_file, r#"{"pantry": []}"#).unwrap();
        fs::create_dir_all(image_dir.join("nested")).unwrap();
        fs::write(image_dir.join("cake.jpg"), b"jpeg").unwrap();
        fs::write(image_dir.join("nested").join("soup.png"), b"png").unwrap();

        let bytes = archive_bytes(&data_file, &image_dir).unwrap();

        assert_eq!(
            entry_names(bytes.clone()),
            vec!["app_data.json", "images/cake.jpg", "images/nested/soup.png"]
        );

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut contents = String::new();
        archive
            .by_name("app_data.json")
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, r#"{"pantry": []}"#);
    }

    #[test]
    fn test_archive_without_image_dir() {
        let (_temp, data_file, image_dir) = setup();
        fs::write(&data_file, "{}").unwrap();

        let bytes = archive_bytes(&data_file, &image_dir).unwrap();

        assert_eq!(entry_names(bytes), vec!["app_data.json"]);
    }

    #[tokio::test]
    async fn test_reader_streams_archive_and_removes_it() {
        let (_temp, data_file, image_dir) = setup();
        fs::write(&data_file, "{}").unwrap();
        fs::create_dir_all(&image_dir).unwrap();
        fs::write(image_dir.join("a.png"), b"png").unwrap();

        let archive = archive(&data_file, &image_dir).unwrap();
        let archive_path = archive.path().to_path_buf();
        let mut reader = ArchiveReader::new(archive).unwrap();

        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await.unwrap();
        assert_eq!(bytes.len() as u64, reader.size());
        assert_eq!(entry_names(bytes), vec!["app_data.json", "images/a.png"]);
        assert!(archive_path.exists());

        drop(reader);
        assert!(!archive_path.exists());
    }

    #[test]
    fn test_export_to_writes_archive() {
        let (temp, data_file, image_dir) = setup();
        fs::write(&data_file, "{}").unwrap();
        fs::create_dir_all(&image_dir).unwrap();
        fs::write(image_dir.join("a.png"), b"png").unwrap();
        let output = temp.path().join("out").join("backup.zip");
        fs::create_dir_all(output.parent().unwrap()).unwrap();

        export_to(&data_file, &image_dir, &output).unwrap();

        let bytes = fs::read(&output).unwrap();
        assert_eq!(entry_names(bytes), vec!["app_data.json", "images/a.png"]);
        // Only the final archive remains; the temp file was renamed into place.
        let leftovers = fs::read_dir(output.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_symlinked_images_are_archived() {
        let (temp, data_file, image_dir) = setup();
        fs::write(&data_file, "{}").unwrap();
        fs::create_dir_all(&image_dir).unwrap();
        fs::write(temp.path().join("shared.png"), b"png").unwrap();
        std::os::unix::fs::symlink(temp.path().join("shared.png"), image_dir.join("b.png")).unwrap();

        let bytes = archive_bytes(&data_file, &image_dir).unwrap();

        assert_eq!(entry_names(bytes), vec!["app_data.json", "images/b.png"]);
    }

    #[test]
    fn test_build_failure_removes_temp_archive() {
        let (temp, data_file, image_dir) = setup();
        fs::write(&data_file, "{}").unwrap();
        fs::create_dir_all(&image_dir).unwrap();
        std::os::unix::fs::symlink(temp.path().join("gone.png"), image_dir.join("a.png")).unwrap();
        let scratch = temp.path().join("scratch");
        fs::create_dir_all(&scratch).unwrap();

        let result = build_archive(NamedTempFile::new_in(&scratch), &data_file, &image_dir);

        assert!(matches!(result, Err(BackupError::Walk(_))));
        assert_eq!(fs::read_dir(&scratch).unwrap().count(), 0);
    }

    #[test]
    fn test_failed_export_leaves_nothing_behind() {
        let (temp, data_file, image_dir) = setup();
        let out_dir = temp.path().join("out");
        fs::create_dir_all(&out_dir).unwrap();

        let result = export_to(&data_file, &image_dir, &out_dir.join("backup.zip"));

        assert!(matches!(result, Err(BackupError::MissingStore(_))));
        assert_eq!(fs::read_dir(&out_dir).unwrap().count(), 0);
    }
}
