//! File storage helpers for uploaded images. Files live below a root directory and rows keep the path relative to it.

use super::core::{ServiceError, UNSAFE_FILENAME_CHARS};
use crate::config;
use anyhow::Ok as AnyOk;
use log::{debug, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 6] = [".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg"];
pub const MAX_GALLERY_FILES: usize = 5;
pub const MB: usize = 1024 * 1024;

/// Lowercased extension including the leading dot, e.g. `.jpg`.
pub fn extension_of(filename: &str) -> Option<String> {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    match name.rfind('.') {
        Some(idx) if idx + 1 < name.len() => Some(name[idx..].to_lowercase()),
        _ => None,
    }
}

pub fn sanitize_filename(name: &str) -> String {
    UNSAFE_FILENAME_CHARS.replace_all(name, "_").to_string()
}

/// First eight hex characters of a random uuid.
pub fn short_hex() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// `<unix_ts>_<hex8><ext>` for a file with the given extension.
pub fn unique_filename(ext: &str) -> String {
    sanitize_filename(&format!(
        "{}_{}{}",
        chrono::Utc::now().timestamp(),
        short_hex(),
        ext
    ))
}

pub fn is_image_content_type(content_type: Option<&str>) -> bool {
    match content_type {
        Some(ct) => ct.starts_with("image/"),
        None => false,
    }
}

pub fn content_type_for(path: &str) -> &'static str {
    match extension_of(path).as_deref() {
        Some(".jpg") | Some(".jpeg") => "image/jpeg",
        Some(".png") => "image/png",
        Some(".gif") => "image/gif",
        Some(".webp") => "image/webp",
        Some(".svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: PathBuf) -> Self {
        UploadStore { root }
    }

    /// Store rooted at the configured upload directory.
    pub fn uploads() -> Self {
        Self::new(config::upload_dir())
    }

    /// Store rooted at the configured static directory.
    pub fn statics() -> Self {
        Self::new(config::static_dir())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, relative_path: &str) -> PathBuf {
        self.root.join(relative_path.trim_start_matches('/'))
    }

    pub fn dir_of(&self, subdir: &str) -> PathBuf {
        self.root.join(subdir)
    }

    /// Write bytes to `<root>/<subdir>/<filename>` and return `subdir/filename`.
    pub fn save_as(
        &self,
        subdir: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<String, anyhow::Error> {
        let dir = self.dir_of(subdir);
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }

        let filename = sanitize_filename(filename);
        fs::write(dir.join(&filename), bytes)?;
        debug!("Saved upload {}/{} ({} bytes)", subdir, filename, bytes.len());

        AnyOk(format!("{}/{}", subdir, filename))
    }

    /// Save an image under a generated unique name after checking its extension.
    pub fn save_image(
        &self,
        subdir: &str,
        original_filename: Option<&str>,
        bytes: &[u8],
    ) -> Result<String, anyhow::Error> {
        let ext = original_filename.and_then(extension_of).unwrap_or_default();
        if !ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ServiceError::invalid(&format!(
                "File type is not allowed, allowed types: {}",
                ALLOWED_IMAGE_EXTENSIONS.join(", ")
            )));
        }

        self.save_as(subdir, &unique_filename(&ext), bytes)
    }

    /// Remove a stored file, a missing file is fine.
    pub fn delete(&self, relative_path: &str) -> Result<(), anyhow::Error> {
        if relative_path.trim().is_empty() {
            return AnyOk(());
        }

        match fs::remove_file(self.path_of(relative_path)) {
            Ok(_) => {
                debug!("Deleted upload {}", relative_path);
                AnyOk(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => AnyOk(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Same as `delete` but only logs failures, used when cleaning up after another error.
    pub fn delete_quietly(&self, relative_path: &str) {
        if let Err(e) = self.delete(relative_path) {
            warn!("Failed to delete {}: {}", relative_path, e);
        }
    }

    pub fn read(&self, relative_path: &str) -> Result<Vec<u8>, anyhow::Error> {
        match fs::read(self.path_of(relative_path)) {
            Ok(bytes) => AnyOk(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(ServiceError::not_found(&format!("File {}", relative_path)))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn exists(&self, relative_path: &str) -> bool {
        self.path_of(relative_path).is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("photo.JPG"), Some(".jpg".to_string()));
        assert_eq!(extension_of("a/b/archive.tar.gz"), Some(".gz".to_string()));
        assert_eq!(extension_of("README"), None);
        assert_eq!(extension_of("trailing."), None);
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("my photo (1).jpg"), "my_photo__1_.jpg");
        assert_eq!(sanitize_filename("ok-name_2.png"), "ok-name_2.png");
    }

    #[test]
    fn test_unique_filename_shape() {
        let name = unique_filename(".png");
        let (ts, rest) = name.split_once('_').unwrap();
        assert!(ts.parse::<i64>().is_ok());
        assert_eq!(rest.len(), 8 + 4);
        assert!(rest.ends_with(".png"));
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("classes/a.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("logo.svg"), "image/svg+xml");
        assert_eq!(content_type_for("data.bin"), "application/octet-stream");
    }

    #[test]
    fn test_store_save_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().to_path_buf());

        let rel = store
            .save_image("classes", Some("cover.PNG"), b"fake")
            .unwrap();
        assert!(rel.starts_with("classes/"));
        assert!(rel.ends_with(".png"));
        assert!(store.exists(&rel));
        assert_eq!(store.read(&rel).unwrap(), b"fake".to_vec());

        store.delete(&rel).unwrap();
        assert!(!store.exists(&rel));
        // Deleting again is not an error.
        store.delete(&rel).unwrap();

        let missing = store.read(&rel).unwrap_err();
        assert!(matches!(
            missing.downcast_ref::<ServiceError>(),
            Some(ServiceError::NotFound { .. })
        ));
    }

    #[test]
    fn test_store_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().to_path_buf());

        assert!(store.save_image("gallery", Some("script.exe"), b"x").is_err());
        assert!(store.save_image("gallery", None, b"x").is_err());
    }
}
