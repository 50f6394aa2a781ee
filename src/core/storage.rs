use crate::core::error::{LmsError, Result};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Extensions accepted for profile images.
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

/// Local file store for uploaded profile images.
///
/// Files live under `root` and are referenced from the database by a
/// relative public path (`{public_prefix}/{filename}`), resolved against the
/// static file service at read time.
#[derive(Clone)]
pub struct AvatarStore {
    root: PathBuf,
    public_prefix: String,
    max_bytes: u64,
}

impl AvatarStore {
    pub fn new(root: PathBuf, public_prefix: String, max_bytes: u64) -> Self {
        Self {
            root,
            public_prefix,
            max_bytes,
        }
    }

    /// Ensure the upload directory exists.
    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root).map_err(LmsError::IoError)
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Validate an uploaded image by filename extension and declared content type.
    pub fn validate_upload(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        size: u64,
    ) -> Result<String> {
        if size > self.max_bytes {
            return Err(LmsError::ValidationError(format!(
                "File too large. Maximum size is {} MB",
                self.max_bytes / (1024 * 1024)
            )));
        }

        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .ok_or_else(|| {
                LmsError::ValidationError("Only image files are allowed".to_string())
            })?;

        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(LmsError::ValidationError(
                "Only image files are allowed".to_string(),
            ));
        }

        // The extension must map to an image MIME type, and any declared
        // content type must agree.
        let guessed = mime_guess::from_ext(&extension).first_or_octet_stream();
        if guessed.type_() != mime_guess::mime::IMAGE {
            return Err(LmsError::ValidationError(
                "Only image files are allowed".to_string(),
            ));
        }
        if let Some(declared) = content_type {
            if !declared.starts_with("image/") {
                return Err(LmsError::ValidationError(
                    "Only image files are allowed".to_string(),
                ));
            }
        }

        Ok(extension)
    }

    /// Write uploaded bytes under a unique filename and return the public
    /// relative path to store in the database.
    pub async fn save(&self, bytes: &[u8], extension: &str) -> Result<String> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(LmsError::IoError)?;

        let filename = format!("profile-{}.{}", Uuid::new_v4(), extension);
        let path = self.root.join(&filename);

        tokio::fs::write(&path, bytes)
            .await
            .map_err(LmsError::IoError)?;

        Ok(format!("{}/{}", self.public_prefix, filename))
    }

    /// Delete a stored image by its public relative path.
    ///
    /// A missing file is not an error: a dangling avatar path reads as
    /// "no avatar" everywhere, so deletion tolerates it too.
    pub async fn delete(&self, public_path: &str) -> Result<()> {
        let Some(path) = self.resolve(public_path) else {
            tracing::warn!(path = %public_path, "Refusing to delete avatar outside the store");
            return Ok(());
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LmsError::IoError(e)),
        }
    }

    /// Resolve a public relative path to an on-disk path.
    ///
    /// Returns None for paths outside this store's public prefix or paths
    /// that attempt directory traversal.
    fn resolve(&self, public_path: &str) -> Option<PathBuf> {
        let filename = public_path.strip_prefix(&self.public_prefix)?
            .trim_start_matches('/');

        if filename.is_empty() || filename.contains('/') || filename.contains("..") {
            return None;
        }

        Some(self.root.join(filename))
    }
}
