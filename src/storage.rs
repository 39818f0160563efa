//! The flat upload directory shared by all requests.
//!
//! Originals are stored as `<uuid>.pdf`, processed copies as
//! `processed_<uuid>.pdf`, side by side. There is no index: a stored name is
//! its own identifier, and nothing maps it back to the name the client
//! uploaded.

use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use uuid::Uuid;

/// Prefix of the copy written by the remover.
pub const PROCESSED_PREFIX: &str = "processed_";

/// Permission bits applied to the upload directory on Unix.
pub const UPLOAD_DIR_MODE: u32 = 0o755;

#[derive(Error, Debug)]
pub enum StorageError {
    /// The name is empty, a dot entry, or would escape the directory.
    #[error("invalid file name: {0:?}")]
    InvalidName(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Handle on the upload directory.
#[derive(Debug, Clone)]
pub struct UploadDir {
    root: PathBuf,
}

impl UploadDir {
    /// Create the directory if needed and apply [`UPLOAD_DIR_MODE`].
    pub fn open<P: Into<PathBuf>>(root: P) -> Result<Self, StorageError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&root, std::fs::Permissions::from_mode(UPLOAD_DIR_MODE))?;
        }

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a stored name to its path, refusing anything that is not a plain
    /// file name inside the directory.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, StorageError> {
        if !is_plain_name(name) {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(name))
    }

    /// `true` when `name` is valid and names an existing regular file.
    pub fn exists(&self, name: &str) -> bool {
        self.resolve(name).map(|path| path.is_file()).unwrap_or(false)
    }

    /// Store `data` under `name`. The bytes go to a temporary file in the
    /// same directory first and are renamed into place once complete.
    pub fn write(&self, name: &str, data: &[u8]) -> Result<PathBuf, StorageError> {
        let path = self.resolve(name)?;
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| StorageError::Io(e.error))?;
        Ok(path)
    }
}

/// A fresh collision-resistant name for an upload.
pub fn new_temp_name() -> String {
    format!("{}.pdf", Uuid::new_v4())
}

/// Name of the processed copy of `temp_name`.
pub fn processed_name(temp_name: &str) -> String {
    format!("{PROCESSED_PREFIX}{temp_name}")
}

/// Name a stored file is served under: the stored name without the
/// `processed_` prefix.
pub fn display_name(stored: &str) -> &str {
    stored.strip_prefix(PROCESSED_PREFIX).unwrap_or(stored)
}

/// Suffix check only; content is not sniffed.
pub fn is_pdf_filename(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".pdf")
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}
