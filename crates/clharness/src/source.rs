//! Kernel source loading.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{HarnessError, Result};

/// Program text read from disk, ready to hand to the compiler.
///
/// The text never contains a NUL byte, so the runtime can always turn it into
/// the nul-terminated string the C API expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelSource {
    path: PathBuf,
    text: String,
}

impl KernelSource {
    /// Read the whole file at `path`.
    ///
    /// # Errors
    ///
    /// [`HarnessError::SourceNotFound`] if the file does not exist,
    /// [`HarnessError::SourceUnreadable`] for any other I/O failure or
    /// non-UTF-8 content, and [`HarnessError::SourceInteriorNul`] if the
    /// text contains a NUL byte.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => HarnessError::SourceNotFound { path: path.to_path_buf() },
            _ => HarnessError::SourceUnreadable { path: path.to_path_buf(), source },
        })?;
        debug!(path = %path.display(), bytes = text.len(), "loaded kernel source");
        Self::from_text(path, text)
    }

    /// Wrap text that did not come from a file (for example an embedded kernel).
    pub fn from_text(path: impl Into<PathBuf>, text: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let text = text.into();
        if let Some(offset) = text.bytes().position(|b| b == 0) {
            return Err(HarnessError::SourceInteriorNul { path, offset });
        }
        Ok(Self { path, text })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Length in bytes, excluding the terminating nul.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
