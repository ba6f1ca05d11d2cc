//! Input sources for the parsers
//!
//! A source is either a file on disk or an in-memory upload. Both readers
//! accept either kind and apply the same size guard before parsing.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// One CSV input to be parsed
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// File on disk; size is checked from metadata
    Path(PathBuf),
    /// Uploaded bytes with the name reported in errors and logs
    Bytes { name: String, data: Arc<[u8]> },
}

impl Source {
    /// Create a source reading from a file
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Source::Path(path.into())
    }

    /// Create a source over an in-memory upload
    ///
    /// # Arguments
    ///
    /// * `name` - Name reported in errors (typically the original file name)
    /// * `data` - Raw CSV bytes
    pub fn bytes(name: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Source::Bytes {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Name used in errors and logs
    pub fn name(&self) -> String {
        match self {
            Source::Path(path) => path.display().to_string(),
            Source::Bytes { name, .. } => name.clone(),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
