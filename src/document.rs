use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// A Markdown document: where it came from and its raw text.
///
/// The body is never mutated after construction, so extracted code blocks can
/// borrow straight from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    path: PathBuf,
    body: String,
}

impl Document {
    pub fn new(path: impl Into<PathBuf>, body: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            body: body.into(),
        }
    }

    /// Reads a document from disk as UTF-8 text.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let body = fs::read_to_string(path)
            .with_context(|| format!("Failed to read document {}", path.display()))?;
        Ok(Self::new(path, body))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// File name without its Markdown extension, used to name exported blocks.
    pub fn stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document")
    }
}
