use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while scanning a document for fenced code blocks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// An opening fence was never closed before the end of the document.
    #[error("{}:{line}: unbalanced code fence (opening fence is never closed)", .path.display())]
    MalformedFence { path: PathBuf, line: usize },
}

impl ParseError {
    pub fn path(&self) -> &Path {
        match self {
            ParseError::MalformedFence { path, .. } => path,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            ParseError::MalformedFence { line, .. } => *line,
        }
    }
}
