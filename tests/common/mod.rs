//! Common test utilities for integration tests
//!
//! Shared fixtures and helpers used across integration tests. These utilities
//! are not compiled into the library.

#![allow(dead_code)]

use anyhow::Result;
use doc_examples::{load_documents, CheckRunner, CheckSummary, Document, ExtractConfig};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated test fixture with automatic cleanup
///
/// Creates a temporary copy of a fixture documents tree, allowing tests to run
/// in parallel without interfering with each other.
pub struct TestFixture {
    _docs_dir: TempDir,
    docs_path: PathBuf,
}

impl TestFixture {
    /// Create a new test fixture from the default valid_docs directory
    pub fn new() -> Result<Self> {
        Self::new_from("tests/fixtures/valid_docs")
    }

    /// Create a new test fixture from a specific source directory
    pub fn new_from(source: impl AsRef<Path>) -> Result<Self> {
        let docs_dir = TempDir::new()?;

        copy_dir_all(source.as_ref(), docs_dir.path())?;

        Ok(Self {
            docs_path: docs_dir.path().to_path_buf(),
            _docs_dir: docs_dir,
        })
    }

    /// Get the path to the documents directory
    pub fn docs_path(&self) -> &Path {
        &self.docs_path
    }

    /// Reads the fixture's documents the way the CLI does
    pub fn documents(&self) -> Result<Vec<Document>> {
        let (_, config) = ExtractConfig::discover(self.docs_path(), None)?;
        load_documents(self.docs_path(), &config)
    }

    /// Runs the checkers over the fixture, bypassing approval
    pub async fn check(&self) -> Result<CheckSummary> {
        CheckRunner::new_for_testing()
            .with_concurrency(2)
            .run_async(self.docs_path(), None)
            .await
    }
}

/// Recursively copy all files and directories from src to dst
fn copy_dir_all(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Result<()> {
    std::fs::create_dir_all(&dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let ty = entry.file_type()?;
        if ty.is_dir() {
            copy_dir_all(entry.path(), dst.as_ref().join(entry.file_name()))?;
        } else {
            std::fs::copy(entry.path(), dst.as_ref().join(entry.file_name()))?;
        }
    }
    Ok(())
}
