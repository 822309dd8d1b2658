use anyhow::{Context, Result};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Finds the documents to scan under `root`.
///
/// `root` may be a single file, which is returned as-is whatever its
/// extension. Directories are walked recursively, honouring `.gitignore` /
/// `.ignore` files and skipping hidden entries; only files whose extension is
/// in `extensions` (case-insensitive) are kept. The result is sorted so runs
/// are reproducible.
pub fn discover_documents(root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    if !root.is_dir() {
        anyhow::bail!("Path does not exist: {}", root.display());
    }

    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(true)
        .git_global(false)
        .require_git(false)
        .follow_links(false);

    let mut documents = Vec::new();
    for entry in builder.build() {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        let path = entry.path();

        if entry.file_type().is_some_and(|t| t.is_file()) && has_extension(path, extensions) {
            documents.push(path.to_path_buf());
        }
    }

    documents.sort();
    log::debug!(
        "Discovered {} document(s) under {}",
        documents.len(),
        root.display()
    );
    Ok(documents)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}
