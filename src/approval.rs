//! Approval of configuration files before their checkers are run.
//!
//! A configuration names commands that `check` executes, so it is trusted only
//! once a user has approved its exact content (direnv style). An approval is a
//! file named by the SHA-256 of `canonical path + "\n" + content`; editing the
//! configuration changes the hash and revokes it.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "doc-examples";

/// Compute SHA256 hash of path + "\n" + content
pub fn compute_hash(path: &Path, content: &str) -> String {
    let canonical_path = canonical(path);
    let input = format!("{}\n{}", canonical_path.display(), content);
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Directory of approval marker files.
#[derive(Debug, Clone)]
pub struct ApprovalStore {
    dir: PathBuf,
}

impl ApprovalStore {
    /// Opens the store in the user data directory: `$XDG_DATA_HOME/doc-examples/allow`
    /// when the variable is set, else the platform default.
    pub fn open_default() -> Result<Self> {
        if let Ok(xdg_data_home) = std::env::var("XDG_DATA_HOME") {
            return Ok(Self::at(PathBuf::from(xdg_data_home).join(APP_NAME).join("allow")));
        }

        let proj_dirs = ProjectDirs::from("", "", APP_NAME)
            .context("Failed to determine project directories")?;
        Ok(Self::at(proj_dirs.data_dir().join("allow")))
    }

    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn marker_for(&self, config_path: &Path) -> Result<PathBuf> {
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        Ok(self.dir.join(compute_hash(config_path, &content)))
    }

    /// Check if a configuration file is approved in its current state
    pub fn is_approved(&self, config_path: &Path) -> Result<bool> {
        Ok(self.marker_for(config_path)?.exists())
    }

    /// Approve a configuration file in its current state
    pub fn approve(&self, config_path: &Path) -> Result<()> {
        let marker = self.marker_for(config_path)?;

        fs::create_dir_all(&self.dir).with_context(|| {
            format!("Failed to create approval directory: {}", self.dir.display())
        })?;

        fs::write(&marker, canonical(config_path).display().to_string())
            .with_context(|| format!("Failed to write approval file: {}", marker.display()))?;

        log::info!("Approved {}", config_path.display());
        Ok(())
    }

    /// Remove the approval of a configuration file, if any
    pub fn deny(&self, config_path: &Path) -> Result<()> {
        let marker = self.marker_for(config_path)?;

        if marker.exists() {
            fs::remove_file(&marker).with_context(|| {
                format!("Failed to remove approval file: {}", marker.display())
            })?;
            log::info!("Revoked approval of {}", config_path.display());
        }

        Ok(())
    }

    /// Paths of all approved configuration files, sorted
    pub fn list_approved(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(vec![]);
        }

        let mut approved = Vec::new();
        for entry in fs::read_dir(&self.dir).with_context(|| {
            format!("Failed to read approval directory: {}", self.dir.display())
        })? {
            let entry = entry?;
            if entry.path().is_file() {
                if let Ok(path_content) = fs::read_to_string(entry.path()) {
                    approved.push(path_content);
                }
            }
        }

        approved.sort();
        Ok(approved)
    }
}
