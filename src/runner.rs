use crate::approval::ApprovalStore;
use crate::check::{collect_check_tasks, run_checks};
use crate::config::ExtractConfig;
use crate::discovery::discover_documents;
use crate::document::Document;
use crate::error::ParseError;
use crate::language::LanguageRegistry;
use crate::listing::{scan_documents, LanguageFilter};
use crate::reporting;
use anyhow::{Context, Result};
use std::path::Path;
use tempfile::TempDir;

/// Outcome of a successful check run.
#[derive(Debug, Default)]
pub struct CheckSummary {
    pub checked: usize,
    /// Documents skipped because of an unbalanced fence
    pub malformed: Vec<ParseError>,
}

/// Runs the configured checkers against every example of a documents tree.
///
/// # Configuration
///
/// Checkers come from `doc-examples.toml` at the root of the tree, or from an
/// explicit path:
///
/// ```toml
/// [languages.python]
/// checker = "python3"
/// flags = ["-m", "py_compile"]
/// ```
///
/// # Security
///
/// The configuration must be approved (`doc-examples allow`) before any
/// checker runs, and checker paths are validated against shell
/// metacharacters and `..` traversal.
pub struct CheckRunner {
    skip_approval: bool,
    concurrency: usize,
}

impl CheckRunner {
    pub fn new() -> Self {
        Self {
            skip_approval: false,
            concurrency: num_cpus::get(),
        }
    }

    /// Create a runner that skips the approval check (tests only)
    #[doc(hidden)]
    pub fn new_for_testing() -> Self {
        Self {
            skip_approval: true,
            ..Self::new()
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Checks every example under `root`.
    ///
    /// Malformed documents are reported and skipped; they do not fail the run
    /// by themselves, the caller decides from [`CheckSummary::malformed`].
    ///
    /// # Errors
    ///
    /// Fails when the configuration is not approved or invalid, when a size
    /// limit is exceeded, or when any example fails its check.
    pub async fn run_async(&self, root: &Path, config_path: Option<&Path>) -> Result<CheckSummary> {
        let (config_path, config) = ExtractConfig::discover(root, config_path)?;

        let Some(config_path) = config_path else {
            log::warn!(
                "No configuration found for {}, nothing to check",
                root.display()
            );
            // Fences are still validated so broken documents fail the run.
            let documents = load_documents(root, &config)?;
            let scan = scan_documents(&documents, &LanguageFilter::default(), |_, _, _| Ok(()))?;
            return Ok(CheckSummary {
                checked: 0,
                malformed: scan.malformed,
            });
        };

        if !self.skip_approval && !self.is_approved(&config_path)? {
            reporting::report_approval_error(&config_path);
            anyhow::bail!("{} not approved", config_path.display());
        }

        let registry = LanguageRegistry::from_config(&config);
        if registry.is_empty() {
            log::warn!("No enabled languages in {}", config_path.display());
        }

        let documents = load_documents(root, &config)?;

        let temp_dir = TempDir::new().context("Failed to create temporary directory")?;
        log::info!("Using temporary directory: {:?}", temp_dir.path());

        let collected = collect_check_tasks(&documents, &registry, temp_dir.path())?;
        log::info!("Running {} check(s)", collected.tasks.len());

        let (results, duration) = run_checks(collected.tasks, self.concurrency).await;

        let failed: Vec<_> = results.iter().filter(|r| !r.success()).collect();
        if !failed.is_empty() {
            reporting::report_check_failures(&failed)?;
        }

        reporting::print_check_statistics(&results, duration);

        Ok(CheckSummary {
            checked: results.len(),
            malformed: collected.malformed,
        })
    }

    fn is_approved(&self, config_path: &Path) -> Result<bool> {
        ApprovalStore::open_default()?.is_approved(config_path)
    }
}

impl Default for CheckRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Discovers and reads every document under `root`.
pub fn load_documents(root: &Path, config: &ExtractConfig) -> Result<Vec<Document>> {
    discover_documents(root, &config.extensions)?
        .iter()
        .map(Document::read)
        .collect()
}
