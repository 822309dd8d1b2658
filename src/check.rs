use crate::document::Document;
use crate::error::ParseError;
use crate::extractor::extract_with_propagation;
use crate::language::{ConfiguredLanguage, LanguageRegistry};
use crate::reporting::report_malformed_fence;
use anyhow::Result;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Maximum size of a single code block in bytes (1MB)
pub const MAX_CODE_BLOCK_SIZE: usize = 1_000_000;

/// Maximum number of code blocks per document
pub const MAX_BLOCKS_PER_DOCUMENT: usize = 1000;

/// A single code block to be checked.
///
/// Holds everything needed to run the check independently of the others.
pub struct CheckTask {
    language: ConfiguredLanguage,
    temp_path: PathBuf,
    document_path: Arc<PathBuf>,
    block_index: usize,
    line: usize,
    code: String,
}

impl CheckTask {
    /// Runs the checker and consumes the task to produce a result.
    pub async fn run(self) -> CheckResult {
        log::debug!(
            "Checking {} block #{} of {}",
            self.language,
            self.block_index,
            self.document_path.display()
        );

        let start = Instant::now();
        let outcome = self.language.check(&self.code, &self.temp_path).await;
        let duration = start.elapsed();

        CheckResult {
            language: self.language,
            duration,
            document_path: self.document_path,
            block_index: self.block_index,
            line: self.line,
            code: self.code,
            error_message: outcome.err().map(|e| format!("{:#}", e)),
        }
    }
}

/// Result of checking a single code block.
pub struct CheckResult {
    language: ConfiguredLanguage,
    duration: Duration,
    document_path: Arc<PathBuf>,
    block_index: usize,
    line: usize,
    code: String,
    error_message: Option<String>,
}

impl CheckResult {
    pub fn success(&self) -> bool {
        self.error_message.is_none()
    }

    pub fn language(&self) -> &ConfiguredLanguage {
        &self.language
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn document_path(&self) -> &Path {
        &self.document_path
    }

    pub fn block_index(&self) -> usize {
        self.block_index
    }

    /// Line of the opening fence in the document
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

/// Tasks gathered from a set of documents.
pub struct CollectedTasks {
    pub tasks: Vec<CheckTask>,
    /// Documents skipped because of an unbalanced fence
    pub malformed: Vec<ParseError>,
}

/// Collects a check task for every block with a configured checker.
///
/// Blocks get propagated code from earlier `propagate` blocks of the same
/// document; `ignore` blocks and blocks without a checker are skipped.
/// A malformed document is reported and skipped without stopping the others.
///
/// # Errors
///
/// Returns an error if a document exceeds [`MAX_BLOCKS_PER_DOCUMENT`] or a
/// block with a checker exceeds [`MAX_CODE_BLOCK_SIZE`]. All violations are
/// logged first.
pub fn collect_check_tasks(
    documents: &[Document],
    registry: &LanguageRegistry,
    temp_dir: &Path,
) -> Result<CollectedTasks> {
    let mut tasks = Vec::new();
    let mut malformed = Vec::new();
    let mut collection_errors = Vec::new();

    for document in documents {
        let path = document.path();
        let code_blocks = match extract_with_propagation(document) {
            Ok(blocks) => blocks,
            Err(error) => {
                report_malformed_fence(&error);
                malformed.push(error);
                continue;
            }
        };

        if code_blocks.len() > MAX_BLOCKS_PER_DOCUMENT {
            collection_errors.push(format!(
                "Document {} has {} code blocks, exceeding limit of {}",
                path.display(),
                code_blocks.len(),
                MAX_BLOCKS_PER_DOCUMENT
            ));
            continue;
        }

        let document_path = Arc::new(path.to_path_buf());

        for (final_code, block) in code_blocks {
            let Some(language) = registry.find_by_fence(block.language) else {
                continue;
            };

            if final_code.len() > MAX_CODE_BLOCK_SIZE {
                collection_errors.push(format!(
                    "Code block #{} in {} exceeds size limit of {} bytes ({} bytes)",
                    block.index,
                    path.display(),
                    MAX_CODE_BLOCK_SIZE,
                    final_code.len()
                ));
                continue;
            }

            let temp_path = temp_dir.join(format!(
                "{}_{}_block_{}{}",
                language.name(),
                document.stem(),
                tasks.len(),
                language.file_extension()
            ));

            tasks.push(CheckTask {
                language,
                temp_path,
                document_path: Arc::clone(&document_path),
                block_index: block.index,
                line: block.line,
                code: final_code,
            });
        }
    }

    if !collection_errors.is_empty() {
        for error in &collection_errors {
            log::error!("{}", error);
        }
        anyhow::bail!(
            "Failed to collect check tasks due to {} error(s)",
            collection_errors.len()
        );
    }

    Ok(CollectedTasks { tasks, malformed })
}

/// Runs all tasks, at most `concurrency` at a time.
///
/// Results come back in task order. Returns `(results, wall_clock_duration)`.
pub async fn run_checks(tasks: Vec<CheckTask>, concurrency: usize) -> (Vec<CheckResult>, Duration) {
    let start = Instant::now();
    let results = stream::iter(tasks)
        .map(CheckTask::run)
        .buffered(concurrency.max(1))
        .collect::<Vec<_>>()
        .await;

    (results, start.elapsed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractConfig;
    use tempfile::TempDir;

    fn registry() -> LanguageRegistry {
        LanguageRegistry::from_config(
            &ExtractConfig::from_toml_str(
                r#"
[languages.text]
checker = "true"
"#,
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_collects_only_configured_languages() {
        let dir = TempDir::new().unwrap();
        let docs = vec![Document::new(
            "padroes/command.md",
            "```text\nexecute()\n```\n```mermaid\nsequenceDiagram\n```\n```text,ignore\nnope\n```\n",
        )];

        let collected = collect_check_tasks(&docs, &registry(), dir.path()).unwrap();
        assert_eq!(collected.tasks.len(), 1);
        assert!(collected.malformed.is_empty());

        let task = &collected.tasks[0];
        assert_eq!(task.block_index, 0);
        assert_eq!(task.line, 1);
        assert_eq!(task.code, "execute()\n");
        assert_eq!(
            task.temp_path,
            dir.path().join("text_command_block_0.txt")
        );
    }

    #[test]
    fn test_malformed_document_does_not_stop_others() {
        let dir = TempDir::new().unwrap();
        let docs = vec![
            Document::new("a.md", "```text\nsem fim\n"),
            Document::new("b.md", "```text\nok\n```\n"),
        ];

        let collected = collect_check_tasks(&docs, &registry(), dir.path()).unwrap();
        assert_eq!(collected.tasks.len(), 1);
        assert_eq!(collected.malformed.len(), 1);
        assert_eq!(collected.malformed[0].path(), Path::new("a.md"));
    }

    #[test]
    fn test_oversized_block_is_rejected() {
        let dir = TempDir::new().unwrap();
        let body = format!("```text\n{}\n```\n", "x".repeat(MAX_CODE_BLOCK_SIZE + 1));
        let docs = vec![Document::new("grande.md", body)];

        let err = collect_check_tasks(&docs, &registry(), dir.path())
            .err()
            .unwrap();
        assert!(err.to_string().contains("1 error(s)"));
    }

    #[test]
    fn test_oversized_block_without_checker_is_skipped() {
        let dir = TempDir::new().unwrap();
        let body = format!(
            "```mermaid\n{}\n```\n```text\nok\n```\n",
            "x".repeat(MAX_CODE_BLOCK_SIZE + 1)
        );
        let docs = vec![Document::new("diagrama.md", body)];

        let collected = collect_check_tasks(&docs, &registry(), dir.path()).unwrap();
        assert_eq!(collected.tasks.len(), 1);
        assert_eq!(collected.tasks[0].block_index, 1);
    }

    #[test]
    fn test_propagation_stays_inside_its_document() {
        let dir = TempDir::new().unwrap();
        let docs = vec![
            Document::new(
                "a.md",
                "```text,propagate\nshared = 1\n```\n```text\nuse(shared)\n```\n",
            ),
            Document::new("b.md", "```text\nalone()\n```\n"),
        ];

        let collected = collect_check_tasks(&docs, &registry(), dir.path()).unwrap();
        assert_eq!(collected.tasks.len(), 3);

        let a_second = &collected.tasks[1];
        assert_eq!(a_second.document_path.as_path(), Path::new("a.md"));
        assert!(a_second.code.contains("shared = 1"));

        let b_only = &collected.tasks[2];
        assert_eq!(b_only.document_path.as_path(), Path::new("b.md"));
        assert_eq!(b_only.code, "alone()\n");
        assert!(!b_only.code.contains("shared"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_checks_preserves_order() {
        let dir = TempDir::new().unwrap();
        let docs = vec![Document::new("a.md", "```text\none\n```\n```txt\ntwo\n```\n")];
        let collected = collect_check_tasks(&docs, &registry(), dir.path()).unwrap();

        let (results, _) = run_checks(collected.tasks, 4).await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(CheckResult::success));
        assert_eq!(results[0].code(), "one\n");
        assert_eq!(results[1].block_index(), 1);
    }
}
