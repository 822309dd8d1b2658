use crate::check::CheckResult;
use crate::error::ParseError;
use anyhow::Result;
use chrono::Local;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::Duration;

const TARGET: &str = "doc_examples";

/// Formats a message with a timestamp, level and target prefix.
fn format_line(level: &str, message: &str) -> String {
    format!(
        "{} [{}] ({}): {}",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        level,
        TARGET,
        message
    )
}

fn error_line(message: &str) {
    eprintln!("{}", format_line("ERROR", message));
}

fn info_line(message: &str) {
    eprintln!("{}", format_line("INFO", message));
}

/// Reports an unbalanced fence as soon as it is found.
pub fn report_malformed_fence(error: &ParseError) {
    error_line(&error.to_string());
}

/// Final note after a scan that hit malformed documents.
pub fn report_malformed_summary(errors: &[ParseError]) {
    if errors.is_empty() {
        return;
    }
    error_line(&format!(
        "{} document(s) have unbalanced code fences:",
        errors.len()
    ));
    for error in errors {
        error_line(&format!("  {}:{}", error.path().display(), error.line()));
    }
}

/// Tells the user a configuration must be approved before checkers run.
pub fn report_approval_error(config_path: &Path) {
    error_line(&format!(
        "{} not approved for running checkers",
        config_path.display()
    ));
    error_line("");
    error_line("For security, doc-examples requires explicit approval before");
    error_line("running the checker commands a configuration file names.");
    error_line("");
    error_line("To approve this configuration after reviewing it:");
    error_line(&format!("  doc-examples allow {}", config_path.display()));
}

/// Reports failed checks with the offending code.
///
/// # Errors
///
/// Always returns an error after printing all failures.
pub fn report_check_failures(failed_results: &[&CheckResult]) -> Result<()> {
    for result in failed_results {
        error_line("Check failed");
        error_line(&format!(
            "File: {}:{}",
            result.document_path().display(),
            result.line()
        ));
        error_line(&format!(
            "Block: #{} ({})",
            result.block_index(),
            result.language().name()
        ));
        error_line("");

        if let Some(error_msg) = result.error_message() {
            for line in error_msg.lines() {
                error_line(line);
            }
        }

        error_line("");
        error_line("Code block:");
        error_line(&format!("```{}", result.language().name()));
        for line in result.code().lines() {
            error_line(line);
        }
        error_line("```");
        error_line("");
    }

    let failed_files: BTreeSet<_> = failed_results.iter().map(|r| r.document_path()).collect();
    error_line("Examples failed their checks in the following files:");
    for file in failed_files {
        error_line(&format!("  {}", file.display()));
    }

    anyhow::bail!("{} example(s) failed their checks", failed_results.len());
}

/// Per-language counts, formatted as `python: 3, text: 1`.
pub fn language_counts<'a>(languages: impl IntoIterator<Item = &'a str>) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for lang in languages {
        *counts.entry(lang).or_insert(0) += 1;
    }
    counts
        .iter()
        .map(|(lang, count)| format!("{}: {}", lang, count))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Prints check statistics to stderr.
///
/// Detailed per-language and per-block timings are logged at debug level.
pub fn print_check_statistics(results: &[CheckResult], total_duration: Duration) {
    if results.is_empty() {
        info_line("No code blocks found to check");
        return;
    }

    let successful: Vec<_> = results.iter().filter(|r| r.success()).collect();
    let stats_str = language_counts(successful.iter().map(|r| r.language().name()));

    let sum: Duration = results.iter().map(|r| r.duration()).sum();
    let avg_ms = sum.as_millis() / results.len() as u128;

    info_line(&format!(
        "Successfully checked {} code block(s) ({})",
        successful.len(),
        stats_str
    ));
    info_line(&format!(
        "Checks finished in {}ms (avg {}ms per block)",
        total_duration.as_millis(),
        avg_ms
    ));

    log::debug!("Individual check timings:");
    for result in results {
        log::debug!(
            "[{}] {} block #{}: {}ms",
            result.language().name(),
            result.document_path().display(),
            result.block_index(),
            result.duration().as_millis()
        );
    }
}

/// Prints a one-line summary of a listing or export run.
pub fn print_scan_summary(verb: &str, documents: usize, languages: &[String]) {
    if languages.is_empty() {
        info_line(&format!(
            "No code blocks found in {} document(s)",
            documents
        ));
        return;
    }
    info_line(&format!(
        "{} {} code block(s) from {} document(s) ({})",
        verb,
        languages.len(),
        documents,
        language_counts(languages.iter().map(String::as_str))
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_line_shape() {
        let line = format_line("ERROR", "boom");
        assert!(line.ends_with("[ERROR] (doc_examples): boom"));
        // "YYYY-MM-DD HH:MM:SS " prefix
        assert_eq!(line.find('[').unwrap(), 20);
    }

    #[test]
    fn test_language_counts_sorted() {
        assert_eq!(
            language_counts(["python", "mermaid", "python"]),
            "mermaid: 1, python: 2"
        );
        assert_eq!(language_counts(Vec::<&str>::new()), "");
    }
}
