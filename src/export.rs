use crate::document::Document;
use crate::language::resolve_fence;
use crate::listing::{scan_documents, LanguageFilter, ScanSummary};
use crate::outline::slugify;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Files written by an export run.
#[derive(Debug, Default)]
pub struct ExportSummary {
    pub files: Vec<PathBuf>,
    pub scan: ScanSummary,
}

/// Writes every matching block to its own file under `out_dir`.
///
/// The layout mirrors the documents tree relative to `root`: a block of
/// `padroes/command.md` lands in `out_dir/padroes/command_<index>[_<section>]<ext>`,
/// where the extension comes from the block's language. Documents of one
/// directory sharing a stem keep their own extension in the name
/// (`command_md_<index>`). Existing files are overwritten.
pub fn export_examples(
    documents: &[Document],
    root: &Path,
    out_dir: &Path,
    filter: &LanguageFilter,
) -> Result<ExportSummary> {
    let mut files = Vec::new();
    let stems = export_stems(documents);

    let scan = scan_documents(documents, filter, |document, block, outline| {
        let relative_dir = document
            .path()
            .parent()
            .and_then(|p| p.strip_prefix(root).ok())
            .unwrap_or_else(|| Path::new(""));
        let target_dir = out_dir.join(relative_dir);

        let stem = stems.get(document.path()).map_or(document.stem(), String::as_str);
        let mut file_name = format!("{}_{:02}", stem, block.index);
        if let Some(section) = outline.section_at(block.span.start) {
            let slug = slugify(section);
            if !slug.is_empty() {
                file_name.push('_');
                file_name.push_str(&slug);
            }
        }
        file_name.push_str(&resolve_fence(block.language).file_extension);

        fs::create_dir_all(&target_dir)
            .with_context(|| format!("Failed to create directory {}", target_dir.display()))?;

        let target = target_dir.join(file_name);
        fs::write(&target, block.code)
            .with_context(|| format!("Failed to write {}", target.display()))?;

        log::debug!(
            "Exported {}:{} to {}",
            document.path().display(),
            block.line,
            target.display()
        );
        files.push(target);
        Ok(())
    })?;

    Ok(ExportSummary { files, scan })
}

/// Maps each document path to the stem its exported files start with.
///
/// `command.md` exports as `command`, unless another document of the same
/// directory has that stem too; then the source extension is kept
/// (`command_md`, `command_markdown`).
fn export_stems(documents: &[Document]) -> HashMap<&Path, String> {
    let mut counts: HashMap<(Option<&Path>, &str), usize> = HashMap::new();
    for document in documents {
        *counts
            .entry((document.path().parent(), document.stem()))
            .or_insert(0) += 1;
    }

    documents
        .iter()
        .map(|document| {
            let stem = document.stem();
            let collides = counts[&(document.path().parent(), stem)] > 1;
            let name = match document.path().extension().and_then(|e| e.to_str()) {
                Some(extension) if collides => format!("{}_{}", stem, extension),
                _ => stem.to_string(),
            };
            (document.path(), name)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_export_mirrors_tree() {
        let out = TempDir::new().unwrap();
        let root = Path::new("docs");
        let docs = vec![Document::new(
            "docs/padroes/comportamentais/command.md",
            "# Command\n\n```python\nclass Command: ...\n```\n\n## Diagrama\n\n```mermaid\nclassDiagram\n```\n```\nsolto\n```\n",
        )];

        let summary =
            export_examples(&docs, root, out.path(), &LanguageFilter::default()).unwrap();

        let base = out.path().join("padroes/comportamentais");
        assert_eq!(
            summary.files,
            vec![
                base.join("command_00_command.py"),
                base.join("command_01_diagrama.mmd"),
                base.join("command_02_diagrama.txt"),
            ]
        );
        assert_eq!(
            fs::read_to_string(base.join("command_00_command.py")).unwrap(),
            "class Command: ...\n"
        );
        assert_eq!(summary.scan.blocks(), 3);
    }

    #[test]
    fn test_export_filtered_and_malformed() {
        let out = TempDir::new().unwrap();
        let docs = vec![
            Document::new("a.md", "```python\nx = 1\n```\n```mermaid\ngraph\n```\n"),
            Document::new("b.md", "```python\nsem fim\n"),
        ];

        let summary = export_examples(
            &docs,
            Path::new(""),
            out.path(),
            &LanguageFilter::new(&["py"]),
        )
        .unwrap();

        assert_eq!(summary.files, vec![out.path().join("a_00.py")]);
        assert_eq!(summary.scan.malformed.len(), 1);
    }

    #[test]
    fn test_export_same_stem_documents_do_not_overwrite() {
        let out = TempDir::new().unwrap();
        let docs = vec![
            Document::new("poo/a.md", "```python
x = 1
```
"),
            Document::new("poo/a.markdown", "```python
x = 2
```
"),
            Document::new("padroes/a.md", "```python
x = 3
```
"),
        ];

        let summary =
            export_examples(&docs, Path::new(""), out.path(), &LanguageFilter::default())
                .unwrap();

        assert_eq!(
            summary.files,
            vec![
                out.path().join("poo/a_md_00.py"),
                out.path().join("poo/a_markdown_00.py"),
                out.path().join("padroes/a_00.py"),
            ]
        );
        assert_eq!(
            fs::read_to_string(out.path().join("poo/a_markdown_00.py")).unwrap(),
            "x = 2
"
        );
    }
}
