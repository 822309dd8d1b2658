use crate::document::Document;
use crate::error::ParseError;
use crate::extractor::{extract, CodeBlock};
use crate::language::resolve_fence;
use crate::outline::Outline;
use crate::reporting::report_malformed_fence;
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// How extracted examples are written to the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// A `path:line: language` header followed by the fenced block
    #[default]
    Text,
    /// One JSON object per line
    Jsonl,
    /// A single JSON array
    Json,
}

/// One extracted example, as serialized by the JSON formats.
#[derive(Debug, Serialize)]
pub struct ExampleRecord<'a> {
    pub path: &'a Path,
    pub index: usize,
    pub language: &'a str,
    pub flags: &'a [&'a str],
    pub line: usize,
    pub end_line: usize,
    pub section: Option<&'a str>,
    pub code: &'a str,
}

impl<'a> ExampleRecord<'a> {
    pub fn new(document: &'a Document, block: &'a CodeBlock<'a>, outline: &'a Outline) -> Self {
        Self {
            path: document.path(),
            index: block.index,
            language: block.language,
            flags: &block.flags,
            line: block.line,
            end_line: block.end_line,
            section: outline.section_at(block.span.start),
            code: block.code,
        }
    }
}

/// Keeps blocks whose language is one of the requested ones.
///
/// Aliases are resolved on both sides, so `py` selects blocks tagged `python`.
/// An empty filter keeps everything.
#[derive(Debug, Clone, Default)]
pub struct LanguageFilter {
    languages: Vec<String>,
}

impl LanguageFilter {
    pub fn new<S: AsRef<str>>(languages: &[S]) -> Self {
        Self {
            languages: languages
                .iter()
                .map(|l| resolve_fence(l.as_ref()).name.into_owned())
                .collect(),
        }
    }

    pub fn matches(&self, block: &CodeBlock<'_>) -> bool {
        self.languages.is_empty()
            || self
                .languages
                .iter()
                .any(|l| *l == resolve_fence(block.language).name)
    }
}

/// Blocks emitted for one document, by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentBlocks {
    pub path: PathBuf,
    pub blocks: Vec<usize>,
}

/// Outcome of a scan over several documents.
#[derive(Debug, Default)]
pub struct ScanSummary {
    pub documents: usize,
    /// Canonical language of every block emitted, in order
    pub languages: Vec<String>,
    /// One entry per scanned document, malformed ones included
    pub per_document: Vec<DocumentBlocks>,
    pub malformed: Vec<ParseError>,
}

impl ScanSummary {
    pub fn blocks(&self) -> usize {
        self.languages.len()
    }

    pub fn is_clean(&self) -> bool {
        self.malformed.is_empty()
    }
}

/// Runs `visit` on every block of every document that passes `filter`.
///
/// Documents are independent: a malformed fence is reported right away and
/// the scan moves on to the next document. Blocks found before the malformed
/// fence are still visited.
pub fn scan_documents<F>(
    documents: &[Document],
    filter: &LanguageFilter,
    mut visit: F,
) -> Result<ScanSummary>
where
    F: FnMut(&Document, &CodeBlock<'_>, &Outline) -> Result<()>,
{
    let mut summary = ScanSummary {
        documents: documents.len(),
        ..Default::default()
    };

    for document in documents {
        log::debug!("Scanning {}", document.path().display());
        let outline = Outline::parse(document.body());
        let mut emitted = Vec::new();

        for block in extract(document) {
            match block {
                Ok(block) => {
                    if !filter.matches(&block) {
                        continue;
                    }
                    visit(document, &block, &outline)?;
                    summary
                        .languages
                        .push(resolve_fence(block.language).name.into_owned());
                    emitted.push(block.index);
                }
                Err(error) => {
                    report_malformed_fence(&error);
                    summary.malformed.push(error);
                }
            }
        }

        summary.per_document.push(DocumentBlocks {
            path: document.path().to_path_buf(),
            blocks: emitted,
        });
    }

    Ok(summary)
}

/// Writes every matching example to `out` in the requested format.
pub fn list_examples<W: Write>(
    documents: &[Document],
    filter: &LanguageFilter,
    format: OutputFormat,
    out: &mut W,
) -> Result<ScanSummary> {
    let mut json_items = Vec::new();

    let summary = scan_documents(documents, filter, |document, block, outline| {
        let record = ExampleRecord::new(document, block, outline);
        match format {
            OutputFormat::Text => {
                write_text(&mut *out, &record, block)?;
            }
            OutputFormat::Jsonl => {
                serde_json::to_writer(&mut *out, &record)?;
                writeln!(out)?;
            }
            OutputFormat::Json => {
                json_items.push(serde_json::to_value(&record)?);
            }
        }
        Ok(())
    })?;

    if format == OutputFormat::Json {
        serde_json::to_writer_pretty(&mut *out, &json_items)?;
        writeln!(out)?;
    }
    out.flush().context("Failed to flush output")?;

    Ok(summary)
}

fn write_text<W: Write>(out: &mut W, record: &ExampleRecord<'_>, block: &CodeBlock<'_>) -> Result<()> {
    let language = if record.language.is_empty() {
        "-"
    } else {
        record.language
    };
    write!(out, "{}:{}: {}", record.path.display(), record.line, language)?;
    if let Some(section) = record.section {
        write!(out, " ({})", section)?;
    }
    writeln!(out)?;

    let fenced = block.to_fenced();
    out.write_all(fenced.as_bytes())?;
    if !fenced.ends_with('\n') {
        writeln!(out)?;
    }
    writeln!(out)?;
    Ok(())
}
