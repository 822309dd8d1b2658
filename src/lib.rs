//! doc-examples library
//!
//! Finds the fenced code examples embedded in Markdown teaching documents and
//! exposes them as discrete units that can be listed, exported to source files
//! or checked by an external command. The primary interface is the
//! `doc-examples` binary; the library is used by it and by the tests.
//!
//! ## Public API
//!
//! - [`extract`] - Lazy, in-order iterator over the [`CodeBlock`]s of a [`Document`]
//! - [`ParseError`] - The single extraction failure: an unbalanced fence
//! - [`list_examples`] / [`export_examples`] - Directory-level surfaces
//! - [`CheckRunner`] - Runs configured checkers against every example

pub mod cli;
pub mod reporting;

mod approval;
mod check;
mod config;
mod discovery;
mod document;
mod error;
mod export;
mod extractor;
mod fence;
mod language;
mod listing;
mod outline;
mod runner;

pub use approval::ApprovalStore;
pub use config::{ExtractConfig, LanguageConfig, CONFIG_FILE_NAME};
pub use discovery::discover_documents;
pub use document::Document;
pub use error::ParseError;
pub use export::{export_examples, ExportSummary};
pub use extractor::{extract, extract_all, extract_with_propagation, CodeBlock, CodeBlocks};
pub use language::{get_language_metadata, resolve_fence, LanguageMetadata};
pub use listing::{
    list_examples, DocumentBlocks, ExampleRecord, LanguageFilter, OutputFormat, ScanSummary,
};
pub use outline::{Outline, Section};
pub use runner::{load_documents, CheckRunner, CheckSummary};
