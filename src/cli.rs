use crate::config::CONFIG_FILE_NAME;
use crate::listing::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Extract, export and check the code examples embedded in Markdown documents.
#[derive(Debug, Parser)]
#[command(name = "doc-examples", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print every code example found under a path
    List {
        /// Document or directory of documents
        path: PathBuf,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Only keep examples of this language (repeatable, aliases accepted)
        #[arg(short, long = "lang")]
        languages: Vec<String>,
    },

    /// Write every code example to its own source file
    Export {
        /// Document or directory of documents
        path: PathBuf,

        /// Output directory
        #[arg(short, long)]
        out: PathBuf,

        /// Only keep examples of this language (repeatable, aliases accepted)
        #[arg(short, long = "lang")]
        languages: Vec<String>,
    },

    /// Run the configured checkers against every code example
    Check {
        /// Document or directory of documents
        path: PathBuf,

        /// Configuration file (defaults to doc-examples.toml at the root of PATH)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Approve a configuration file so `check` may run its checkers
    Allow {
        #[arg(default_value = CONFIG_FILE_NAME)]
        config: PathBuf,
    },

    /// Revoke the approval of a configuration file
    Deny {
        #[arg(default_value = CONFIG_FILE_NAME)]
        config: PathBuf,
    },

    /// List approved configuration files
    ListAllowed,
}
