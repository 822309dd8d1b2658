use anyhow::Result;
use clap::Parser;
use doc_examples::cli::{Cli, Command};
use doc_examples::{
    export_examples, list_examples, load_documents, reporting, ApprovalStore, CheckRunner,
    ExtractConfig, LanguageFilter, ScanSummary,
};
use std::io;
use std::path::Path;
use std::process::exit;

pub fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match run(cli.command) {
        Ok(true) => {}
        Ok(false) => exit(1),
        Err(e) => {
            log::error!("{:#}", e);
            exit(1);
        }
    }
}

/// Runs one command; `Ok(false)` means it completed but found malformed
/// documents.
fn run(command: Command) -> Result<bool> {
    match command {
        Command::List {
            path,
            format,
            languages,
        } => {
            let documents = read_documents(&path)?;
            let filter = LanguageFilter::new(&languages);
            let mut stdout = io::stdout().lock();
            let summary = list_examples(&documents, &filter, format, &mut stdout)?;
            reporting::print_scan_summary("Listed", summary.documents, &summary.languages);
            Ok(finish(&summary))
        }

        Command::Export {
            path,
            out,
            languages,
        } => {
            let documents = read_documents(&path)?;
            let filter = LanguageFilter::new(&languages);
            let root = if path.is_file() {
                path.parent().unwrap_or_else(|| Path::new(""))
            } else {
                path.as_path()
            };
            let summary = export_examples(&documents, root, &out, &filter)?;
            reporting::print_scan_summary(
                "Exported",
                summary.scan.documents,
                &summary.scan.languages,
            );
            Ok(finish(&summary.scan))
        }

        Command::Check { path, config } => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let summary = runtime.block_on(CheckRunner::new().run_async(&path, config.as_deref()))?;
            reporting::report_malformed_summary(&summary.malformed);
            Ok(summary.malformed.is_empty())
        }

        Command::Allow { config } => {
            ApprovalStore::open_default()?.approve(&config)?;
            println!("Approved {}", config.display());
            Ok(true)
        }

        Command::Deny { config } => {
            ApprovalStore::open_default()?.deny(&config)?;
            println!("Revoked approval of {}", config.display());
            Ok(true)
        }

        Command::ListAllowed => {
            for path in ApprovalStore::open_default()?.list_approved()? {
                println!("{}", path);
            }
            Ok(true)
        }
    }
}

fn read_documents(path: &Path) -> Result<Vec<doc_examples::Document>> {
    let (_, config) = ExtractConfig::discover(path, None)?;
    load_documents(path, &config)
}

fn finish(summary: &ScanSummary) -> bool {
    reporting::report_malformed_summary(&summary.malformed);
    summary.is_clean()
}
