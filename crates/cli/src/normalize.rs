//! `docrecon normalize`: rewrite flagged amounts from an audit report.

use std::path::PathBuf;

use docrecon_io::SqliteStore;
use docrecon_recon::{normalize, CommitMode, NormalizeOptions};

use crate::settings::Settings;
use crate::CliError;

pub fn cmd_normalize(
    settings: &Settings,
    db: Option<PathBuf>,
    report: Option<PathBuf>,
    assume_millions: bool,
    commit: Option<CommitMode>,
    json: bool,
) -> Result<(), CliError> {
    let db = db.unwrap_or_else(|| settings.store_path());
    let report = report.unwrap_or_else(|| settings.report_path());
    let options = NormalizeOptions {
        assume_millions: assume_millions || settings.config.normalize.assume_millions,
        commit: commit.unwrap_or(settings.config.normalize.commit),
    };

    let text = std::fs::read_to_string(&report).map_err(|e| {
        CliError::io(format!("cannot read report {}: {e}", report.display()))
            .with_hint("run `docrecon audit` first")
    })?;

    let mut store = SqliteStore::open(&db, &settings.config.store.table)?;
    let outcome = normalize(&text, &mut store, &options)?;

    if json {
        let text = serde_json::to_string_pretty(&outcome)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{text}");
    }

    let scaled = outcome.updated.iter().filter(|u| u.scaled).count();
    eprintln!(
        "normalize: {} flagged rows, {} amounts updated ({} read as millions), {} unreadable, {} unknown ids",
        outcome.rows_considered,
        outcome.updated.len(),
        scaled,
        outcome.parse_failures,
        outcome.unknown_ids.len(),
    );

    Ok(())
}
