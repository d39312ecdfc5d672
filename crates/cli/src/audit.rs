//! `docrecon audit`: reconcile every request against its document.

use std::path::PathBuf;

use serde::Serialize;

use docrecon_io::{DocumentReader, SqliteStore};
use docrecon_recon::{reconcile, write_report, AmountStrategy, CommitMode, ReconOptions, ReconOutcome};

use crate::settings::Settings;
use crate::CliError;

#[derive(Serialize)]
struct AuditJson<'a> {
    report: String,
    #[serde(flatten)]
    outcome: &'a ReconOutcome,
}

pub fn cmd_audit(
    settings: &Settings,
    db: Option<PathBuf>,
    report: Option<PathBuf>,
    commit: Option<CommitMode>,
    amount_strategy: Option<AmountStrategy>,
    json: bool,
) -> Result<(), CliError> {
    let db = db.unwrap_or_else(|| settings.store_path());
    let report = report.unwrap_or_else(|| settings.report_path());
    let options = ReconOptions {
        commit: commit.unwrap_or(settings.config.audit.commit),
        amount_strategy: amount_strategy.unwrap_or(settings.config.audit.amount_strategy),
    };

    let mut store = SqliteStore::open(&db, &settings.config.store.table)?;
    let outcome = reconcile(&mut store, &DocumentReader, &options)?;

    // The store is already committed; a failed report write leaves the fixes
    // in place and says so.
    write_report(&report, &outcome.entries).map_err(|e| {
        CliError::from(e).with_hint("store changes were committed; re-run audit to regenerate the report")
    })?;

    if json {
        let body = AuditJson {
            report: report.display().to_string(),
            outcome: &outcome,
        };
        let text = serde_json::to_string_pretty(&body)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{text}");
    }

    let s = &outcome.summary;
    eprintln!(
        "audit: {} records, {} mismatched; {} summaries updated, {} amounts flagged",
        s.records_scanned,
        outcome.entries.len(),
        s.descriptions_updated,
        s.amounts_flagged,
    );
    eprintln!(
        "skipped: {} without document, {} missing file, {} unreadable",
        s.skipped_no_document, s.skipped_missing_file, s.skipped_empty_text,
    );
    eprintln!("wrote {}", report.display());

    Ok(())
}
