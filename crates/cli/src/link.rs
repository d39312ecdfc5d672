//! `docrecon link`: attach document files to requests by name.

use std::path::PathBuf;

use docrecon_io::{link_documents, LinkOptions, SqliteStore};

use crate::settings::Settings;
use crate::CliError;

pub fn cmd_link(
    settings: &Settings,
    db: Option<PathBuf>,
    dirs: Vec<PathBuf>,
    relink: bool,
    dry_run: bool,
    json: bool,
) -> Result<(), CliError> {
    let db = db.unwrap_or_else(|| settings.store_path());
    let dirs = if dirs.is_empty() { settings.link_directories() } else { dirs };
    if dirs.is_empty() {
        return Err(CliError::args("no document directories to scan")
            .with_hint("pass --dir or set [link] directories in the config"));
    }
    let options = LinkOptions {
        relink: relink || settings.config.link.relink,
        dry_run,
    };

    let mut store = SqliteStore::open(&db, &settings.config.store.table)?;
    let outcome = link_documents(&mut store, &dirs, &options)?;

    if json {
        let text = serde_json::to_string_pretty(&outcome)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{text}");
    }

    eprintln!(
        "link: {} files, {} requests considered, {} linked, {} unmatched, {} files unclaimed{}",
        outcome.files_scanned,
        outcome.records_considered,
        outcome.links.len(),
        outcome.unmatched_requests.len(),
        outcome.unclaimed_files.len(),
        if outcome.dry_run { " (dry run, nothing written)" } else { "" },
    );

    Ok(())
}
