//! Attach request documents found on disk to store rows by file name.
//!
//! Matching is a plain name score: the squashed company name appearing in
//! the file name is worth 10, each significant company word 1. A file is
//! given to at most one request.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Serialize;

use docrecon_recon::{ReconError, RequestStore};

use crate::extract::DocumentKind;

const FULL_NAME_SCORE: u32 = 10;
const WORD_SCORE: u32 = 1;
/// Company words of this length or shorter do not count.
const MIN_WORD_LEN: usize = 2;

#[derive(Debug, Clone, Copy, Default)]
pub struct LinkOptions {
    /// Re-score records that already point at an existing document.
    pub relink: bool,
    /// Compute links without writing them.
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentLink {
    pub request_id: String,
    pub company_name: String,
    pub path: String,
    pub score: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LinkOutcome {
    pub files_scanned: usize,
    pub records_considered: usize,
    pub links: Vec<DocumentLink>,
    /// Records considered that no file scored for.
    pub unmatched_requests: Vec<String>,
    /// Scanned files nobody claimed.
    pub unclaimed_files: Vec<String>,
    pub dry_run: bool,
}

/// Document files directly inside each directory, sorted by path.
///
/// Directories that do not exist are skipped with a warning.
pub fn scan_documents(directories: &[PathBuf]) -> Result<Vec<PathBuf>, ReconError> {
    let mut files = Vec::new();
    for dir in directories {
        if !dir.is_dir() {
            warn!("{}: not a directory; skipping", dir.display());
            continue;
        }
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && DocumentKind::from_path(&path).is_some() {
                files.push(path);
            }
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Lowercase with everything but `[a-z0-9]` removed.
fn squash(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Name score of `file_name` for `company_name`; zero means no match.
pub fn match_score(company_name: &str, file_name: &str) -> u32 {
    let file_name = file_name.to_lowercase();
    let mut score = 0;

    let squashed = squash(company_name);
    if !squashed.is_empty() && file_name.contains(&squashed) {
        score += FULL_NAME_SCORE;
    }

    for word in company_name.split_whitespace().map(squash) {
        if word.len() > MIN_WORD_LEN && file_name.contains(&word) {
            score += WORD_SCORE;
        }
    }
    score
}

/// Resolved form of `path` for claim bookkeeping; unresolvable paths are
/// kept as given.
fn claim_key(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Link records without a usable document to the best-scoring file under
/// `directories`, then commit once.
pub fn link_documents<S>(
    store: &mut S,
    directories: &[PathBuf],
    options: &LinkOptions,
) -> Result<LinkOutcome, ReconError>
where
    S: RequestStore + ?Sized,
{
    let files = scan_documents(directories)?;
    let records = store.load_requests()?;
    let mut outcome = LinkOutcome {
        files_scanned: files.len(),
        dry_run: options.dry_run,
        ..LinkOutcome::default()
    };

    // Files already referenced by records we leave alone are taken.
    let mut claimed: HashSet<PathBuf> = HashSet::new();
    let mut pending = Vec::new();
    for record in &records {
        match record.document_path().map(Path::new) {
            Some(path) if path.exists() && !options.relink => {
                claimed.insert(claim_key(path));
            }
            _ => pending.push(record),
        }
    }
    outcome.records_considered = pending.len();

    for record in pending {
        let best = files
            .iter()
            .filter(|f| !claimed.contains(&claim_key(f)))
            .map(|f| (f, match_score(&record.company_name, &file_name(f))))
            .fold(None::<(&PathBuf, u32)>, |best, (f, score)| match best {
                Some((_, top)) if top >= score => best,
                _ if score > 0 => Some((f, score)),
                _ => best,
            });

        let Some((path, score)) = best else {
            debug!("request {} ({}): no matching document", record.id, record.company_name);
            outcome.unmatched_requests.push(record.id.clone());
            continue;
        };

        claimed.insert(claim_key(path));
        let url = path.to_string_lossy().into_owned();

        if !options.dry_run {
            store.update_document_url(&record.id, &url)?;
        }
        info!("request {} ({}): linked {url} (score {score})", record.id, record.company_name);
        outcome.links.push(DocumentLink {
            request_id: record.id.clone(),
            company_name: record.company_name.clone(),
            path: url,
            score,
        });
    }

    if !options.dry_run {
        store.commit()?;
    }

    outcome.unclaimed_files = files
        .iter()
        .filter(|f| !claimed.contains(&claim_key(f)))
        .map(|f| f.to_string_lossy().into_owned())
        .collect();

    Ok(outcome)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
