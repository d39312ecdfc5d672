use std::path::Path;

use log::{debug, info, warn};

use crate::config::CommitMode;
use crate::error::ReconError;
use crate::model::{
    AuditEntry, Finding, MismatchKind, ReconOutcome, ReconSummary, RequestRecord, RunMeta,
};
use crate::parse::{amount_value, char_prefix, parse_amount_with, parse_description, AmountStrategy};
use crate::store::{RequestStore, TextExtractor};

/// Descriptions of this many characters or fewer are never compared.
pub const DESCRIPTION_PREFIX_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, Default)]
pub struct ReconOptions {
    pub commit: CommitMode,
    pub amount_strategy: AmountStrategy,
}

/// What reconciling one record produced.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordCheck {
    NoDocument,
    MissingFile,
    EmptyText,
    Checked {
        /// Replacement for `briefSummary`, when the document disagrees.
        new_summary: Option<String>,
        findings: Vec<Finding>,
    },
}

/// Run the reconciliation pass over every store record.
///
/// Summary overwrites are applied as they are found; flagged amounts are only
/// reported. With [`CommitMode::EndOfRun`] nothing is durable until the whole
/// scan succeeds. The report is the caller's to write, after this returns.
pub fn reconcile<S, X>(
    store: &mut S,
    extractor: &X,
    options: &ReconOptions,
) -> Result<ReconOutcome, ReconError>
where
    S: RequestStore + ?Sized,
    X: TextExtractor + ?Sized,
{
    let records = store.load_requests()?;
    let mut summary = ReconSummary {
        records_scanned: records.len(),
        ..ReconSummary::default()
    };
    let mut entries = Vec::new();

    for record in &records {
        let (new_summary, findings) = match check_record(record, extractor, options.amount_strategy) {
            RecordCheck::NoDocument => {
                summary.skipped_no_document += 1;
                continue;
            }
            RecordCheck::MissingFile => {
                warn!(
                    "request {}: document not found: {}",
                    record.id,
                    record.document_path().unwrap_or_default()
                );
                summary.skipped_missing_file += 1;
                continue;
            }
            RecordCheck::EmptyText => {
                warn!("request {}: no text extracted, skipping", record.id);
                summary.skipped_empty_text += 1;
                continue;
            }
            RecordCheck::Checked { new_summary, findings } => (new_summary, findings),
        };

        if let Some(ref text) = new_summary {
            if store.update_summary(&record.id, text)? {
                info!("request {}: brief summary replaced from document", record.id);
                summary.descriptions_updated += 1;
            } else {
                warn!("request {}: row vanished before summary update", record.id);
            }
            if options.commit == CommitMode::PerRecord {
                store.commit()?;
            }
        }

        if findings.is_empty() {
            continue;
        }
        summary.amounts_flagged += findings
            .iter()
            .filter(|f| f.kind == MismatchKind::AmountCentMismatch)
            .count();

        entries.push(AuditEntry {
            request_id: record.id.clone(),
            company_name: record.company_name.clone(),
            findings,
        });
    }

    if options.commit == CommitMode::EndOfRun {
        store.commit()?;
    }

    Ok(ReconOutcome {
        meta: RunMeta::now(options.commit),
        summary,
        entries,
    })
}

/// Compare one record against its document without touching the store.
pub fn check_record<X>(record: &RequestRecord, extractor: &X, strategy: AmountStrategy) -> RecordCheck
where
    X: TextExtractor + ?Sized,
{
    let Some(url) = record.document_path() else {
        return RecordCheck::NoDocument;
    };
    let path = Path::new(url);
    if !extractor.exists(path) {
        return RecordCheck::MissingFile;
    }

    let text = extractor.extract(path);
    if text.trim().is_empty() {
        return RecordCheck::EmptyText;
    }
    debug!("request {}: extracted {} bytes from {}", record.id, text.len(), url);

    let mut findings = Vec::new();

    let description = parse_description(&text);
    let new_summary = if description_omitted(&record.brief_summary, &description) {
        findings.push(Finding::description_omission());
        Some(description)
    } else {
        None
    };

    if let Some(raw) = parse_amount_with(&text, strategy) {
        match amount_value(&raw) {
            Some(value) if value > 0.0 && value != record.request_amount => {
                warn!(
                    "request {}: document states ${raw}, store has {}",
                    record.id, record.formatted_amount
                );
                findings.push(Finding::amount_cent_mismatch(&raw, &record.formatted_amount));
            }
            Some(_) => {}
            None => warn!("request {}: unparseable amount token '${raw}'", record.id),
        }
    }

    RecordCheck::Checked { new_summary, findings }
}

/// True when the document's narrative is long enough to compare and its
/// opening does not appear anywhere in the stored summary.
pub fn description_omitted(stored_summary: &str, description: &str) -> bool {
    description.chars().count() > DESCRIPTION_PREFIX_CHARS
        && !stored_summary.contains(char_prefix(description, DESCRIPTION_PREFIX_CHARS))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
