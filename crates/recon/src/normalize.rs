//! Second pass: rewrite flagged request amounts from the audit report.

use log::{info, warn};

use crate::config::CommitMode;
use crate::error::ReconError;
use crate::format::Amount;
use crate::model::{AmountUpdate, MismatchKind, NormalizeOutcome, RunMeta};
use crate::parse::amount_value;
use crate::report::ReportRow;
use crate::store::RequestStore;

/// Flagged figures below this are candidates for the millions reading.
pub const MILLIONS_THRESHOLD: f64 = 1_000.0;
const MILLION: f64 = 1_000_000.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeOptions {
    /// Read figures under [`MILLIONS_THRESHOLD`] as millions of dollars
    /// (`$10.0` becomes 10,000,000). Lossy: the original figure is not kept.
    pub assume_millions: bool,
    pub commit: CommitMode,
}

/// Corrected amount for a flagged document value such as `"$3,979"`.
///
/// Returns the amount and whether the millions reading was applied, or
/// `None` when the value is not a number.
pub fn corrected_amount(document_value: &str, assume_millions: bool) -> Option<(Amount, bool)> {
    let mut value = amount_value(document_value)?;
    let scaled = assume_millions && value < MILLIONS_THRESHOLD;
    if scaled {
        value *= MILLION;
    }
    Some((Amount::from_f64(value), scaled))
}

/// Apply every `Amount Cent Mismatch` row of `report` to the store.
///
/// Rows that cannot be read are logged and skipped. Store failures abort.
pub fn normalize<S>(
    report: &str,
    store: &mut S,
    options: &NormalizeOptions,
) -> Result<NormalizeOutcome, ReconError>
where
    S: RequestStore + ?Sized,
{
    let marker = MismatchKind::AmountCentMismatch.label();
    let mut outcome = NormalizeOutcome {
        meta: RunMeta::now(options.commit),
        rows_considered: 0,
        updated: Vec::new(),
        parse_failures: 0,
        unknown_ids: Vec::new(),
    };

    for (i, line) in report.lines().enumerate() {
        if !line.contains(marker) || !crate::report::is_data_line(line) {
            continue;
        }
        outcome.rows_considered += 1;

        let row = match ReportRow::parse(i + 1, line) {
            Ok(row) => row,
            Err(e) => {
                warn!("{e}; skipping");
                outcome.parse_failures += 1;
                continue;
            }
        };

        let Some(document_value) = row.document_value_for(MismatchKind::AmountCentMismatch) else {
            warn!("report line {}: no document value for '{marker}'; skipping", row.line);
            outcome.parse_failures += 1;
            continue;
        };

        let Some((amount, scaled)) = corrected_amount(document_value, options.assume_millions) else {
            warn!("report line {}: cannot parse amount '{document_value}'; skipping", row.line);
            outcome.parse_failures += 1;
            continue;
        };

        if scaled {
            warn!(
                "request {}: reading {document_value} as millions ({amount}); original figure is not kept",
                row.request_id
            );
        }

        if !store.update_amount(&row.request_id, &amount)? {
            warn!("request {}: not found in store; skipping", row.request_id);
            outcome.unknown_ids.push(row.request_id);
            continue;
        }

        let formatted = amount.formatted();
        info!("request {}: amount set to {amount} ({formatted})", row.request_id);
        outcome.updated.push(AmountUpdate {
            request_id: row.request_id,
            amount,
            formatted,
            scaled,
        });

        if options.commit == CommitMode::PerRecord {
            store.commit()?;
        }
    }

    if options.commit == CommitMode::EndOfRun {
        store.commit()?;
    }

    Ok(outcome)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
