//! The audit report: a markdown table, one row per audited request.
//!
//! ```text
//! # High-Precision Audit Report
//!
//! | Request ID | Company | Mismatch Type | Document Value | Portal Value | Action Taken |
//! |---|---|---|---|---|---|
//! | 42 | Acme | Description Omission | Technical Specs Found | Generic/Missing | Updated Portal Text |
//! ```
//!
//! Multi-valued cells hold `" & "`-joined segments that line up by position
//! across the last four columns.

use std::fs;
use std::path::Path;

use crate::error::ReconError;
use crate::model::{AuditEntry, MismatchKind};

pub const REPORT_TITLE: &str = "# High-Precision Audit Report";
pub const REPORT_HEADER: &str =
    "| Request ID | Company | Mismatch Type | Document Value | Portal Value | Action Taken |";
pub const REPORT_SEPARATOR: &str = "|---|---|---|---|---|---|";

const COLUMNS: usize = 6;

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

pub fn render_report(entries: &[AuditEntry]) -> String {
    let mut lines = Vec::with_capacity(entries.len() + 4);
    lines.push(REPORT_TITLE.to_string());
    lines.push(String::new());
    lines.push(REPORT_HEADER.to_string());
    lines.push(REPORT_SEPARATOR.to_string());

    for entry in entries {
        let cells = [
            entry.request_id.clone(),
            entry.company_name.clone(),
            entry.mismatch_types(),
            entry.document_values(),
            entry.portal_values(),
            entry.actions(),
        ];
        let cells: Vec<String> = cells.iter().map(|c| escape_cell(c)).collect();
        lines.push(format!("| {} |", cells.join(" | ")));
    }

    lines.join("\n")
}

/// Write the report, replacing whatever was at `path`.
pub fn write_report(path: &Path, entries: &[AuditEntry]) -> Result<(), ReconError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| ReconError::Io(format!("cannot create {}: {e}", parent.display())))?;
    }
    fs::write(path, render_report(entries))
        .map_err(|e| ReconError::Io(format!("cannot write {}: {e}", path.display())))
}

fn escape_cell(cell: &str) -> String {
    cell.replace(['\r', '\n'], " ").replace('|', "\\|")
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// One data row read back from a rendered report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    /// 1-based line number in the report.
    pub line: usize,
    pub request_id: String,
    pub company_name: String,
    pub mismatch_types: Vec<String>,
    pub document_values: Vec<String>,
    pub portal_values: Vec<String>,
    pub actions: Vec<String>,
}

impl ReportRow {
    /// Parse one `| a | b | ... |` line.
    pub fn parse(line_no: usize, line: &str) -> Result<Self, ReconError> {
        let cells = split_cells(line);
        if cells.len() < COLUMNS {
            return Err(ReconError::ReportParse {
                line: line_no,
                message: format!("expected {COLUMNS} columns, found {}", cells.len()),
            });
        }

        Ok(Self {
            line: line_no,
            request_id: cells[0].clone(),
            company_name: cells[1].clone(),
            mismatch_types: split_segments(&cells[2]),
            document_values: split_segments(&cells[3]),
            portal_values: split_segments(&cells[4]),
            actions: split_segments(&cells[5]),
        })
    }

    /// The document-side value recorded for `kind`, found by the position of
    /// its label in the mismatch-type column.
    pub fn document_value_for(&self, kind: MismatchKind) -> Option<&str> {
        let index = self
            .mismatch_types
            .iter()
            .position(|label| MismatchKind::from_label(label) == Some(kind))?;
        self.document_values.get(index).map(String::as_str)
    }
}

/// Every data row of a rendered report. Title, header, separator, blank and
/// malformed lines are skipped.
pub fn parse_report(text: &str) -> Vec<ReportRow> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| is_data_line(line))
        .filter_map(|(i, line)| ReportRow::parse(i + 1, line).ok())
        .collect()
}

pub(crate) fn is_data_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with('|') && trimmed != REPORT_HEADER && !trimmed.starts_with("|---")
}

/// Split on unescaped `|`, dropping the empty edges outside the outer pipes.
fn split_cells(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = line.trim().chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' if chars.peek() == Some(&'|') => {
                current.push('|');
                chars.next();
            }
            '|' => cells.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    cells.push(current);

    let mut cells: Vec<String> = cells.into_iter().map(|c| c.trim().to_string()).collect();
    if cells.first().is_some_and(|c| c.is_empty()) {
        cells.remove(0);
    }
    if cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }
    cells
}

fn split_segments(cell: &str) -> Vec<String> {
    cell.split('&').map(|s| s.trim().to_string()).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
