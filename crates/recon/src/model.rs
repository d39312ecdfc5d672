use serde::Serialize;

use crate::config::CommitMode;
use crate::format::Amount;

// ---------------------------------------------------------------------------
// Store rows
// ---------------------------------------------------------------------------

/// A single funding request as held by the store.
///
/// Integer ids are carried as their decimal text so the engine never cares
/// how the store declared the column.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestRecord {
    pub id: String,
    pub company_name: String,
    pub request_amount: f64,
    pub formatted_amount: String,
    pub brief_summary: String,
    pub document_url: Option<String>,
}

impl RequestRecord {
    /// The document reference, if it is present and non-blank.
    pub fn document_path(&self) -> Option<&str> {
        self.document_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Findings
// ---------------------------------------------------------------------------

pub const DESCRIPTION_DOCUMENT_VALUE: &str = "Technical Specs Found";
pub const DESCRIPTION_PORTAL_VALUE: &str = "Generic/Missing";
pub const DESCRIPTION_ACTION: &str = "Updated Portal Text";
pub const AMOUNT_ACTION: &str = "FLAGGED ERROR";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    DescriptionOmission,
    AmountCentMismatch,
}

impl MismatchKind {
    /// The label written to (and matched in) the audit report.
    pub fn label(&self) -> &'static str {
        match self {
            Self::DescriptionOmission => "Description Omission",
            Self::AmountCentMismatch => "Amount Cent Mismatch",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Description Omission" => Some(Self::DescriptionOmission),
            "Amount Cent Mismatch" => Some(Self::AmountCentMismatch),
            _ => None,
        }
    }
}

impl std::fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One disagreement between a document and the store for one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub kind: MismatchKind,
    pub document_value: String,
    pub portal_value: String,
    pub action: String,
}

impl Finding {
    pub fn description_omission() -> Self {
        Self {
            kind: MismatchKind::DescriptionOmission,
            document_value: DESCRIPTION_DOCUMENT_VALUE.into(),
            portal_value: DESCRIPTION_PORTAL_VALUE.into(),
            action: DESCRIPTION_ACTION.into(),
        }
    }

    /// `raw_amount` is the token as matched in the document, without `$`.
    pub fn amount_cent_mismatch(raw_amount: &str, portal_formatted: &str) -> Self {
        Self {
            kind: MismatchKind::AmountCentMismatch,
            document_value: format!("${raw_amount}"),
            portal_value: portal_formatted.to_string(),
            action: AMOUNT_ACTION.into(),
        }
    }
}

/// All findings for one record in one run. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry {
    pub request_id: String,
    pub company_name: String,
    pub findings: Vec<Finding>,
}

impl AuditEntry {
    pub fn has(&self, kind: MismatchKind) -> bool {
        self.findings.iter().any(|f| f.kind == kind)
    }

    pub fn mismatch_types(&self) -> String {
        self.join(|f| f.kind.label())
    }

    pub fn document_values(&self) -> String {
        self.join(|f| f.document_value.as_str())
    }

    pub fn portal_values(&self) -> String {
        self.join(|f| f.portal_value.as_str())
    }

    pub fn actions(&self) -> String {
        self.join(|f| f.action.as_str())
    }

    fn join<'a>(&'a self, field: impl Fn(&'a Finding) -> &'a str) -> String {
        self.findings
            .iter()
            .map(field)
            .collect::<Vec<_>>()
            .join(" & ")
    }
}

// ---------------------------------------------------------------------------
// Run outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconSummary {
    pub records_scanned: usize,
    pub skipped_no_document: usize,
    pub skipped_missing_file: usize,
    pub skipped_empty_text: usize,
    pub descriptions_updated: usize,
    pub amounts_flagged: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub engine_version: String,
    pub run_at: String,
    pub commit_mode: CommitMode,
}

impl RunMeta {
    pub fn now(commit_mode: CommitMode) -> Self {
        Self {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            commit_mode,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconOutcome {
    pub meta: RunMeta,
    pub summary: ReconSummary,
    pub entries: Vec<AuditEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmountUpdate {
    pub request_id: String,
    pub amount: Amount,
    pub formatted: String,
    pub scaled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct NormalizeOutcome {
    pub meta: RunMeta,
    pub rows_considered: usize,
    pub updated: Vec<AmountUpdate>,
    pub parse_failures: usize,
    pub unknown_ids: Vec<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
