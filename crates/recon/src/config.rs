use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::parse::AmountStrategy;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Settings for one `docrecon` installation. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub normalize: NormalizeConfig,
    #[serde(default)]
    pub link: LinkConfig,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: String,
    #[serde(default = "default_table")]
    pub table: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            table: default_table(),
        }
    }
}

fn default_store_path() -> String {
    "ndaa_requests.db".into()
}

fn default_table() -> String {
    "requests".into()
}

// ---------------------------------------------------------------------------
// Commit granularity
// ---------------------------------------------------------------------------

/// When pending store writes are committed.
///
/// `EndOfRun` holds every write in one transaction until the scan finishes,
/// so an interrupted run leaves the store untouched. `PerRecord` commits after
/// each mutated record, so an interrupted run keeps what it already fixed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitMode {
    #[default]
    EndOfRun,
    PerRecord,
}

impl std::fmt::Display for CommitMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EndOfRun => write!(f, "end_of_run"),
            Self::PerRecord => write!(f, "per_record"),
        }
    }
}

// ---------------------------------------------------------------------------
// Passes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    #[serde(default = "default_report")]
    pub report: String,
    #[serde(default)]
    pub commit: CommitMode,
    #[serde(default)]
    pub amount_strategy: AmountStrategy,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            report: default_report(),
            commit: CommitMode::default(),
            amount_strategy: AmountStrategy::default(),
        }
    }
}

fn default_report() -> String {
    "audit_report.md".into()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NormalizeConfig {
    /// Read flagged figures under 1000 as millions. Off unless asked for:
    /// the rewrite cannot be undone from the store alone.
    #[serde(default)]
    pub assume_millions: bool,
    #[serde(default)]
    pub commit: CommitMode,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkConfig {
    #[serde(default)]
    pub directories: Vec<String>,
    #[serde(default)]
    pub relink: bool,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        validate_table_name(&self.store.table)?;

        if self.store.path.trim().is_empty() {
            return Err(ReconError::ConfigValidation("store.path must not be empty".into()));
        }

        if self.audit.report.trim().is_empty() {
            return Err(ReconError::ConfigValidation("audit.report must not be empty".into()));
        }

        for dir in &self.link.directories {
            if dir.trim().is_empty() {
                return Err(ReconError::ConfigValidation(
                    "link.directories must not contain empty paths".into(),
                ));
            }
        }

        Ok(())
    }
}

/// The table name is spliced into SQL, so only plain identifiers are allowed.
pub fn validate_table_name(name: &str) -> Result<(), ReconError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(ReconError::ConfigValidation(format!(
            "store.table must be a plain identifier, got '{name}'"
        )))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
