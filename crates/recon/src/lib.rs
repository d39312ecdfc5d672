//! `docrecon-recon`: reconcile funding-request documents against the store.
//!
//! Pure engine crate: records come in through [`RequestStore`], document text
//! through [`TextExtractor`]. No database or file-format dependencies.

pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod model;
pub mod normalize;
pub mod parse;
pub mod report;
pub mod store;

pub use config::{CommitMode, ReconConfig};
pub use engine::{reconcile, ReconOptions};
pub use error::ReconError;
pub use format::{format_amount, Amount};
pub use model::{AuditEntry, Finding, MismatchKind, NormalizeOutcome, ReconOutcome, RequestRecord};
pub use normalize::{normalize, NormalizeOptions};
pub use parse::{parse_amount, parse_description, AmountStrategy};
pub use report::{parse_report, render_report, write_report};
pub use store::{MemoryStore, RequestStore, TextExtractor};
