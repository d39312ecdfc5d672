// Document and database I/O for the reconciliation engine

pub mod extract;
pub mod link;
pub mod sqlite;

pub use extract::{extract_text, DocumentKind, DocumentReader};
pub use link::{link_documents, LinkOptions, LinkOutcome};
pub use sqlite::SqliteStore;
