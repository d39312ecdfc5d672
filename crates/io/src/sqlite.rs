//! SQLite-backed [`RequestStore`].
//!
//! The first write opens a transaction and [`commit`](RequestStore::commit)
//! closes it, so a run that dies before committing leaves the database as it
//! was. Dropping the store with a transaction open rolls it back.

use std::path::Path;

use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, Connection, OpenFlags};

use docrecon_recon::config::validate_table_name;
use docrecon_recon::{Amount, ReconError, RequestRecord, RequestStore};

/// Columns the engine reads and writes.
pub const COLUMNS: [&str; 6] = [
    "id",
    "companyName",
    "requestAmount",
    "formattedAmount",
    "briefSummary",
    "documentUrl",
];

pub struct SqliteStore {
    conn: Connection,
    table: String,
    in_transaction: bool,
}

fn store_err(e: rusqlite::Error) -> ReconError {
    ReconError::Store(e.to_string())
}

impl SqliteStore {
    /// Open an existing database. The file is never created here.
    pub fn open(path: &Path, table: &str) -> Result<Self, ReconError> {
        if !path.is_file() {
            return Err(ReconError::Store(format!(
                "database not found: {}",
                path.display()
            )));
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(store_err)?;
        Self::from_connection(conn, table)
    }

    /// Wrap an already-open connection, checking that `table` has the
    /// expected columns.
    pub fn from_connection(conn: Connection, table: &str) -> Result<Self, ReconError> {
        validate_table_name(table)?;

        let mut present = Vec::new();
        {
            let mut stmt = conn
                .prepare(&format!("PRAGMA table_info({table})"))
                .map_err(store_err)?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(1))
                .map_err(store_err)?;
            for name in names {
                present.push(name.map_err(store_err)?);
            }
        }
        if present.is_empty() {
            return Err(ReconError::Store(format!("table '{table}' does not exist")));
        }
        let missing: Vec<&str> = COLUMNS
            .iter()
            .copied()
            .filter(|col| !present.iter().any(|p| p == col))
            .collect();
        if !missing.is_empty() {
            return Err(ReconError::Store(format!(
                "table '{table}' is missing column(s): {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            conn,
            table: table.to_string(),
            in_transaction: false,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Whether writes are waiting on a commit.
    pub fn has_pending(&self) -> bool {
        self.in_transaction
    }

    fn begin(&mut self) -> Result<(), ReconError> {
        if !self.in_transaction {
            self.conn.execute("BEGIN TRANSACTION", []).map_err(store_err)?;
            self.in_transaction = true;
        }
        Ok(())
    }

    fn update_column(&mut self, column: &str, id: &str, value: Value) -> Result<bool, ReconError> {
        self.begin()?;
        let sql = format!(
            "UPDATE {} SET {column} = ?1 WHERE CAST(id AS TEXT) = ?2",
            self.table
        );
        let changed = self.conn.execute(&sql, params![value, id]).map_err(store_err)?;
        Ok(changed > 0)
    }
}

/// Text rendering of a loosely typed column; NULL reads as empty.
fn text_value(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s,
        Value::Blob(b) => String::from_utf8_lossy(&b).into_owned(),
    }
}

/// Numeric reading of `requestAmount`; NULL and non-numbers read as zero.
fn amount_value(value: Value) -> f64 {
    match value {
        Value::Integer(i) => i as f64,
        Value::Real(f) => f,
        Value::Text(s) => s.trim().parse().unwrap_or(0.0),
        Value::Null | Value::Blob(_) => 0.0,
    }
}

impl RequestStore for SqliteStore {
    fn load_requests(&mut self) -> Result<Vec<RequestRecord>, ReconError> {
        let sql = format!(
            "SELECT CAST(id AS TEXT), companyName, requestAmount, formattedAmount, briefSummary, documentUrl FROM {}",
            self.table
        );
        let mut stmt = self.conn.prepare(&sql).map_err(store_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(RequestRecord {
                    id: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                    company_name: text_value(row.get(1)?),
                    request_amount: amount_value(row.get(2)?),
                    formatted_amount: text_value(row.get(3)?),
                    brief_summary: text_value(row.get(4)?),
                    document_url: match row.get::<_, Value>(5)? {
                        Value::Null => None,
                        other => Some(text_value(other)),
                    },
                })
            })
            .map_err(store_err)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(store_err)?);
        }
        debug!("loaded {} request(s) from '{}'", records.len(), self.table);
        Ok(records)
    }

    fn update_summary(&mut self, id: &str, summary: &str) -> Result<bool, ReconError> {
        self.update_column("briefSummary", id, Value::Text(summary.to_string()))
    }

    fn update_amount(&mut self, id: &str, amount: &Amount) -> Result<bool, ReconError> {
        self.begin()?;
        let value = match *amount {
            Amount::Whole(n) => Value::Integer(n),
            Amount::Fractional(f) => Value::Real(f),
        };
        let sql = format!(
            "UPDATE {} SET requestAmount = ?1, formattedAmount = ?2 WHERE CAST(id AS TEXT) = ?3",
            self.table
        );
        let changed = self
            .conn
            .execute(&sql, params![value, amount.formatted(), id])
            .map_err(store_err)?;
        Ok(changed > 0)
    }

    fn update_document_url(&mut self, id: &str, url: &str) -> Result<bool, ReconError> {
        self.update_column("documentUrl", id, Value::Text(url.to_string()))
    }

    fn commit(&mut self) -> Result<(), ReconError> {
        if self.in_transaction {
            self.conn.execute("COMMIT", []).map_err(store_err)?;
            self.in_transaction = false;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
