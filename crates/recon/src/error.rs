use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad table name, empty report path, etc.).
    ConfigValidation(String),
    /// Store query, update or commit failed. Always fatal for the run.
    Store(String),
    /// IO error (report read/write, directory scan).
    Io(String),
    /// Report line could not be read back as a table row.
    ReportParse { line: usize, message: String },
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Store(msg) => write!(f, "store error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
            Self::ReportParse { line, message } => {
                write!(f, "report line {line}: {message}")
            }
        }
    }
}

impl std::error::Error for ReconError {}

impl From<std::io::Error> for ReconError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
