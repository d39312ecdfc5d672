// docrecon CLI - reconcile funding-request documents against the request store

mod audit;
mod exit_codes;
mod link;
mod normalize;
mod settings;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use docrecon_recon::{AmountStrategy, CommitMode, ReconError};

use exit_codes::{exit_code_for, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "docrecon")]
#[command(about = "Reconcile funding-request documents against the request store")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Config file (default: docrecon/docrecon.toml in the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare each request's document with the store, fix summaries, flag amounts
    #[command(after_help = "\
Examples:
  docrecon audit
  docrecon audit --db ndaa_requests.db --report audit_report.md
  docrecon audit --commit per-record --amount-strategy largest
  docrecon audit --json > audit.json")]
    Audit {
        /// SQLite database holding the request table
        #[arg(long)]
        db: Option<PathBuf>,

        /// Where to write the Markdown audit report
        #[arg(long)]
        report: Option<PathBuf>,

        /// When store writes are committed
        #[arg(long, value_enum)]
        commit: Option<CommitArg>,

        /// Which dollar figure to take from a document that has several
        #[arg(long, value_enum)]
        amount_strategy: Option<StrategyArg>,

        /// Print the outcome as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Rewrite flagged amounts from an audit report
    #[command(after_help = "\
Examples:
  docrecon normalize
  docrecon normalize --report audit_report.md --assume-millions
  docrecon normalize --commit per-record --json")]
    Normalize {
        /// SQLite database holding the request table
        #[arg(long)]
        db: Option<PathBuf>,

        /// Audit report to read flagged rows from
        #[arg(long)]
        report: Option<PathBuf>,

        /// Read flagged figures under 1000 as millions ($10.0 -> $10 MILLION)
        #[arg(long)]
        assume_millions: bool,

        /// When store writes are committed
        #[arg(long, value_enum)]
        commit: Option<CommitArg>,

        /// Print the outcome as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Point requests without a document at matching files on disk
    #[command(after_help = "\
Examples:
  docrecon link --dir ~/NDAA/Requests --dry-run
  docrecon link --dir requests/feb --dir requests/new
  docrecon link --relink --json")]
    Link {
        /// SQLite database holding the request table
        #[arg(long)]
        db: Option<PathBuf>,

        /// Directory to scan for .pdf/.docx/.doc files (repeatable)
        #[arg(long = "dir")]
        dirs: Vec<PathBuf>,

        /// Re-score requests that already have a document
        #[arg(long)]
        relink: bool,

        /// Show the links without writing them
        #[arg(long)]
        dry_run: bool,

        /// Print the outcome as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Config file utilities
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Parse and validate a config file without running anything
    #[command(after_help = "\
Examples:
  docrecon config validate docrecon.toml")]
    Validate {
        /// Path to the TOML config
        path: PathBuf,
    },

    /// Print the config file path that would be used
    Path,
}

#[derive(Clone, Copy, ValueEnum)]
enum CommitArg {
    EndOfRun,
    PerRecord,
}

impl From<CommitArg> for CommitMode {
    fn from(arg: CommitArg) -> Self {
        match arg {
            CommitArg::EndOfRun => CommitMode::EndOfRun,
            CommitArg::PerRecord => CommitMode::PerRecord,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    First,
    Largest,
}

impl From<StrategyArg> for AmountStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::First => AmountStrategy::First,
            StrategyArg::Largest => AmountStrategy::Largest,
        }
    }
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  docrecon-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let Cli { config, command } = cli;
    let load = || settings::load_settings(config.as_deref());

    match command {
        Commands::Audit { db, report, commit, amount_strategy, json } => audit::cmd_audit(
            &load()?,
            db,
            report,
            commit.map(Into::into),
            amount_strategy.map(Into::into),
            json,
        ),
        Commands::Normalize { db, report, assume_millions, commit, json } => {
            normalize::cmd_normalize(&load()?, db, report, assume_millions, commit.map(Into::into), json)
        }
        Commands::Link { db, dirs, relink, dry_run, json } => {
            link::cmd_link(&load()?, db, dirs, relink, dry_run, json)
        }
        Commands::Config(cmd) => cmd_config(cmd, config.as_deref()),
    }
}

fn cmd_config(cmd: ConfigCommands, explicit: Option<&Path>) -> Result<(), CliError> {
    match cmd {
        ConfigCommands::Validate { path } => {
            let config = settings::read_config(&path)?;
            eprintln!(
                "{}: ok (store {} table '{}', report {})",
                path.display(),
                config.store.path,
                config.store.table,
                config.audit.report,
            );
            Ok(())
        }
        ConfigCommands::Path => {
            match explicit.map(Path::to_path_buf).or_else(settings::default_config_path) {
                Some(path) if path.is_file() => println!("{}", path.display()),
                Some(path) => println!("{} (not present; defaults in use)", path.display()),
                None => println!("(no config directory; defaults in use)"),
            }
            Ok(())
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::Store(msg) if msg.contains("not found") => {
                Some("pass --db or set [store] path in the config".to_string())
            }
            ReconError::Store(msg) if msg.contains("locked") => {
                Some("another process holds the database; retry later".to_string())
            }
            _ => None,
        };
        Self { code: exit_code_for(&err), message: err.to_string(), hint }
    }
}
