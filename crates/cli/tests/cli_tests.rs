// End-to-end tests driving the built `docrecon` binary against a scratch
// SQLite database and generated DOCX documents.
//
// Run with: cargo test -p docrecon-cli --test cli_tests -- --nocapture

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use rusqlite::Connection;

const ACME_NARRATIVE: &str = "The Acme modular power unit replaces legacy diesel generators \
    at forward operating bases, cutting fuel convoys by forty percent and reducing the \
    acoustic signature of expeditionary units.";

const BETA_NARRATIVE: &str = "Beta Labs will qualify a radiation-hardened flight computer \
    for small satellites, closing a supply gap identified in the last industrial base \
    assessment and enabling responsive launch.";

struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self { dir: tempfile::tempdir().unwrap() }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn db(&self) -> PathBuf {
        self.path("requests.db")
    }

    fn report(&self) -> PathBuf {
        self.path("audit_report.md")
    }

    fn docrecon(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_docrecon"));
        cmd.current_dir(self.dir.path());
        // Keep any real user config out of the run.
        cmd.env("XDG_CONFIG_HOME", self.path("xdg"));
        cmd.env("RUST_LOG", "warn");
        cmd
    }

    fn docx(&self, name: &str, paragraphs: &[&str]) -> PathBuf {
        let path = self.path(name);
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t xml:space=\"preserve\">{p}</w:t></w:r></w:p>"))
            .collect();
        let xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
             <w:body>{body}</w:body></w:document>"
        );
        let file = std::fs::File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
        path
    }

    /// Two documented requests (Acme, Beta) and one without a document.
    fn seed(&self) {
        let acme = self.docx(
            "Acme Power request.docx",
            &[
                "FY27 NDAA Request Form",
                "Amount requested: $5,000,000",
                "Description:",
                ACME_NARRATIVE,
            ],
        );
        let beta = self.docx(
            "Beta Labs request.docx",
            &["Total $3,979", &format!("Summary: {BETA_NARRATIVE}")],
        );

        let conn = Connection::open(self.db()).unwrap();
        conn.execute_batch(
            "CREATE TABLE requests (
                id INTEGER PRIMARY KEY,
                companyName TEXT,
                requestAmount REAL,
                formattedAmount TEXT,
                briefSummary TEXT,
                documentUrl TEXT
            );",
        )
        .unwrap();
        let mut insert = conn
            .prepare("INSERT INTO requests VALUES (?1, ?2, ?3, ?4, ?5, ?6)")
            .unwrap();
        insert
            .execute(rusqlite::params![42, "Acme Power", 5_000_000.0, "$5 MILLION", "Generic", acme.to_str()])
            .unwrap();
        insert
            .execute(rusqlite::params![43, "Beta Labs", 4_000_000.0, "$4 MILLION", BETA_NARRATIVE, beta.to_str()])
            .unwrap();
        insert
            .execute(rusqlite::params![44, "Gamma", 1.0, "$1", "", Option::<String>::None])
            .unwrap();
    }

    fn row(&self, id: i64) -> (f64, String, String, Option<String>) {
        let conn = Connection::open(self.db()).unwrap();
        conn.query_row(
            "SELECT requestAmount, formattedAmount, briefSummary, documentUrl FROM requests WHERE id = ?1",
            [id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
        )
        .unwrap()
    }
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn assert_ok(output: &Output) {
    assert!(
        output.status.success(),
        "exit code: {:?}\nstderr: {}",
        output.status,
        stderr(output)
    );
}

fn json(output: &Output) -> serde_json::Value {
    serde_json::from_str(String::from_utf8_lossy(&output.stdout).trim())
        .unwrap_or_else(|e| panic!("stdout must be one JSON value: {e}"))
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

// ===========================================================================
// audit
// ===========================================================================

#[test]
fn audit_fixes_summary_and_flags_amount() {
    let fx = Fixture::new();
    fx.seed();

    let output = fx
        .docrecon()
        .args(["audit", "--db", path_arg(&fx.db()), "--report", path_arg(&fx.report())])
        .output()
        .unwrap();
    assert_ok(&output);

    let (amount, formatted, summary, _) = fx.row(42);
    assert_eq!(summary, ACME_NARRATIVE);
    assert_eq!(amount, 5_000_000.0);
    assert_eq!(formatted, "$5 MILLION");

    let (amount, _, summary, _) = fx.row(43);
    assert_eq!(summary, BETA_NARRATIVE);
    assert_eq!(amount, 4_000_000.0);

    let report = std::fs::read_to_string(fx.report()).unwrap();
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines[0], "# High-Precision Audit Report");
    assert_eq!(lines[1], "");
    assert_eq!(
        lines[2],
        "| Request ID | Company | Mismatch Type | Document Value | Portal Value | Action Taken |"
    );
    assert_eq!(lines[3], "|---|---|---|---|---|---|");
    assert_eq!(
        lines[4],
        "| 42 | Acme Power | Description Omission | Technical Specs Found | Generic/Missing | Updated Portal Text |"
    );
    assert_eq!(
        lines[5],
        "| 43 | Beta Labs | Amount Cent Mismatch | $3,979 | $4 MILLION | FLAGGED ERROR |"
    );
    assert_eq!(lines.len(), 6);
}

#[test]
fn audit_json_describes_the_run() {
    let fx = Fixture::new();
    fx.seed();

    let output = fx
        .docrecon()
        .args(["audit", "--db", path_arg(&fx.db()), "--report", path_arg(&fx.report()), "--json"])
        .output()
        .unwrap();
    assert_ok(&output);

    let val = json(&output);
    assert_eq!(val["summary"]["records_scanned"], 3);
    assert_eq!(val["summary"]["skipped_no_document"], 1);
    assert_eq!(val["summary"]["descriptions_updated"], 1);
    assert_eq!(val["summary"]["amounts_flagged"], 1);
    assert_eq!(val["meta"]["commit_mode"], "end_of_run");
    assert_eq!(val["entries"].as_array().unwrap().len(), 2);
    assert_eq!(val["report"], path_arg(&fx.report()));
}

#[test]
fn audit_twice_only_reflags_amounts() {
    let fx = Fixture::new();
    fx.seed();
    let db = fx.db();
    let report_path = fx.report();
    let args = ["audit", "--db", path_arg(&db), "--report", path_arg(&report_path)];

    assert_ok(&fx.docrecon().args(args).output().unwrap());
    assert_ok(&fx.docrecon().args(args).output().unwrap());

    let report = std::fs::read_to_string(fx.report()).unwrap();
    assert!(!report.contains("Description Omission"));
    assert!(report.contains("| 43 | Beta Labs | Amount Cent Mismatch |"));
}

// ===========================================================================
// normalize
// ===========================================================================

#[test]
fn normalize_applies_flagged_amounts() {
    let fx = Fixture::new();
    fx.seed();
    assert_ok(
        &fx.docrecon()
            .args(["audit", "--db", path_arg(&fx.db()), "--report", path_arg(&fx.report())])
            .output()
            .unwrap(),
    );

    let output = fx
        .docrecon()
        .args(["normalize", "--db", path_arg(&fx.db()), "--report", path_arg(&fx.report()), "--json"])
        .output()
        .unwrap();
    assert_ok(&output);

    let val = json(&output);
    assert_eq!(val["rows_considered"], 1);
    assert_eq!(val["updated"][0]["request_id"], "43");
    assert_eq!(val["updated"][0]["formatted"], "$3,979");

    let (amount, formatted, _, _) = fx.row(43);
    assert_eq!(amount, 3_979.0);
    assert_eq!(formatted, "$3,979");

    // Document and store now agree.
    assert_ok(
        &fx.docrecon()
            .args(["audit", "--db", path_arg(&fx.db()), "--report", path_arg(&fx.report())])
            .output()
            .unwrap(),
    );
    let report = std::fs::read_to_string(fx.report()).unwrap();
    assert_eq!(report.lines().count(), 4);
}

#[test]
fn normalize_without_report_is_an_io_error() {
    let fx = Fixture::new();
    fx.seed();
    let output = fx
        .docrecon()
        .args(["normalize", "--db", path_arg(&fx.db()), "--report", path_arg(&fx.path("none.md"))])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("docrecon audit"));
}

// ===========================================================================
// link
// ===========================================================================

#[test]
fn link_attaches_matching_document() {
    let fx = Fixture::new();
    fx.seed();
    let docs = fx.path("incoming");
    std::fs::create_dir(&docs).unwrap();
    std::fs::write(docs.join("FY27 NDAA Request Form - Gamma.pdf"), b"%PDF").unwrap();
    std::fs::write(docs.join("unrelated.pdf"), b"%PDF").unwrap();

    let dry = fx
        .docrecon()
        .args(["link", "--db", path_arg(&fx.db()), "--dir", path_arg(&docs), "--dry-run", "--json"])
        .output()
        .unwrap();
    assert_ok(&dry);
    let val = json(&dry);
    assert_eq!(val["links"][0]["request_id"], "44");
    assert_eq!(val["dry_run"], true);
    assert_eq!(fx.row(44).3, None);

    let output = fx
        .docrecon()
        .args(["link", "--db", path_arg(&fx.db()), "--dir", path_arg(&docs)])
        .output()
        .unwrap();
    assert_ok(&output);
    let (_, _, _, url) = fx.row(44);
    assert!(url.unwrap().ends_with("FY27 NDAA Request Form - Gamma.pdf"));
    assert!(stderr(&output).contains("1 linked"));
}

#[test]
fn link_without_directories_is_a_usage_error() {
    let fx = Fixture::new();
    fx.seed();
    let output = fx
        .docrecon()
        .args(["link", "--db", path_arg(&fx.db())])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ===========================================================================
// config + failures
// ===========================================================================

#[test]
fn config_file_supplies_paths() {
    let fx = Fixture::new();
    fx.seed();
    let config = fx.path("docrecon.toml");
    std::fs::write(
        &config,
        "[store]\npath = \"requests.db\"\n\n[audit]\nreport = \"out/report.md\"\ncommit = \"per_record\"\n",
    )
    .unwrap();

    let output = fx
        .docrecon()
        .args(["--config", path_arg(&config), "audit", "--json"])
        .output()
        .unwrap();
    assert_ok(&output);
    assert_eq!(json(&output)["meta"]["commit_mode"], "per_record");
    assert!(fx.path("out/report.md").is_file());
}

#[test]
fn config_validate_reports_problems() {
    let fx = Fixture::new();
    let good = fx.path("good.toml");
    std::fs::write(&good, "[store]\ntable = \"requests\"\n").unwrap();
    assert_ok(&fx.docrecon().args(["config", "validate", path_arg(&good)]).output().unwrap());

    let bad = fx.path("bad.toml");
    std::fs::write(&bad, "[store]\ntable = \"requests; DROP TABLE requests\"\n").unwrap();
    let output = fx.docrecon().args(["config", "validate", path_arg(&bad)]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));

    let unknown = fx.path("unknown.toml");
    std::fs::write(&unknown, "[audit]\nreprot = \"x.md\"\n").unwrap();
    let output = fx.docrecon().args(["config", "validate", path_arg(&unknown)]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn missing_database_is_a_store_error() {
    let fx = Fixture::new();
    let output = fx
        .docrecon()
        .args(["audit", "--db", path_arg(&fx.path("absent.db"))])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(6));
    assert!(!fx.path("absent.db").exists());
    assert!(!fx.report().exists());
}
