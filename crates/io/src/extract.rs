//! Flat text from request documents.
//!
//! The format is resolved once from the file extension into a
//! [`DocumentKind`]. Reading never fails outward: any problem is logged and
//! the document reads as empty, which the engine treats as "skip".

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::{debug, warn};

use docrecon_recon::TextExtractor;

/// Document formats the extractor knows how to dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    /// Legacy binary Word. Tried through the DOCX reader, which will almost
    /// always reject it.
    LegacyDoc,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "doc" => Some(Self::LegacyDoc),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pdf => write!(f, "pdf"),
            Self::Docx => write!(f, "docx"),
            Self::LegacyDoc => write!(f, "doc"),
        }
    }
}

#[derive(Debug)]
pub enum ExtractError {
    Io(std::io::Error),
    Pdf(String),
    Docx(String),
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "cannot read document: {e}"),
            Self::Pdf(msg) => write!(f, "PDF extraction failed: {msg}"),
            Self::Docx(msg) => write!(f, "DOCX extraction failed: {msg}"),
        }
    }
}

impl std::error::Error for ExtractError {}

impl From<std::io::Error> for ExtractError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// The production [`TextExtractor`]: PDF and DOCX from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentReader;

impl TextExtractor for DocumentReader {
    fn extract(&self, path: &Path) -> String {
        extract_text(path)
    }
}

/// Text of the document at `path`, or an empty string if it cannot be read.
pub fn extract_text(path: &Path) -> String {
    let Some(kind) = DocumentKind::from_path(path) else {
        debug!("{}: unsupported document type", path.display());
        return String::new();
    };

    match try_extract(kind, path) {
        Ok(text) => text,
        Err(e) => {
            warn!("{}: {e}", path.display());
            String::new()
        }
    }
}

/// Like [`extract_text`] but reports why extraction failed.
pub fn try_extract(kind: DocumentKind, path: &Path) -> Result<String, ExtractError> {
    match kind {
        DocumentKind::Pdf => read_pdf(path),
        DocumentKind::Docx | DocumentKind::LegacyDoc => read_docx(path),
    }
}

// ---------------------------------------------------------------------------
// PDF
// ---------------------------------------------------------------------------

fn read_pdf(path: &Path) -> Result<String, ExtractError> {
    let bytes = std::fs::read(path)?;

    // pdf-extract panics on some malformed inputs rather than erroring.
    let pages = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(&bytes))
        .map_err(|_| ExtractError::Pdf("parser panicked".into()))?
        .map_err(|e| ExtractError::Pdf(e.to_string()))?;

    Ok(join_pages(&pages))
}

/// Concatenate page texts, each followed by a newline; pages with no text are
/// dropped.
pub fn join_pages<S: AsRef<str>>(pages: &[S]) -> String {
    let mut text = String::new();
    for page in pages.iter().map(AsRef::as_ref).filter(|p| !p.is_empty()) {
        text.push_str(page);
        text.push('\n');
    }
    text
}

// ---------------------------------------------------------------------------
// DOCX
// ---------------------------------------------------------------------------

fn read_docx(path: &Path) -> Result<String, ExtractError> {
    use zip::ZipArchive;

    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file).map_err(|e| ExtractError::Docx(e.to_string()))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractError::Docx(e.to_string()))?
        .read_to_string(&mut xml)?;

    Ok(docx_paragraphs(&xml)?.join("\n"))
}

/// Paragraph texts of a `word/document.xml` part.
///
/// Runs are concatenated; `<w:tab/>` reads as a tab and `<w:br/>` as a line
/// break. Empty paragraphs are kept so paragraph positions line up.
///
/// A paragraph nested inside another (text boxes) is emitted on its own when
/// it closes, before the paragraph that holds it. The `mc:Fallback` branch of
/// alternate content repeats the preferred branch and is skipped.
pub fn docx_paragraphs(xml: &str) -> Result<Vec<String>, ExtractError> {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut paragraphs = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();

    // One buffer per open `w:p`, innermost last.
    let mut open: Vec<String> = Vec::new();
    let mut runs = 0usize;
    let mut fallback = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"Fallback" => fallback += 1,
                _ if fallback > 0 => {}
                b"p" => open.push(String::new()),
                b"r" => runs += 1,
                b"t" if !open.is_empty() => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) if fallback == 0 => {
                let current = open.last_mut();
                match (e.local_name().as_ref(), current) {
                    (b"p", _) => paragraphs.push(String::new()),
                    (b"tab", Some(current)) if runs > 0 => current.push('\t'),
                    (b"br" | b"cr", Some(current)) if runs > 0 => current.push('\n'),
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) if in_text => {
                if let Some(current) = open.last_mut() {
                    current.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(ref e)) if in_text => {
                if let (Some(ch), Some(current)) = (resolve_entity(e.as_ref()), open.last_mut()) {
                    current.push(ch);
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"Fallback" => fallback = fallback.saturating_sub(1),
                _ if fallback > 0 => {}
                b"t" => in_text = false,
                b"r" => runs = runs.saturating_sub(1),
                b"p" => {
                    if let Some(text) = open.pop() {
                        paragraphs.push(text);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractError::Docx(format!(
                    "malformed document.xml at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

/// Predefined XML entities and numeric character references, by name.
fn resolve_entity(name: &[u8]) -> Option<char> {
    match name {
        b"amp" => Some('&'),
        b"lt" => Some('<'),
        b"gt" => Some('>'),
        b"quot" => Some('"'),
        b"apos" => Some('\''),
        _ => {
            let name = std::str::from_utf8(name).ok()?;
            let code = match name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => name.strip_prefix('#')?.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
