use lopdf::Document;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::error::Error;

/// Default number of bytes read from the head of a text file.
pub const DEFAULT_MAX_BYTES: usize = 16 * 1024;

/// Leading pages of a PDF that carry its topic (title page, contents).
pub const DEFAULT_PDF_PAGES: usize = 2;

/// Extensions [`PlainTextExtractor`] reads; everything else yields no text.
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "csv", "tsv", "json", "html", "htm", "rst", "tex"];

/// Pulls document text out of a file for model-based scoring.
///
/// Formats an extractor does not understand produce an empty string, not an error.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<String, Error>;
}

/// Never reads file contents.
pub struct NoExtraction;

impl TextExtractor for NoExtraction {
    fn extract(&self, _path: &Path) -> Result<String, Error> {
        Ok(String::new())
    }
}

/// Reads the first `max_bytes` of text-like files, lowercased.
pub struct PlainTextExtractor {
    pub max_bytes: usize,
}

impl Default for PlainTextExtractor {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

fn is_text_file(path: &Path) -> bool {
    extension(path)
        .map(|ext| TEXT_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

fn is_pdf(path: &Path) -> bool {
    extension(path).as_deref() == Some("pdf")
}

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, path: &Path) -> Result<String, Error> {
        if !is_text_file(path) {
            return Ok(String::new());
        }
        let mut buffer = Vec::with_capacity(self.max_bytes.min(DEFAULT_MAX_BYTES));
        File::open(path)?
            .take(self.max_bytes as u64)
            .read_to_end(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_lowercase())
    }
}

/// Text of the first `max_pages` pages of a PDF, lowercased.
///
/// A file that does not parse as a PDF is an error so it shows up in the run log.
pub struct PdfTextExtractor {
    pub max_pages: usize,
}

impl Default for PdfTextExtractor {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_PDF_PAGES,
        }
    }
}

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, path: &Path) -> Result<String, Error> {
        if !is_pdf(path) {
            return Ok(String::new());
        }
        let document = Document::load(path)?;
        let pages: Vec<u32> = document
            .get_pages()
            .into_keys()
            .take(self.max_pages)
            .collect();
        if pages.is_empty() {
            debug!("{} has no pages", path.display());
            return Ok(String::new());
        }
        Ok(document.extract_text(&pages)?.to_lowercase())
    }
}

/// PDFs through [`PdfTextExtractor`], text-like files through [`PlainTextExtractor`].
#[derive(Default)]
pub struct DocumentExtractor {
    pub plain: PlainTextExtractor,
    pub pdf: PdfTextExtractor,
}

impl TextExtractor for DocumentExtractor {
    fn extract(&self, path: &Path) -> Result<String, Error> {
        if is_pdf(path) {
            self.pdf.extract(path)
        } else {
            self.plain.extract(path)
        }
    }
}
