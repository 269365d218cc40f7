// Text acquisition
//
// Text comes either straight from the user or from an uploaded document:
// - plain text: passed through
// - PDF: text of each page, joined with newlines
// - DOCX: text of each paragraph, joined with newlines
//
// Acquisition never fails outright. Unreadable or unsupported documents give
// empty text, which the workflow rejects as missing input.

pub mod docx;
pub mod pdf;

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{Result, RelayError};

pub const MIME_PLAIN_TEXT: &str = "text/plain";
pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Pdf,
    WordProcessor,
}

impl DocumentKind {
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim().to_lowercase();
        match essence.as_str() {
            MIME_PLAIN_TEXT => Some(Self::PlainText),
            MIME_PDF => Some(Self::Pdf),
            MIME_DOCX => Some(Self::WordProcessor),
            _ => None,
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let extension = path.as_ref().extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "txt" | "text" | "md" => Some(Self::PlainText),
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::WordProcessor),
            _ => None,
        }
    }
}

/// Where the text to translate comes from
#[derive(Debug, Clone)]
pub enum TextSource {
    Direct(String),
    Document {
        path: PathBuf,
        /// Declared MIME type; the file extension is used when absent
        mime: Option<String>,
    },
}

/// Extract text from document bytes
pub fn extract_text(bytes: &[u8], kind: DocumentKind) -> Result<String> {
    match kind {
        DocumentKind::PlainText => String::from_utf8(bytes.to_vec())
            .map_err(|e| RelayError::Document(format!("Text file is not UTF-8: {}", e))),
        DocumentKind::Pdf => pdf::extract_text(bytes),
        DocumentKind::WordProcessor => docx::extract_text(bytes),
    }
}

async fn read_document(path: &Path, mime: Option<&str>) -> Result<String> {
    let kind = match mime {
        Some(mime) => DocumentKind::from_mime(mime),
        None => DocumentKind::from_path(path),
    }
    .ok_or_else(|| {
        RelayError::UnsupportedFormat(mime.map(str::to_string).unwrap_or_else(|| path.display().to_string()))
    })?;

    let bytes = tokio::fs::read(path).await?;
    extract_text(&bytes, kind)
}

/// Obtain the raw text for a request; empty on any failure
pub async fn acquire_text(source: &TextSource) -> String {
    match source {
        TextSource::Direct(text) => text.clone(),
        TextSource::Document { path, mime } => {
            info!("Extracting text from {}", path.display());
            match read_document(path, mime.as_deref()).await {
                Ok(text) => {
                    info!("Extracted {} characters", text.chars().count());
                    text
                }
                Err(e) => {
                    warn!("Could not read {}: {}", path.display(), e);
                    String::new()
                }
            }
        }
    }
}
