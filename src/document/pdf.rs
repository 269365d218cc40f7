use lopdf::Document;
use tracing::{debug, warn};

use crate::error::{Result, RelayError};

/// Extract text page by page, one page per line block
pub fn extract_text(bytes: &[u8]) -> Result<String> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| RelayError::Document(format!("Failed to read PDF: {}", e)))?;

    let pages = doc.get_pages();
    debug!("PDF has {} pages", pages.len());

    let mut texts = Vec::with_capacity(pages.len());
    for (page_num, _) in pages {
        match doc.extract_text(&[page_num]) {
            Ok(content) => texts.push(content.trim_end().to_string()),
            Err(e) => warn!("Skipping PDF page {}: {}", page_num, e),
        }
    }

    Ok(texts.join("\n"))
}
