use async_trait::async_trait;
use lopdf::Document as PdfDocument;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::application::ports::text_extractor::{
    Document, ExtractedText, ExtractionError, ExtractionStrategy, TextExtractor,
};

/// Text-layer extraction with lopdf. Pages are decoded in parallel and
/// reassembled in page order.
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self
    }

    fn load(&self, bytes: &[u8]) -> Result<PdfDocument, ExtractionError> {
        let mut doc = PdfDocument::load_mem(bytes)
            .map_err(|e| ExtractionError::CorruptedFile(e.to_string()))?;

        if doc.is_encrypted() {
            // Owner-password-only PDFs open with the empty user password.
            doc.decrypt("")
                .map_err(|e| ExtractionError::Encrypted(e.to_string()))?;
        }

        Ok(doc)
    }

    fn extract_pages(doc: &PdfDocument) -> (BTreeMap<u32, String>, Vec<String>) {
        let pages: Vec<u32> = doc.get_pages().into_keys().collect();

        let extracted: Vec<Result<(u32, String), String>> = pages
            .into_par_iter()
            .map(|page_num| {
                doc.extract_text(&[page_num])
                    .map(|text| (page_num, text))
                    .map_err(|e| format!("Failed to extract text from page {}: {}", page_num, e))
            })
            .collect();

        let mut page_texts = BTreeMap::new();
        let mut errors = Vec::new();
        for page_result in extracted {
            match page_result {
                Ok((page_num, text)) => {
                    page_texts.insert(page_num, text);
                }
                Err(e) => errors.push(e),
            }
        }

        (page_texts, errors)
    }
}

impl Default for PdfTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Concatenates pages in order. A newline separates two pages only when the
/// first does not already end in whitespace.
pub fn join_pages<'a>(pages: impl IntoIterator<Item = &'a str>) -> String {
    let mut text = String::new();
    for page in pages {
        if !text.is_empty() && !text.ends_with(char::is_whitespace) {
            text.push('\n');
        }
        text.push_str(page);
    }
    text
}

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract(&self, document: &Document) -> Result<ExtractedText, ExtractionError> {
        let doc = self.load(document.bytes())?;
        let (page_texts, errors) = Self::extract_pages(&doc);

        for error in &errors {
            warn!("{}", error);
        }
        let page_count = page_texts.len() + errors.len();
        debug!(
            "Text layer yielded {} of {} page(s)",
            page_texts.len(),
            page_count
        );

        Ok(ExtractedText {
            text: join_pages(page_texts.values().map(String::as_str)),
            strategy: ExtractionStrategy::TextLayer,
            page_count,
        })
    }
}
