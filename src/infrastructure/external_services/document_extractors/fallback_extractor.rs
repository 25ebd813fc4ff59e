use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use super::pdf_extractor::join_pages;
use crate::application::ports::text_extractor::{
    Document, ExtractedText, ExtractionError, ExtractionStrategy, TextExtractor,
};
use crate::application::ports::OcrEngine;

/// Text layer first, OCR when the text layer is blank or unparseable.
pub struct FallbackTextExtractor {
    primary: Arc<dyn TextExtractor>,
    ocr: Arc<dyn OcrEngine>,
}

impl FallbackTextExtractor {
    pub fn new(primary: Arc<dyn TextExtractor>, ocr: Arc<dyn OcrEngine>) -> Self {
        Self { primary, ocr }
    }

    async fn ocr(&self, document: &Document) -> Result<ExtractedText, ExtractionError> {
        let pages = self.ocr.recognize_pages(document.bytes()).await?;
        Ok(ExtractedText {
            text: join_pages(pages.iter().map(String::as_str)),
            strategy: ExtractionStrategy::Ocr,
            page_count: pages.len(),
        })
    }
}

#[async_trait]
impl TextExtractor for FallbackTextExtractor {
    async fn extract(&self, document: &Document) -> Result<ExtractedText, ExtractionError> {
        match self.primary.extract(document).await {
            Ok(extracted) if !extracted.is_blank() => Ok(extracted),
            Ok(blank) => {
                info!(
                    "No text layer in {} page(s), falling back to OCR",
                    blank.page_count
                );
                self.ocr(document).await
            }
            Err(primary) => {
                warn!("Text layer extraction failed, trying OCR: {}", primary);
                match self.ocr(document).await {
                    Ok(extracted) if !extracted.is_blank() => Ok(extracted),
                    Ok(_) => Err(ExtractionError::Unreadable {
                        primary: primary.to_string(),
                        fallback: "no text recognized".to_string(),
                    }),
                    Err(fallback) => Err(ExtractionError::Unreadable {
                        primary: primary.to_string(),
                        fallback: fallback.to_string(),
                    }),
                }
            }
        }
    }
}
