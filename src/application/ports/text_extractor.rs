use async_trait::async_trait;
use thiserror::Error;

use crate::application::ports::ocr_engine::OcrError;

/// Raw uploaded document. Lives only for the duration of extraction.
#[derive(Debug, Clone)]
pub struct Document {
    bytes: Vec<u8>,
    name: Option<String>,
}

impl Document {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes, name: None }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    TextLayer,
    Ocr,
}

impl std::fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionStrategy::TextLayer => write!(f, "text-layer"),
            ExtractionStrategy::Ocr => write!(f, "ocr"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub text: String,
    pub strategy: ExtractionStrategy,
    pub page_count: usize,
}

impl ExtractedText {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Corrupted file: {0}")]
    CorruptedFile(String),
    #[error("Encrypted file could not be decrypted: {0}")]
    Encrypted(String),
    #[error("Document unreadable (text layer: {primary}; ocr: {fallback})")]
    Unreadable { primary: String, fallback: String },
    #[error("OCR failed: {0}")]
    Ocr(#[from] OcrError),
}

#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, document: &Document) -> Result<ExtractedText, ExtractionError>;
}
