use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },
    #[error("{0} is not installed or not on PATH")]
    ToolMissing(String),
    #[error("OCR timed out after {0:?}")]
    Timeout(Duration),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Rasterizes a PDF and recognizes the text of each page, in page order.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize_pages(&self, pdf: &[u8]) -> Result<Vec<String>, OcrError>;
}
