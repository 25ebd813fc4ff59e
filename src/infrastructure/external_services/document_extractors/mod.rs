pub mod fallback_extractor;
pub mod pdf_extractor;
pub mod tesseract_ocr;

pub use fallback_extractor::FallbackTextExtractor;
pub use pdf_extractor::PdfTextExtractor;
pub use tesseract_ocr::{TesseractCliOcr, TesseractConfig};
