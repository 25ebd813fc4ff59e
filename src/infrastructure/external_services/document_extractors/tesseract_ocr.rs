use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::application::ports::ocr_engine::{OcrEngine, OcrError};

#[derive(Debug, Clone)]
pub struct TesseractConfig {
    pub tesseract_path: String,
    pub pdftoppm_path: String,
    pub dpi: u32,
    pub timeout: Duration,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            tesseract_path: "tesseract".to_string(),
            pdftoppm_path: "pdftoppm".to_string(),
            dpi: 300,
            timeout: Duration::from_secs(120),
        }
    }
}

/// OCR through the `pdftoppm` and `tesseract` command-line tools.
pub struct TesseractCliOcr {
    config: TesseractConfig,
}

impl TesseractCliOcr {
    pub fn new(config: TesseractConfig) -> Self {
        Self { config }
    }

    async fn run(&self, cmd: &mut Command, tool: &str) -> Result<Output, OcrError> {
        let output = cmd.kill_on_drop(true).output().await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => OcrError::ToolMissing(tool.to_string()),
            _ => OcrError::Io(e),
        })?;

        if !output.status.success() {
            return Err(OcrError::ToolFailed {
                tool: tool.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }

    async fn rasterize(&self, pdf_path: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, OcrError> {
        let prefix = out_dir.join("page");
        let mut cmd = Command::new(&self.config.pdftoppm_path);
        cmd.arg("-r")
            .arg(self.config.dpi.to_string())
            .arg("-png")
            .arg(pdf_path)
            .arg(&prefix);
        self.run(&mut cmd, "pdftoppm").await?;

        let mut images = Vec::new();
        let mut entries = tokio::fs::read_dir(out_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "png") {
                images.push(path);
            }
        }
        images.sort_by_key(|path| page_number(path));
        Ok(images)
    }

    async fn recognize_image(&self, image: &Path) -> Result<String, OcrError> {
        let mut cmd = Command::new(&self.config.tesseract_path);
        cmd.arg(image).arg("stdout");
        let output = self.run(&mut cmd, "tesseract").await?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn recognize_all(&self, pdf: &[u8]) -> Result<Vec<String>, OcrError> {
        let workdir = tempfile::tempdir()?;
        let pdf_path = workdir.path().join("input.pdf");
        tokio::fs::write(&pdf_path, pdf).await?;

        let images_dir = workdir.path().join("pages");
        tokio::fs::create_dir(&images_dir).await?;
        let images = self.rasterize(&pdf_path, &images_dir).await?;
        debug!("Rasterized {} page(s) at {} dpi", images.len(), self.config.dpi);

        let mut pages = Vec::with_capacity(images.len());
        for image in &images {
            pages.push(self.recognize_image(image).await?);
        }
        Ok(pages)
    }
}

impl Default for TesseractCliOcr {
    fn default() -> Self {
        Self::new(TesseractConfig::default())
    }
}

/// pdftoppm names pages `page-1.png`, `page-01.png`, ... depending on count.
fn page_number(path: &Path) -> u32 {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.rsplit('-').next())
        .and_then(|n| n.parse().ok())
        .unwrap_or(u32::MAX)
}

#[async_trait]
impl OcrEngine for TesseractCliOcr {
    async fn recognize_pages(&self, pdf: &[u8]) -> Result<Vec<String>, OcrError> {
        match tokio::time::timeout(self.config.timeout, self.recognize_all(pdf)).await {
            Ok(result) => result,
            Err(_) => Err(OcrError::Timeout(self.config.timeout)),
        }
    }
}
