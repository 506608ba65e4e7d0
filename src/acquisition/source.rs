// * Text Sources
// * Where product text comes from before it reaches the parser. Binary formats
// * are refused here rather than handed to the cleaner as garbage.

use super::errors::AcquisitionError;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::io::AsyncReadExt;

/// Type alias for async acquisition result
pub type AcquireResult = Pin<Box<dyn Future<Output = Result<String, AcquisitionError>> + Send>>;

// * Extensions that need a document or OCR pipeline
const BINARY_EXTENSIONS: &[&str] = &[
    "pdf", "png", "jpg", "jpeg", "gif", "webp", "heic", "bmp", "tif", "tiff",
];

/// Anything that can produce raw product text
pub trait TextSource: Send + Sync {
    fn acquire(&self) -> AcquireResult;

    /// Short label for logs
    fn describe(&self) -> String;
}

/// Reads a UTF-8 text, HTML or Markdown file
#[derive(Debug, Clone)]
pub struct FileTextSource {
    path: PathBuf,
}

impl FileTextSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_binary(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| BINARY_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }
}

impl TextSource for FileTextSource {
    fn acquire(&self) -> AcquireResult {
        let path = self.path.clone();
        Box::pin(async move {
            let label = path.display().to_string();
            if Self::is_binary(&path) {
                return Err(AcquisitionError::Unsupported(label));
            }

            let bytes = tokio::fs::read(&path).await?;
            let text = String::from_utf8(bytes)
                .map_err(|_| AcquisitionError::Unsupported(format!("{} is not UTF-8", label)))?;
            if text.trim().is_empty() {
                return Err(AcquisitionError::Empty(label));
            }
            Ok(text)
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Reads all of standard input
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinTextSource;

impl TextSource for StdinTextSource {
    fn acquire(&self) -> AcquireResult {
        Box::pin(async move {
            let mut text = String::new();
            tokio::io::stdin().read_to_string(&mut text).await?;
            if text.trim().is_empty() {
                return Err(AcquisitionError::Empty("stdin".to_string()));
            }
            Ok(text)
        })
    }

    fn describe(&self) -> String {
        "stdin".to_string()
    }
}

/// Text already in memory (pasted input, tests)
#[derive(Debug, Clone, Default)]
pub struct InlineTextSource {
    text: String,
}

impl InlineTextSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl TextSource for InlineTextSource {
    fn acquire(&self) -> AcquireResult {
        let text = self.text.clone();
        Box::pin(async move { Ok(text) })
    }

    fn describe(&self) -> String {
        format!("inline ({} chars)", self.text.chars().count())
    }
}

/// Acquires text, turning any failure into an empty string
pub async fn acquire_or_empty<S: TextSource + ?Sized>(source: &S) -> String {
    match source.acquire().await {
        Ok(text) => {
            tracing::debug!(source = %source.describe(), chars = text.len(), "Text acquired");
            text
        }
        Err(e) => {
            tracing::warn!(source = %source.describe(), error = %e, "Text acquisition failed; parsing empty input");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_reads_text_file() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(file, "Weight: 658 g").unwrap();

        let source = FileTextSource::new(file.path());
        let text = source.acquire().await.unwrap();
        assert_eq!(text.trim(), "Weight: 658 g");
    }

    #[tokio::test]
    async fn test_rejects_pdf_and_images() {
        for suffix in [".pdf", ".PNG", ".jpeg"] {
            let file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
            let result = FileTextSource::new(file.path()).acquire().await;
            assert!(matches!(result, Err(AcquisitionError::Unsupported(_))), "{}", suffix);
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileTextSource::new(dir.path().join("nope.html")).acquire().await;
        assert!(matches!(result, Err(AcquisitionError::Io(_))));
    }

    #[tokio::test]
    async fn test_non_utf8_is_unsupported() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(&[0xff, 0xfe, 0x00, 0x41]).unwrap();
        let result = FileTextSource::new(file.path()).acquire().await;
        assert!(matches!(result, Err(AcquisitionError::Unsupported(_))));
    }

    #[tokio::test]
    async fn test_acquire_or_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = FileTextSource::new(dir.path().join("gone.md"));
        assert_eq!(acquire_or_empty(&missing).await, "");

        let blank = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
        assert_eq!(acquire_or_empty(&FileTextSource::new(blank.path())).await, "");

        let inline = InlineTextSource::new("Mount: Sony E");
        assert_eq!(acquire_or_empty(&inline).await, "Mount: Sony E");
    }
}
