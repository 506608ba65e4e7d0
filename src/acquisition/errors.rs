use thiserror::Error;

// * Unified Error type for text acquisition.
#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error("Read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported input: {0}")]
    Unsupported(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("No text in {0}")]
    Empty(String),
}
