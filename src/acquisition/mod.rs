// * Text Acquisition
// * Gets raw product text from files, stdin or OCR before parsing.
// * Failures stay here: callers that want a best-effort parse use `acquire_or_empty`.

pub mod errors;
pub mod ocr;
pub mod source;

pub use errors::AcquisitionError;
pub use ocr::{OcrEngine, OcrSession};
pub use source::{
    acquire_or_empty, AcquireResult, FileTextSource, InlineTextSource, StdinTextSource, TextSource,
};
