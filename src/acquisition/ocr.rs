// * Scoped OCR Session
// * OCR engines are expensive to start, so a session builds its engine on the
// * first image and keeps it for the rest of an import. The engine is released
// * explicitly or when the session is dropped; nothing is shared between sessions.

use super::errors::AcquisitionError;

/// A loaded OCR engine
pub trait OcrEngine {
    /// Recognizes the text in one encoded image
    fn recognize(&mut self, image: &[u8]) -> Result<String, AcquisitionError>;
}

/// Caller-owned OCR resource. `F` builds the engine on first use.
pub struct OcrSession<F, E>
where
    F: FnMut() -> Result<E, AcquisitionError>,
    E: OcrEngine,
{
    factory: F,
    engine: Option<E>,
    images: usize,
}

impl<F, E> OcrSession<F, E>
where
    F: FnMut() -> Result<E, AcquisitionError>,
    E: OcrEngine,
{
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            engine: None,
            images: 0,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.engine.is_some()
    }

    /// Images recognized since the session opened
    pub fn images_recognized(&self) -> usize {
        self.images
    }

    pub fn recognize(&mut self, image: &[u8]) -> Result<String, AcquisitionError> {
        if image.is_empty() {
            return Err(AcquisitionError::Ocr("empty image".to_string()));
        }

        if self.engine.is_none() {
            tracing::debug!("Starting OCR engine");
            self.engine = Some((self.factory)()?);
        }
        let engine = self
            .engine
            .as_mut()
            .ok_or_else(|| AcquisitionError::Ocr("engine unavailable".to_string()))?;

        let text = engine.recognize(image)?;
        self.images += 1;
        Ok(text)
    }

    /// Drops the engine; the next `recognize` starts a fresh one
    pub fn release(&mut self) {
        if self.engine.take().is_some() {
            tracing::debug!(images = self.images, "OCR engine released");
        }
    }
}

impl<F, E> Drop for OcrSession<F, E>
where
    F: FnMut() -> Result<E, AcquisitionError>,
    E: OcrEngine,
{
    fn drop(&mut self) {
        self.release();
    }
}
