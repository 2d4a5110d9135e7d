use image::DynamicImage;

use crate::error::OcrdeskError;

use super::results::Block;

/// Blocking interface to a page recognizer.
///
/// Implementations wrap an actual recognizer process or library and are
/// expected to block for seconds; callers must dispatch through
/// [`super::RecognitionPool`] rather than invoke these on the control
/// thread.
///
/// All returned geometry is relative to the top-left corner of the image
/// that was passed in.
pub trait OcrEngine: Send + Sync {
    /// Recognizes the text of a single cropped region image.
    ///
    /// `raw` requests character-exact output: the caller wants the result
    /// attached without confidence gating or any text cleanup, e.g. for
    /// source code listings. `dpi` and `language` parameterize the
    /// recognizer model.
    fn recognize(
        &self,
        image: &DynamicImage,
        dpi: f32,
        language: &str,
        raw: bool,
    ) -> Result<Vec<Block>, OcrdeskError>;

    /// Segments a full page image into typed blocks without running
    /// character recognition.
    ///
    /// `exclude_top` and `exclude_bottom` give the Y-coordinates of the
    /// header and footer boundaries; content outside the band between them
    /// is ignored. Pass `0.0` and the image height when no boundaries are
    /// set.
    fn analyze_layout(
        &self,
        image: &DynamicImage,
        exclude_top: f32,
        exclude_bottom: f32,
    ) -> Result<Vec<Block>, OcrdeskError>;
}

/// Spell-check dictionary backing hyphenation repair.
///
/// Lookups are exact: the caller strips punctuation before checking.
pub trait Dictionary: Send + Sync {
    /// Whether a dictionary for `language` is available at all.
    fn supports(&self, language: &str) -> bool;

    /// Whether `word` is a known word of `language`.
    fn check(&self, word: &str, language: &str) -> bool;
}
