/// Minimum average block confidence (0-100 scale) for accepting a
/// recognition result as text.
///
/// Blocks below this score are treated as images rather than text. The
/// default of 30 keeps obviously garbled recognitions (photos, line art)
/// out of the text flow while accepting low-quality but legible scans.
/// The value is injected through `ReconcilerConfig`, never read from
/// global state.
pub const CONFIDENCE_THRESHOLD: f32 = 30.0;

/// Safety margin in pixels added around block bounding boxes when a
/// recognition result splits a region into several new ones.
///
/// Recognizers tend to return tight boxes; re-running recognition on an
/// exact crop often clips ascenders and descenders. A few pixels of slack
/// avoids that.
pub const SPLIT_SAFETY_MARGIN: f32 = 5.0;

/// Minimum width and height in scene units for a drawn region to be kept.
///
/// Drags smaller than this in either dimension are treated as accidental
/// clicks and discarded on pointer-up.
pub const MIN_REGION_SIZE: f32 = 10.0;

/// Word confidence below which diagnostics rendering highlights a word.
///
/// Only affects the derived text document, not reconciliation.
pub const DIAGNOSTICS_THRESHOLD: f32 = 80.0;

/// Revision number written at the head of every project file.
///
/// Loading fails hard on mismatch; there is no partial recovery of
/// foreign revisions.
pub const FORMAT_REVISION: i16 = 8;

/// Punctuation and quote characters stripped from word fragments before
/// dictionary lookup during hyphenation repair.
pub const WORD_TRIM_CHARS: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~»«›‹„“”";
