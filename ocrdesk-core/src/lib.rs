pub mod consts;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod ocr;
pub mod page;
pub mod project;
pub mod text;

// Re-export commonly used types
pub use editor::{
    CommandStack, Editor, EditorConfig, EditorInput, EditorRequest, EditorState, KeyCommand,
    ReconcileOutcome, Reconciler, ReconcilerConfig,
};
pub use error::OcrdeskError;
pub use ocr::{Block, Dictionary, OcrEngine, RecognitionMessage, RecognitionPool};
pub use page::{Page, Region, RegionKind, RegionStore};
pub use project::Project;
