pub mod document;
pub mod hyphen;

pub use document::{RepairMark, RunFormat, TextDocument, TextLine, TextParagraph, TextRun};
pub use hyphen::repair_hyphens;
