pub mod engine;
pub mod pool;
pub mod results;

pub use engine::{Dictionary, OcrEngine};
pub use pool::{RecognitionMessage, RecognitionPool, RecognitionRequest};
pub use results::{Block, BlockType, Line, Paragraph, Word};
