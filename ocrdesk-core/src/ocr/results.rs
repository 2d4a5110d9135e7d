use serde::{Deserialize, Serialize};

use crate::consts::DIAGNOSTICS_THRESHOLD;
use crate::geometry::Bbox;
use crate::text::document::{RepairMark, RunFormat, TextDocument, TextLine, TextParagraph, TextRun};

/// Structural type of a recognized block, set by page segmentation.
///
/// `HLine`/`VLine` are separator marks that never become editable regions;
/// `Unknown` blocks are skipped entirely.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockType {
    #[default]
    Text,
    Image,
    HLine,
    VLine,
    Unknown,
}

impl BlockType {
    pub const fn idx(&self) -> i16 {
        match self {
            BlockType::Text => 0,
            BlockType::Image => 1,
            BlockType::HLine => 2,
            BlockType::VLine => 3,
            BlockType::Unknown => 4,
        }
    }

    pub fn from_idx(idx: i16) -> Self {
        match idx {
            0 => BlockType::Text,
            1 => BlockType::Image,
            2 => BlockType::HLine,
            3 => BlockType::VLine,
            _ => BlockType::Unknown,
        }
    }
}

/// A single recognized word with its geometry and recognizer metadata.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Word {
    pub bbox: Bbox,
    pub text: String,
    pub confidence: f32,
    /// Number of blank cells the recognizer saw before this word.
    pub blanks_before: u32,
    /// Estimated point size derived from the row height.
    pub font_size: f32,
}

impl Word {
    pub fn translate(&mut self, delta: glam::Vec2) {
        self.bbox = self.bbox.translated(delta);
    }
}

/// A recognized text line owning its words.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Line {
    pub bbox: Bbox,
    pub words: Vec<Word>,
}

impl Line {
    pub fn translate(&mut self, delta: glam::Vec2) {
        self.bbox = self.bbox.translated(delta);
        for word in &mut self.words {
            word.translate(delta);
        }
    }
}

/// A recognized paragraph owning its lines.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Paragraph {
    pub bbox: Bbox,
    pub lines: Vec<Line>,
}

impl Paragraph {
    pub fn translate(&mut self, delta: glam::Vec2) {
        self.bbox = self.bbox.translated(delta);
        for line in &mut self.lines {
            line.translate(delta);
        }
    }
}

/// Top level of the OCR result hierarchy attached to a recognized region.
///
/// `tag` and `class` carry the semantic role assigned by layout analysis
/// (`h1`, `figcaption`; `heading`, `flowing`, `pullout`) and drive later
/// export formatting.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Block {
    pub bbox: Bbox,
    pub confidence: f32,
    pub block_type: BlockType,
    pub tag: String,
    pub class: String,
    pub paragraphs: Vec<Paragraph>,
}

impl Block {
    /// Moves every paragraph, line and word by `delta`.
    ///
    /// The block's own bbox moves too, keeping the hierarchy consistent
    /// after a split repositions the result into page coordinates.
    pub fn translate(&mut self, delta: glam::Vec2) {
        self.bbox = self.bbox.translated(delta);
        for paragraph in &mut self.paragraphs {
            paragraph.translate(delta);
        }
    }

    /// Flat list of all words in reading order.
    pub fn words(&self) -> impl Iterator<Item = &Word> {
        self.paragraphs
            .iter()
            .flat_map(|p| p.lines.iter())
            .flat_map(|l| l.words.iter())
    }

    /// Average font size over all words, 0.0 for an empty block.
    pub fn avg_font_size(&self) -> f32 {
        let mut sum = 0.0;
        let mut count = 0usize;
        for word in self.words() {
            sum += word.font_size;
            count += 1;
        }
        if count == 0 { 0.0 } else { sum / count as f32 }
    }

    /// Derives the run-structured document for this block.
    ///
    /// Words become runs (spacing restored from `blanks_before`), lines and
    /// paragraphs keep their structure. With `diagnostics` enabled,
    /// low-confidence words are marked `Uncertain` so a renderer can
    /// highlight them.
    pub fn document(&self, diagnostics: bool) -> TextDocument {
        let font_size = self.avg_font_size();

        let paragraphs = self
            .paragraphs
            .iter()
            .map(|paragraph| TextParagraph {
                lines: paragraph
                    .lines
                    .iter()
                    .map(|line| TextLine {
                        runs: line
                            .words
                            .iter()
                            .map(|word| {
                                let mark = if diagnostics
                                    && word.confidence < DIAGNOSTICS_THRESHOLD
                                {
                                    RepairMark::Uncertain
                                } else {
                                    RepairMark::None
                                };
                                TextRun {
                                    text: word.text.clone(),
                                    format: RunFormat {
                                        font_size: Some(font_size),
                                        mark,
                                    },
                                }
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        TextDocument { paragraphs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn word(text: &str, x: f32, confidence: f32) -> Word {
        Word {
            bbox: Bbox::from_min_size(Vec2::new(x, 0.0), Vec2::new(10.0, 10.0)),
            text: text.into(),
            confidence,
            blanks_before: 1,
            font_size: 9.0,
        }
    }

    fn block_with_words(words: Vec<Word>) -> Block {
        Block {
            bbox: Bbox::from_min_size(Vec2::ZERO, Vec2::new(100.0, 20.0)),
            confidence: 90.0,
            paragraphs: vec![Paragraph {
                bbox: Bbox::from_min_size(Vec2::ZERO, Vec2::new(100.0, 20.0)),
                lines: vec![Line {
                    bbox: Bbox::from_min_size(Vec2::ZERO, Vec2::new(100.0, 10.0)),
                    words,
                }],
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_translate_moves_all_levels() {
        let mut block = block_with_words(vec![word("Hallo", 0.0, 95.0), word("Welt", 20.0, 92.0)]);
        block.translate(Vec2::new(50.0, 100.0));

        assert_eq!(block.bbox.min, Vec2::new(50.0, 100.0));
        assert_eq!(block.paragraphs[0].bbox.min, Vec2::new(50.0, 100.0));
        assert_eq!(block.paragraphs[0].lines[0].bbox.min, Vec2::new(50.0, 100.0));
        assert_eq!(
            block.paragraphs[0].lines[0].words[1].bbox.min,
            Vec2::new(70.0, 100.0)
        );
    }

    #[test]
    fn test_avg_font_size() {
        let mut block = block_with_words(vec![word("a", 0.0, 95.0), word("b", 20.0, 92.0)]);
        block.paragraphs[0].lines[0].words[0].font_size = 8.0;
        block.paragraphs[0].lines[0].words[1].font_size = 12.0;
        assert_eq!(block.avg_font_size(), 10.0);

        let empty = Block::default();
        assert_eq!(empty.avg_font_size(), 0.0);
    }

    #[test]
    fn test_document_derivation() {
        let block = block_with_words(vec![word("Hallo", 0.0, 95.0), word("Welt", 20.0, 40.0)]);

        let doc = block.document(false);
        assert_eq!(doc.to_plain_text(), "Hallo Welt");

        // Diagnostics marks the low-confidence word
        let doc = block.document(true);
        let runs = &doc.paragraphs[0].lines[0].runs;
        assert_eq!(runs[0].format.mark, RepairMark::None);
        assert_eq!(runs[1].format.mark, RepairMark::Uncertain);
    }
}
