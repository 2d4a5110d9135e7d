use serde::{Deserialize, Serialize};

/// Visual marker attached to a run by hyphenation repair or diagnostics.
///
/// `Joined` flags a silently repaired word (dictionary confirmed the
/// join), `Uncertain` flags text a reader should double-check: an
/// unconfirmed hyphen join or a low-confidence word.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepairMark {
    #[default]
    None,
    Joined,
    Uncertain,
}

/// Character formatting carried by a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunFormat {
    pub font_size: Option<f32>,
    pub mark: RepairMark,
}

/// A stretch of text sharing one format.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub format: RunFormat,
}

impl TextRun {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: RunFormat::default(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub runs: Vec<TextRun>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TextParagraph {
    pub lines: Vec<TextLine>,
}

/// The run-structured document operated on by hyphenation repair.
///
/// Ordered paragraphs of ordered lines of formatted runs. Derived from a
/// region's recognized `Block` but independent of it; exporters consume
/// this form.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TextDocument {
    pub paragraphs: Vec<TextParagraph>,
}

impl TextDocument {
    /// Builds a document with a single unformatted run per line.
    ///
    /// Paragraphs are slices of line strings; mostly a test convenience.
    pub fn from_lines(paragraphs: &[&[&str]]) -> Self {
        Self {
            paragraphs: paragraphs
                .iter()
                .map(|lines| TextParagraph {
                    lines: lines
                        .iter()
                        .map(|line| TextLine {
                            runs: vec![TextRun::new(*line)],
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    /// Renders the document as plain text.
    ///
    /// Runs are whitespace-normalized and joined with single spaces, line
    /// boundaries become a single line break, paragraph boundaries a
    /// double one.
    pub fn to_plain_text(&self) -> String {
        let paragraphs: Vec<String> = self
            .paragraphs
            .iter()
            .map(|paragraph| {
                let lines: Vec<String> = paragraph
                    .lines
                    .iter()
                    .map(|line| {
                        line.runs
                            .iter()
                            .flat_map(|run| run.text.split_whitespace())
                            .collect::<Vec<_>>()
                            .join(" ")
                    })
                    .filter(|line| !line.is_empty())
                    .collect();
                lines.join("\n")
            })
            .collect();

        paragraphs.join("\n\n")
    }
}
