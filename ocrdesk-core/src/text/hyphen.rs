use tracing::warn;

use crate::consts::WORD_TRIM_CHARS;
use crate::ocr::engine::Dictionary;

use super::document::{RepairMark, TextDocument, TextLine, TextParagraph, TextRun};

/// Rejoins words split by a line-ending hyphen.
///
/// For every line that is not its paragraph's last, a trailing `-` on the
/// last run triggers a dictionary lookup of last-word + first-word-of-next-
/// line. A confirmed join is emitted as one word marked
/// [`RepairMark::Joined`]; an unconfirmed one keeps the hyphen and is
/// marked [`RepairMark::Uncertain`]. Either way the first word of the
/// following line is consumed. When the consumed word itself ends in a
/// hyphen the join chains onto the next word in the same pass, so no
/// trailing-hyphen trigger survives a repair run. All other runs are
/// copied with redundant whitespace collapsed.
///
/// The input is never mutated. Repaired output contains no trailing
/// hyphens on joined lines, so running repair again is a no-op.
///
/// A language the dictionary cannot serve is not an error: joining is
/// skipped and the normalized document is returned with hyphens intact.
pub fn repair_hyphens(
    document: &TextDocument,
    language: &str,
    dictionary: &dyn Dictionary,
) -> TextDocument {
    if !dictionary.supports(language) {
        warn!(language, "no dictionary for language, skipping hyphen repair");
        return normalize(document);
    }

    TextDocument {
        paragraphs: document
            .paragraphs
            .iter()
            .map(|paragraph| repair_paragraph(paragraph, language, dictionary))
            .collect(),
    }
}

fn repair_paragraph(
    paragraph: &TextParagraph,
    language: &str,
    dictionary: &dyn Dictionary,
) -> TextParagraph {
    let mut lines: Vec<TextLine> = Vec::with_capacity(paragraph.lines.len());
    // Leading words already merged into an earlier line, per source line
    let mut consumed = vec![0usize; paragraph.lines.len()];

    for (index, line) in paragraph.lines.iter().enumerate() {
        let mut runs: Vec<TextRun> = line.runs.iter().filter_map(normalize_run).collect();
        drop_leading_words(&mut runs, consumed[index]);

        // An uncertain join can itself end in a hyphen, so keep chaining
        // until the line no longer carries a trailing-hyphen trigger
        while let Some((source, first_word)) = next_word(paragraph, index + 1, &consumed) {
            let Some(join) = try_join(&runs, &first_word, language, dictionary) else {
                break;
            };
            let Some(hyphen_run) = runs.pop() else {
                break;
            };
            consumed[source] += 1;
            if let Some(prefix) = join.prefix {
                runs.push(TextRun {
                    text: prefix,
                    format: hyphen_run.format,
                });
            }
            let mut format = hyphen_run.format;
            format.mark = join.mark;
            runs.push(TextRun {
                text: join.text,
                format,
            });
        }

        if !runs.is_empty() {
            lines.push(TextLine { runs });
        }
    }

    TextParagraph { lines }
}

fn drop_leading_words(runs: &mut Vec<TextRun>, mut count: usize) {
    while count > 0 {
        let Some(first) = runs.first_mut() else {
            return;
        };
        match first.text.split_once(' ') {
            Some((_, rest)) => first.text = rest.to_string(),
            None => {
                runs.remove(0);
            }
        }
        count -= 1;
    }
}

/// First unconsumed word on or after line `start`, with its line index.
fn next_word(
    paragraph: &TextParagraph,
    start: usize,
    consumed: &[usize],
) -> Option<(usize, String)> {
    for (offset, line) in paragraph.lines[start..].iter().enumerate() {
        let index = start + offset;
        if let Some(word) = line
            .runs
            .iter()
            .flat_map(|run| run.text.split_whitespace())
            .nth(consumed[index])
        {
            return Some((index, word.to_string()));
        }
    }
    None
}

struct Join {
    /// Text of the hyphenated run preceding the joined word, if any.
    prefix: Option<String>,
    text: String,
    mark: RepairMark,
}

fn try_join(
    runs: &[TextRun],
    first_word: &str,
    language: &str,
    dictionary: &dyn Dictionary,
) -> Option<Join> {
    let last = runs.last()?;
    let stem = last.text.strip_suffix('-')?;

    let (prefix, last_word) = match stem.rsplit_once(' ') {
        Some((prefix, word)) => (Some(prefix.to_string()), word),
        None => (None, stem),
    };

    if last_word.is_empty() {
        return None;
    }

    let lookup = trim_for_lookup(&format!("{last_word}{first_word}"));
    let starts_alphabetic = first_word
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic());

    let (text, mark) = if !lookup.is_empty() && starts_alphabetic && dictionary.check(&lookup, language)
    {
        (format!("{last_word}{first_word}"), RepairMark::Joined)
    } else {
        (format!("{last_word}-{first_word}"), RepairMark::Uncertain)
    };

    Some(Join { prefix, text, mark })
}

/// Strips surrounding punctuation and quote characters for lookup only;
/// the emitted text keeps them.
fn trim_for_lookup(word: &str) -> String {
    word.trim_matches(|c: char| WORD_TRIM_CHARS.contains(c))
        .to_string()
}

fn normalize_run(run: &TextRun) -> Option<TextRun> {
    let text = run.text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        None
    } else {
        Some(TextRun {
            text,
            format: run.format,
        })
    }
}

fn normalize(document: &TextDocument) -> TextDocument {
    TextDocument {
        paragraphs: document
            .paragraphs
            .iter()
            .map(|paragraph| TextParagraph {
                lines: paragraph
                    .lines
                    .iter()
                    .map(|line| TextLine {
                        runs: line.runs.iter().filter_map(normalize_run).collect(),
                    })
                    .filter(|line| !line.runs.is_empty())
                    .collect(),
            })
            .collect(),
    }
}
