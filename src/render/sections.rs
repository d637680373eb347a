//! Section and chunk assembly from classified lines.

use crate::model::{Chunk, ChunkedSection, ClassifiedLine, Section};
use crate::parser::DEFAULT_MAX_WORDS;

/// Builds heading-delimited sections and splits them into chunks.
#[derive(Debug, Clone, Copy)]
pub struct SectionAssembler {
    max_words: usize,
}

impl SectionAssembler {
    /// Create an assembler producing chunks of at most `max_words` words.
    pub fn new(max_words: usize) -> Self {
        Self {
            max_words: max_words.max(1),
        }
    }

    /// Maximum words per chunk.
    pub fn max_words(&self) -> usize {
        self.max_words
    }

    /// Build sections and chunk them. Sections without content are dropped.
    pub fn assemble(&self, lines: &[ClassifiedLine]) -> Vec<ChunkedSection> {
        let sections = self.build_sections(lines);
        let total = sections.len();
        let chunked: Vec<ChunkedSection> = sections
            .iter()
            .filter_map(|section| self.chunk_section(section))
            .collect();

        log::debug!(
            "Assembled {} sections ({} empty dropped) from {} lines",
            chunked.len(),
            total - chunked.len(),
            lines.len()
        );
        chunked
    }

    /// Group classified lines into sections, in `line_index` order.
    pub fn build_sections(&self, lines: &[ClassifiedLine]) -> Vec<Section> {
        let mut ordered: Vec<&ClassifiedLine> = lines.iter().collect();
        ordered.sort_by_key(|l| l.line.line_index);

        let mut sections: Vec<Section> = Vec::new();
        let mut last_was_heading = false;

        for item in ordered {
            let text = item.line.text.trim();
            if text.is_empty() {
                continue;
            }

            if !item.is_heading() {
                if sections.is_empty() {
                    sections.push(Section::new(Section::INTRO));
                }
                if let Some(section) = sections.last_mut() {
                    section.content.push(text.to_string());
                }
                last_was_heading = false;
                continue;
            }

            if is_noise_heading(text) {
                continue;
            }

            let numbered = text.chars().next().map_or(false, char::is_numeric);
            match sections.last_mut() {
                Some(section) if last_was_heading && !numbered => {
                    section.heading.push(' ');
                    section.heading.push_str(text);
                }
                _ => sections.push(Section::new(text)),
            }
            last_was_heading = true;
        }

        sections
    }

    /// Join and chunk one section. Returns `None` when it has no words.
    pub fn chunk_section(&self, section: &Section) -> Option<ChunkedSection> {
        let joined = join_content(&section.content);
        let chunks = chunk_words(&joined, self.max_words);
        if chunks.is_empty() {
            return None;
        }
        Some(ChunkedSection {
            heading: section.heading.clone(),
            chunks,
        })
    }
}

impl Default for SectionAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WORDS)
    }
}

/// A single short word labelled as heading, usually a stray page number.
fn is_noise_heading(text: &str) -> bool {
    text.split_whitespace().count() == 1 && text.chars().count() <= 3
}

/// Join content lines into one string.
///
/// A line ending in `-` loses the hyphen and is glued to the next line;
/// other lines are separated by a single space.
pub fn join_content<S: AsRef<str>>(lines: &[S]) -> String {
    let mut joined = String::new();
    let last = lines.len().saturating_sub(1);

    for (i, line) in lines.iter().enumerate() {
        let line = line.as_ref().trim();
        if line.is_empty() {
            continue;
        }
        if let Some(stem) = line.strip_suffix('-') {
            joined.push_str(stem);
        } else {
            joined.push_str(line);
            if i < last {
                joined.push(' ');
            }
        }
    }

    joined.trim().to_string()
}

/// Split text into consecutive chunks of at most `max_words` words.
pub fn chunk_words(text: &str, max_words: usize) -> Vec<Chunk> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words
        .chunks(max_words.max(1))
        .enumerate()
        .map(|(chunk_id, window)| Chunk {
            chunk_id,
            content: window.join(" "),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Label, Line};

    fn classified(items: &[(&str, Label)]) -> Vec<ClassifiedLine> {
        items
            .iter()
            .enumerate()
            .map(|(i, (text, label))| {
                ClassifiedLine::new(
                    Line::new(*text, i, 0, i as f32 * 15.0, Default::default(), Default::default()),
                    *label,
                )
            })
            .collect()
    }

    use Label::{Heading as H, Paragraph as P};

    #[test]
    fn test_intro_section() {
        let lines = classified(&[("Before any heading.", P), ("Methods", H), ("Body.", P)]);
        let sections = SectionAssembler::default().build_sections(&lines);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].heading, "INTRO");
        assert_eq!(sections[0].content, vec!["Before any heading."]);
        assert_eq!(sections[1].heading, "Methods");
    }

    #[test]
    fn test_consecutive_headings_merge() {
        let lines = classified(&[
            ("Deep Learning for", H),
            ("Document Layout", H),
            ("Body.", P),
            ("2. Methods", H),
            ("Overview", H),
            ("3. Results", H),
        ]);
        let sections = SectionAssembler::default().build_sections(&lines);
        let headings: Vec<_> = sections.iter().map(|s| s.heading.as_str()).collect();
        assert_eq!(
            headings,
            vec!["Deep Learning for Document Layout", "2. Methods Overview", "3. Results"]
        );
    }

    #[test]
    fn test_heading_after_paragraph_starts_section() {
        let lines = classified(&[("Intro", H), ("Body.", P), ("Background", H), ("More.", P)]);
        let sections = SectionAssembler::default().build_sections(&lines);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].heading, "Background");
        assert_eq!(sections[1].content, vec!["More."]);
    }

    #[test]
    fn test_noise_headings_dropped() {
        let lines = classified(&[("Title Here", H), ("12", H), ("ii", H), ("Body.", P)]);
        let sections = SectionAssembler::default().build_sections(&lines);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].heading, "Title Here");
    }

    #[test]
    fn test_lines_sorted_by_index() {
        let mut lines = classified(&[("Heading", H), ("First.", P), ("Second.", P)]);
        lines.reverse();
        let sections = SectionAssembler::default().build_sections(&lines);
        assert_eq!(sections[0].heading, "Heading");
        assert_eq!(sections[0].content, vec!["First.", "Second."]);
    }

    #[test]
    fn test_join_dehyphenates() {
        assert_eq!(join_content(&["complete-", "ly done."]), "completely done.");
        assert_eq!(join_content(&["one", "two", "three"]), "one two three");
        assert_eq!(join_content(&["  spaced  ", "", "out "]), "spaced out");
        assert_eq!(join_content::<&str>(&[]), "");
    }

    #[test]
    fn test_chunking_is_exhaustive() {
        let text = (0..1001).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
        let chunks = chunk_words(&text, 400);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].word_count(), 201);
        let ids: Vec<_> = chunks.iter().map(|c| c.chunk_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);

        let rejoined: Vec<&str> = chunks.iter().flat_map(|c| c.content.split(' ')).collect();
        let original: Vec<&str> = text.split_whitespace().collect();
        assert_eq!(rejoined, original);
    }

    #[test]
    fn test_empty_sections_dropped() {
        let lines = classified(&[("Orphan Heading", H), ("1. Next", H), ("Body text.", P)]);
        let output = SectionAssembler::new(10).assemble(&lines);
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].heading, "1. Next");
        assert_eq!(output[0].chunks[0].content, "Body text.");
    }

    #[test]
    fn test_single_chunk_round_trip() {
        let lines = classified(&[("Notes", H), ("the work is com-", P), ("plete and", P), ("ready.", P)]);
        let output = SectionAssembler::new(100).assemble(&lines);
        assert_eq!(output[0].chunks.len(), 1);
        assert_eq!(output[0].chunks[0].content, "the work is complete and ready.");
    }
}
