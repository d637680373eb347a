//! Line labels and classified lines.

use serde::{Deserialize, Serialize};

use super::Line;

/// Binary structure label for a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Label {
    /// Section heading
    Heading,
    /// Body text
    Paragraph,
}

impl Label {
    /// All labels in class-index order.
    pub const ALL: [Label; 2] = [Label::Paragraph, Label::Heading];

    /// Class index used by classifier artifacts (`PARAGRAPH = 0`, `HEADING = 1`).
    pub fn index(&self) -> usize {
        match self {
            Label::Paragraph => 0,
            Label::Heading => 1,
        }
    }

    /// Artifact name of the label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Heading => "HEADING",
            Label::Paragraph => "PARAGRAPH",
        }
    }

    /// Parse an artifact label name. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "HEADING" => Some(Label::Heading),
            "PARAGRAPH" => Some(Label::Paragraph),
            _ => None,
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A line together with its predicted label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedLine {
    /// The classified line
    #[serde(flatten)]
    pub line: Line,

    /// Predicted label
    pub label: Label,
}

impl ClassifiedLine {
    /// Pair a line with its label.
    pub fn new(line: Line, label: Label) -> Self {
        Self { line, label }
    }

    /// Check if the line was classified as a heading.
    pub fn is_heading(&self) -> bool {
        self.label == Label::Heading
    }
}
