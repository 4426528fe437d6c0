//! Diff line model shared by the aligner, the unified parser and the views.

use serde::Serialize;

/// Classification of a displayed diff line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    /// Unchanged line, present on both sides
    Context,
    /// Line only in the modified text
    Insert,
    /// Line only in the original text
    Delete,
    /// File or hunk header of a unified diff
    Header,
    /// Notice that is not file content (`\ No newline at end of file`, binary markers)
    Meta,
    /// Placeholder row in one column of a split view
    Blank,
}

impl LineKind {
    /// Marker glyph used by unified rendering
    pub fn marker(&self) -> char {
        match self {
            Self::Insert => '+',
            Self::Delete => '-',
            _ => ' ',
        }
    }

    /// True for lines that carry file content (and therefore line numbers)
    pub fn is_content(&self) -> bool {
        matches!(self, Self::Context | Self::Insert | Self::Delete)
    }
}

/// A single line of a computed or parsed diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffLine {
    pub kind: LineKind,
    /// Line number in the original text, when the line exists there
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_line: Option<usize>,
    /// Line number in the modified text, when the line exists there
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_line: Option<usize>,
    /// Line text without line ending or unified-diff marker
    pub content: String,
}

impl DiffLine {
    pub fn context(content: impl Into<String>, original: usize, modified: usize) -> Self {
        Self {
            kind: LineKind::Context,
            original_line: Some(original),
            modified_line: Some(modified),
            content: content.into(),
        }
    }

    pub fn insert(content: impl Into<String>, modified: usize) -> Self {
        Self {
            kind: LineKind::Insert,
            original_line: None,
            modified_line: Some(modified),
            content: content.into(),
        }
    }

    pub fn delete(content: impl Into<String>, original: usize) -> Self {
        Self {
            kind: LineKind::Delete,
            original_line: Some(original),
            modified_line: None,
            content: content.into(),
        }
    }

    pub fn header(content: impl Into<String>) -> Self {
        Self::unnumbered(LineKind::Header, content)
    }

    pub fn meta(content: impl Into<String>) -> Self {
        Self::unnumbered(LineKind::Meta, content)
    }

    /// Empty placeholder used to pad the opposite column of a split view
    pub fn blank() -> Self {
        Self::unnumbered(LineKind::Blank, String::new())
    }

    fn unnumbered(kind: LineKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            original_line: None,
            modified_line: None,
            content: content.into(),
        }
    }

    /// Line number to report for this line: the modified side when present
    pub fn preferred_line(&self) -> Option<usize> {
        self.modified_line.or(self.original_line)
    }
}

/// Aggregate counts over a diff line sequence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    pub additions: usize,
    pub deletions: usize,
    pub unchanged: usize,
}

impl DiffStats {
    pub fn is_unchanged(&self) -> bool {
        self.additions == 0 && self.deletions == 0
    }
}
