use super::align::compute_whole_text_diff;
use super::model::{DiffLine, DiffStats};
use super::unified::{is_binary, parse_unified_diff};
use super::view::{compute_stats, to_split_view, SplitView};

/// Where a session's lines come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffSource {
    /// Two whole texts, aligned locally
    Texts { original: String, modified: String },
    /// Pre-computed unified diff text
    Unified(String),
}

impl Default for DiffSource {
    fn default() -> Self {
        Self::Unified(String::new())
    }
}

/// Derived state of one open diff view.
///
/// Lines and stats are recomputed whenever an input changes; nothing is
/// shared between sessions.
#[derive(Debug, Clone, Default)]
pub struct DiffSession {
    source: DiffSource,
    lines: Vec<DiffLine>,
    stats: DiffStats,
}

impl DiffSession {
    pub fn from_texts(original: impl Into<String>, modified: impl Into<String>) -> Self {
        Self::from_source(DiffSource::Texts {
            original: original.into(),
            modified: modified.into(),
        })
    }

    pub fn from_unified(diff_text: impl Into<String>) -> Self {
        Self::from_source(DiffSource::Unified(diff_text.into()))
    }

    pub fn from_source(source: DiffSource) -> Self {
        let mut session = Self {
            source,
            ..Self::default()
        };
        session.recompute();
        session
    }

    pub fn source(&self) -> &DiffSource {
        &self.source
    }

    pub fn lines(&self) -> &[DiffLine] {
        &self.lines
    }

    pub fn stats(&self) -> DiffStats {
        self.stats
    }

    pub fn split(&self) -> SplitView {
        to_split_view(&self.lines)
    }

    /// Replace the original text. A unified session becomes a text session
    /// with an empty modified side.
    pub fn set_original(&mut self, text: impl Into<String>) {
        let text = text.into();
        match &mut self.source {
            DiffSource::Texts { original, .. } => *original = text,
            DiffSource::Unified(_) => {
                self.source = DiffSource::Texts {
                    original: text,
                    modified: String::new(),
                }
            }
        }
        self.recompute();
    }

    /// Replace the modified text. A unified session becomes a text session
    /// with an empty original side.
    pub fn set_modified(&mut self, text: impl Into<String>) {
        let text = text.into();
        match &mut self.source {
            DiffSource::Texts { modified, .. } => *modified = text,
            DiffSource::Unified(_) => {
                self.source = DiffSource::Texts {
                    original: String::new(),
                    modified: text,
                }
            }
        }
        self.recompute();
    }

    pub fn set_unified(&mut self, diff_text: impl Into<String>) {
        self.source = DiffSource::Unified(diff_text.into());
        self.recompute();
    }

    fn recompute(&mut self) {
        self.lines = match &self.source {
            DiffSource::Texts { original, modified } => {
                if is_binary(original) || is_binary(modified) {
                    vec![DiffLine::meta("Binary file")]
                } else {
                    compute_whole_text_diff(original, modified)
                }
            }
            DiffSource::Unified(text) => {
                if is_binary(text) {
                    vec![DiffLine::meta("Binary file")]
                } else {
                    parse_unified_diff(text)
                }
            }
        };
        self.stats = compute_stats(&self.lines);
        log::debug!(
            "diff session recomputed: {} lines (+{} -{})",
            self.lines.len(),
            self.stats.additions,
            self.stats.deletions
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::model::LineKind;

    #[test]
    fn text_session_tracks_stats() {
        let session = DiffSession::from_texts("a\nb\nc", "a\nx\nc");
        assert_eq!(session.lines().len(), 4);
        assert_eq!(
            session.stats(),
            DiffStats { additions: 1, deletions: 1, unchanged: 2 }
        );
    }

    #[test]
    fn changing_an_input_recomputes() {
        let mut session = DiffSession::from_texts("a\nb", "a\nb");
        assert!(session.stats().is_unchanged());

        session.set_modified("a\nb\nc");
        assert_eq!(session.stats().additions, 1);

        session.set_original("");
        assert_eq!(session.stats().additions, 3);
        assert_eq!(session.stats().unchanged, 0);
    }

    #[test]
    fn unified_session_parses_text() {
        let mut session = DiffSession::from_unified("@@ -1 +1 @@\n-a\n+b");
        assert_eq!(session.stats(), DiffStats { additions: 1, deletions: 1, unchanged: 0 });

        session.set_unified("No changes.");
        assert!(session.lines().is_empty());
        assert!(session.split().is_empty());
    }

    #[test]
    fn setting_text_on_unified_session_switches_source() {
        let mut session = DiffSession::from_unified("");
        session.set_modified("new");
        assert_eq!(
            session.source(),
            &DiffSource::Texts { original: String::new(), modified: "new".to_string() }
        );
        assert_eq!(session.lines()[0], DiffLine::insert("new", 1));
    }

    #[test]
    fn binary_input_becomes_single_notice() {
        let session = DiffSession::from_texts("\0\u{1}", "text");
        assert_eq!(session.lines().len(), 1);
        assert_eq!(session.lines()[0].kind, LineKind::Meta);
        assert_eq!(session.stats(), DiffStats::default());
    }

    #[test]
    fn sessions_are_independent() {
        let a = DiffSession::from_texts("x", "y");
        let b = DiffSession::from_texts("x", "x");
        assert_eq!(a.stats().additions, 1);
        assert_eq!(b.stats().additions, 0);
    }
}
