//! Unified and split view adapters over a diff line sequence

use super::model::{DiffLine, DiffStats, LineKind};

/// Diff view mode: split (side-by-side) or unified (single pane)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffViewMode {
    #[default]
    Split,
    Unified,
}

impl DiffViewMode {
    pub fn toggle(self) -> Self {
        match self {
            Self::Split => Self::Unified,
            Self::Unified => Self::Split,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Split => "split",
            Self::Unified => "unified",
        }
    }
}

/// Two row-aligned columns of a side-by-side diff
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitView {
    pub left: Vec<DiffLine>,
    pub right: Vec<DiffLine>,
}

impl SplitView {
    /// Number of rows (both columns always have the same length)
    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Iterate rows as (left, right) pairs
    pub fn rows(&self) -> impl Iterator<Item = (&DiffLine, &DiffLine)> {
        self.left.iter().zip(self.right.iter())
    }
}

/// Unified mode renders the sequence as-is
pub fn to_unified_view(lines: &[DiffLine]) -> &[DiffLine] {
    lines
}

/// Build the split view: deletions go left and insertions right, with a
/// blank placeholder opposite each. Everything else appears in both columns.
/// Deletions and insertions are not paired onto a shared row.
pub fn to_split_view(lines: &[DiffLine]) -> SplitView {
    let mut left = Vec::with_capacity(lines.len());
    let mut right = Vec::with_capacity(lines.len());

    for line in lines {
        match line.kind {
            LineKind::Delete => {
                left.push(line.clone());
                right.push(DiffLine::blank());
            }
            LineKind::Insert => {
                left.push(DiffLine::blank());
                right.push(line.clone());
            }
            _ => {
                left.push(line.clone());
                right.push(line.clone());
            }
        }
    }

    SplitView { left, right }
}

/// Count additions, deletions and unchanged lines in one pass
pub fn compute_stats(lines: &[DiffLine]) -> DiffStats {
    lines.iter().fold(DiffStats::default(), |mut stats, line| {
        match line.kind {
            LineKind::Insert => stats.additions += 1,
            LineKind::Delete => stats.deletions += 1,
            LineKind::Context => stats.unchanged += 1,
            _ => {}
        }
        stats
    })
}

/// Side of a diff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Original,
    Modified,
}

/// Content lines visible on one side, with their line numbers
pub fn side_lines(lines: &[DiffLine], side: Side) -> Vec<(usize, &str)> {
    lines
        .iter()
        .filter_map(|line| {
            let number = match side {
                Side::Original => line.original_line,
                Side::Modified => line.modified_line,
            }?;
            line.kind.is_content().then_some((number, line.content.as_str()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::align::compute_whole_text_diff;
    use crate::diff::unified::parse_unified_diff;

    #[test]
    fn split_view_pads_opposite_column() {
        let lines = compute_whole_text_diff("a\nb\nc", "a\nx\nc");
        let split = to_split_view(&lines);

        assert_eq!(
            split.left,
            vec![
                DiffLine::context("a", 1, 1),
                DiffLine::delete("b", 2),
                DiffLine::blank(),
                DiffLine::context("c", 3, 3),
            ]
        );
        assert_eq!(
            split.right,
            vec![
                DiffLine::context("a", 1, 1),
                DiffLine::blank(),
                DiffLine::insert("x", 2),
                DiffLine::context("c", 3, 3),
            ]
        );
    }

    #[test]
    fn split_view_columns_have_equal_length() {
        let inputs = [
            parse_unified_diff("diff --git a/x b/x\n@@ -1,3 +1,2 @@\n-a\n-b\n+c\n d\n\\ No newline at end of file"),
            compute_whole_text_diff("", "one\ntwo"),
            compute_whole_text_diff("one\ntwo\nthree", ""),
            Vec::new(),
        ];
        for lines in inputs {
            let split = to_split_view(&lines);
            assert_eq!(split.left.len(), split.right.len());
            assert_eq!(split.len(), lines.len());
        }
    }

    #[test]
    fn headers_appear_in_both_columns() {
        let lines = parse_unified_diff("@@ -1 +1 @@\n-a\n+b");
        let split = to_split_view(&lines);
        let (left, right) = split.rows().next().unwrap();
        assert_eq!(left.kind, LineKind::Header);
        assert_eq!(right.kind, LineKind::Header);
    }

    #[test]
    fn unified_view_is_identity() {
        let lines = compute_whole_text_diff("a", "b");
        assert_eq!(to_unified_view(&lines), lines.as_slice());
    }

    #[test]
    fn stats_ignore_headers_and_meta() {
        let lines = parse_unified_diff("@@ -1,2 +1,2 @@\n a\n-b\n+c\n\\ No newline at end of file");
        let stats = compute_stats(&lines);
        assert_eq!(stats, DiffStats { additions: 1, deletions: 1, unchanged: 1 });
    }

    #[test]
    fn side_lines_follow_each_column() {
        let lines = compute_whole_text_diff("a\nb\nc", "a\nx\nc");
        assert_eq!(side_lines(&lines, Side::Original), vec![(1, "a"), (2, "b"), (3, "c")]);
        assert_eq!(side_lines(&lines, Side::Modified), vec![(1, "a"), (2, "x"), (3, "c")]);
    }

    #[test]
    fn toggle_flips_mode() {
        assert_eq!(DiffViewMode::Split.toggle(), DiffViewMode::Unified);
        assert_eq!(DiffViewMode::Unified.toggle(), DiffViewMode::Split);
    }
}
