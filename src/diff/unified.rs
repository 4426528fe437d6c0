//! Unified diff parsing
//!
//! Turns unified-diff text (as printed by git) back into numbered
//! `DiffLine`s. Parsing is best effort and never fails: lines that do not
//! fit the format are kept rather than dropped.

use super::model::DiffLine;

/// Text a diff collaborator reports when a file has no changes
pub const NO_CHANGES: &str = "No changes.";

/// Parsed `@@ -a,b +c,d @@ section` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HunkHeader {
    pub old_start: usize,
    pub old_count: usize,
    pub new_start: usize,
    pub new_count: usize,
    /// Text after the closing `@@` (usually the enclosing function or key)
    pub section: Option<String>,
}

/// Parse a hunk header. Counts default to 1 when omitted, as in git output.
pub fn parse_hunk_header(line: &str) -> Option<HunkHeader> {
    let rest = line.strip_prefix("@@ ")?;
    let (ranges, tail) = rest.split_once(" @@")?;

    let mut parts = ranges.split_whitespace();
    let old = parts.next()?.strip_prefix('-')?;
    let new = parts.next()?.strip_prefix('+')?;
    if parts.next().is_some() {
        return None;
    }

    let (old_start, old_count) = parse_range(old)?;
    let (new_start, new_count) = parse_range(new)?;

    let section = tail.trim();
    Some(HunkHeader {
        old_start,
        old_count,
        new_start,
        new_count,
        section: (!section.is_empty()).then(|| section.to_string()),
    })
}

fn parse_range(range: &str) -> Option<(usize, usize)> {
    match range.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}

/// Check if content appears to be binary
pub fn is_binary(content: &str) -> bool {
    // Check first ~8KB for null bytes, but ensure we don't slice mid-character
    content.chars().take(8192).any(|c| c == '\0')
}

/// File-level header lines, recognised outside hunk bodies
fn is_file_header(line: &str) -> bool {
    const PREFIXES: &[&str] = &[
        "diff",
        "index",
        "---",
        "+++",
        "new file",
        "deleted file",
        "old mode",
        "new mode",
        "similarity index",
        "dissimilarity index",
        "rename from",
        "rename to",
        "copy from",
        "copy to",
    ];
    PREFIXES.iter().any(|p| line.starts_with(p))
}

fn is_binary_marker(line: &str) -> bool {
    (line.starts_with("Binary files ") && line.ends_with(" differ")) || line == "GIT binary patch"
}

/// Parse unified-diff text into numbered lines.
///
/// Empty input and the [`NO_CHANGES`] sentinel yield no lines.
pub fn parse_unified_diff(diff_text: &str) -> Vec<DiffLine> {
    let trimmed = diff_text.trim();
    if trimmed.is_empty() || trimmed == NO_CHANGES {
        return Vec::new();
    }

    let mut lines = Vec::new();
    let mut old_line = 0usize;
    let mut new_line = 0usize;
    let mut seen_hunk = false;
    // Lines still expected by the current hunk, per side. While either is
    // non-zero a `---`/`+++` line is content, not a file header.
    let mut remaining_old = 0usize;
    let mut remaining_new = 0usize;

    for line in diff_text.lines() {
        let in_body = remaining_old > 0 || remaining_new > 0;

        if line.starts_with("@@") {
            match parse_hunk_header(line) {
                Some(header) => {
                    old_line = header.old_start;
                    new_line = header.new_start;
                    remaining_old = header.old_count;
                    remaining_new = header.new_count;
                    seen_hunk = true;
                }
                None => log::debug!("malformed hunk header: {}", line),
            }
            lines.push(DiffLine::header(line));
        } else if !in_body && is_file_header(line) {
            lines.push(DiffLine::header(line));
        } else if let Some(content) = line.strip_prefix('+') {
            lines.push(DiffLine::insert(content, new_line));
            new_line += 1;
            remaining_new = remaining_new.saturating_sub(1);
        } else if let Some(content) = line.strip_prefix('-') {
            lines.push(DiffLine::delete(content, old_line));
            old_line += 1;
            remaining_old = remaining_old.saturating_sub(1);
        } else if let Some(content) = line.strip_prefix(' ') {
            lines.push(DiffLine::context(content, old_line, new_line));
            old_line += 1;
            new_line += 1;
            remaining_old = remaining_old.saturating_sub(1);
            remaining_new = remaining_new.saturating_sub(1);
        } else if line.starts_with('\\') || (!in_body && is_binary_marker(line)) {
            lines.push(DiffLine::meta(line));
        } else if seen_hunk {
            // Unexpected format inside a diff: keep it as unchanged text
            lines.push(DiffLine::context(line, old_line, new_line));
            old_line += 1;
            new_line += 1;
            remaining_old = remaining_old.saturating_sub(1);
            remaining_new = remaining_new.saturating_sub(1);
        } else {
            lines.push(DiffLine::meta(line));
        }
    }

    lines
}
