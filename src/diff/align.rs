//! Whole-text diff aligner
//!
//! Compares two complete texts line by line and produces the numbered line
//! sequence used by both diff views.

use similar::{Algorithm, DiffOp, TextDiff};

use super::cleanup::{cleanup_semantic, Op, Segment};
use super::model::DiffLine;

/// Diff two whole texts into a numbered line sequence.
///
/// Never fails: any pair of strings produces a result. Unchanged lines come
/// out as `Context`, lines only in `original` as `Delete` and lines only in
/// `modified` as `Insert`.
pub fn compute_whole_text_diff(original: &str, modified: &str) -> Vec<DiffLine> {
    let old_lines = split_lines(original);
    let new_lines = split_lines(modified);

    let segments = diff_segments(&old_lines, &new_lines);
    let segments = cleanup_semantic(segments);

    emit_lines(&segments)
}

/// Split text into line atoms. A trailing newline does not start a new line,
/// so `""` has no lines and `"a\n"` has one.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.split('\n').collect();
    if lines.last() == Some(&"") {
        lines.pop();
    }
    lines
}

fn diff_segments<'a>(old_lines: &[&'a str], new_lines: &[&'a str]) -> Vec<Segment<'a>> {
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_slices(old_lines, new_lines);
    let mut segments = Vec::with_capacity(diff.ops().len());

    for op in diff.ops() {
        match *op {
            DiffOp::Equal { old_index, len, .. } => {
                segments.push(Segment::new(Op::Equal, old_lines[old_index..old_index + len].to_vec()));
            }
            DiffOp::Delete { old_index, old_len, .. } => {
                segments.push(Segment::new(Op::Delete, old_lines[old_index..old_index + old_len].to_vec()));
            }
            DiffOp::Insert { new_index, new_len, .. } => {
                segments.push(Segment::new(Op::Insert, new_lines[new_index..new_index + new_len].to_vec()));
            }
            DiffOp::Replace { old_index, old_len, new_index, new_len } => {
                segments.push(Segment::new(Op::Delete, old_lines[old_index..old_index + old_len].to_vec()));
                segments.push(Segment::new(Op::Insert, new_lines[new_index..new_index + new_len].to_vec()));
            }
        }
    }

    segments
}

/// Number the lines of each segment, threading both counters across the
/// whole script.
fn emit_lines(segments: &[Segment<'_>]) -> Vec<DiffLine> {
    let total = segments.iter().map(|s| s.lines.len()).sum();
    let mut lines = Vec::with_capacity(total);
    let mut original_line = 1usize;
    let mut modified_line = 1usize;

    for segment in segments {
        for text in &segment.lines {
            let content = strip_cr(text);
            match segment.op {
                Op::Equal => {
                    lines.push(DiffLine::context(content, original_line, modified_line));
                    original_line += 1;
                    modified_line += 1;
                }
                Op::Delete => {
                    lines.push(DiffLine::delete(content, original_line));
                    original_line += 1;
                }
                Op::Insert => {
                    lines.push(DiffLine::insert(content, modified_line));
                    modified_line += 1;
                }
            }
        }
    }

    lines
}

fn strip_cr(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}
