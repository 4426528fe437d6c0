//! Semantic cleanup of a line-level edit script.
//!
//! The raw script from the diff algorithm is the shortest one, which is not
//! always the one a reader expects: blank separator lines get matched across
//! unrelated rewrites, and an inserted block can be placed one line off from
//! the block boundary. The passes here only move segment boundaries, so both
//! sides of the diff reconstruct exactly as before.

/// Edit operation of a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Equal,
    Delete,
    Insert,
}

/// A run of lines sharing one operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    pub op: Op,
    pub lines: Vec<&'a str>,
}

impl<'a> Segment<'a> {
    pub fn new(op: Op, lines: Vec<&'a str>) -> Self {
        Self { op, lines }
    }
}

/// Run every cleanup pass until the script is stable
pub fn cleanup_semantic(mut segments: Vec<Segment<'_>>) -> Vec<Segment<'_>> {
    merge(&mut segments);
    while eliminate_blank_equality(&mut segments) {
        merge(&mut segments);
    }
    align_boundaries(&mut segments);
    merge(&mut segments);
    segments
}

/// Join adjacent segments of the same kind and order every edit run as
/// deletions followed by insertions. Empty segments are dropped.
pub fn merge(segments: &mut Vec<Segment<'_>>) {
    let mut merged: Vec<Segment<'_>> = Vec::with_capacity(segments.len());
    let mut deleted = Vec::new();
    let mut inserted = Vec::new();

    for segment in segments.drain(..) {
        match segment.op {
            Op::Delete => deleted.extend(segment.lines),
            Op::Insert => inserted.extend(segment.lines),
            Op::Equal => {
                if segment.lines.is_empty() {
                    continue;
                }
                flush_edits(&mut merged, &mut deleted, &mut inserted);
                match merged.last_mut() {
                    Some(last) if last.op == Op::Equal => last.lines.extend(segment.lines),
                    _ => merged.push(segment),
                }
            }
        }
    }
    flush_edits(&mut merged, &mut deleted, &mut inserted);

    *segments = merged;
}

fn flush_edits<'a>(
    merged: &mut Vec<Segment<'a>>,
    deleted: &mut Vec<&'a str>,
    inserted: &mut Vec<&'a str>,
) {
    if !deleted.is_empty() {
        merged.push(Segment::new(Op::Delete, std::mem::take(deleted)));
    }
    if !inserted.is_empty() {
        merged.push(Segment::new(Op::Insert, std::mem::take(inserted)));
    }
}

/// Sizes of the edit run that ends just before (or starts just after) `idx`
fn edit_run(segments: &[Segment<'_>], indices: impl Iterator<Item = usize>) -> (usize, usize) {
    let mut deleted = 0;
    let mut inserted = 0;
    for i in indices {
        match segments[i].op {
            Op::Delete => deleted += segments[i].lines.len(),
            Op::Insert => inserted += segments[i].lines.len(),
            Op::Equal => break,
        }
    }
    (deleted, inserted)
}

/// Turn the first blank-only equality sandwiched between two edit runs, and
/// no longer than either of them, into a deletion plus an insertion.
/// Returns whether anything changed.
fn eliminate_blank_equality(segments: &mut Vec<Segment<'_>>) -> bool {
    for i in 1..segments.len().saturating_sub(1) {
        let segment = &segments[i];
        if segment.op != Op::Equal || !segment.lines.iter().all(|l| is_blank(l)) {
            continue;
        }

        let (del_before, ins_before) = edit_run(segments, (0..i).rev());
        let (del_after, ins_after) = edit_run(segments, i + 1..segments.len());
        let before = del_before.max(ins_before);
        let after = del_after.max(ins_after);
        let len = segment.lines.len();

        if before > 0 && after > 0 && len <= before && len <= after {
            let lines = segments[i].lines.clone();
            segments[i] = Segment::new(Op::Delete, lines.clone());
            segments.insert(i + 1, Segment::new(Op::Insert, lines));
            return true;
        }
    }
    false
}

/// Slide every single-sided edit run to the position where its edges sit on
/// the most natural block boundary. Only strictly better positions are taken.
fn align_boundaries(segments: &mut Vec<Segment<'_>>) {
    let mut i = 0;
    while i < segments.len() {
        if segments[i].op == Op::Equal {
            i += 1;
            continue;
        }

        let has_prev = i > 0;
        let has_next = i + 1 < segments.len();
        // Runs touching another edit (delete+insert pairs) are not shiftable
        if (has_prev && segments[i - 1].op != Op::Equal)
            || (has_next && segments[i + 1].op != Op::Equal)
        {
            i += 1;
            continue;
        }

        let prev: Vec<&str> = if has_prev { segments[i - 1].lines.clone() } else { Vec::new() };
        let next: Vec<&str> = if has_next { segments[i + 1].lines.clone() } else { Vec::new() };
        let n = segments[i].lines.len();

        let mut all = Vec::with_capacity(prev.len() + n + next.len());
        all.extend_from_slice(&prev);
        all.extend_from_slice(&segments[i].lines);
        all.extend_from_slice(&next);

        let original = prev.len();
        let mut lo = original;
        while lo > 0 && all[lo - 1] == all[lo + n - 1] {
            lo -= 1;
        }
        let mut hi = original;
        while hi + n < all.len() && all[hi] == all[hi + n] {
            hi += 1;
        }

        let mut best = original;
        let mut best_score = placement_score(&all, original, n);
        for start in lo..=hi {
            let score = placement_score(&all, start, n);
            if score > best_score {
                best = start;
                best_score = score;
            }
        }

        if best != original {
            let new_prev = all[..best].to_vec();
            let new_edit = all[best..best + n].to_vec();
            let new_next = all[best + n..].to_vec();

            segments[i].lines = new_edit;
            if has_next {
                segments[i + 1].lines = new_next;
            } else if !new_next.is_empty() {
                segments.insert(i + 1, Segment::new(Op::Equal, new_next));
            }
            if has_prev {
                segments[i - 1].lines = new_prev;
            } else if !new_prev.is_empty() {
                segments.insert(i, Segment::new(Op::Equal, new_prev));
                i += 1;
            }
        }

        i += 1;
    }
}

fn placement_score(all: &[&str], start: usize, len: usize) -> u8 {
    let before_start = start.checked_sub(1).map(|i| all[i]);
    let first = all.get(start).copied();
    let last = (start + len).checked_sub(1).map(|i| all[i]);
    let after_end = all.get(start + len).copied();
    boundary_score(before_start, first) + boundary_score(last, after_end)
}

/// How natural a cut between two lines is; edges of the text score highest
fn boundary_score(before: Option<&str>, after: Option<&str>) -> u8 {
    match (before, after) {
        (None, _) | (_, None) => 4,
        (Some(b), _) if is_blank(b) => 3,
        (_, Some(a)) if is_blank(a) => 2,
        (Some(b), Some(a)) if indent(a) < indent(b) => 1,
        _ => 0,
    }
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn indent(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg<'a>(op: Op, lines: &[&'a str]) -> Segment<'a> {
        Segment::new(op, lines.to_vec())
    }

    fn side<'a>(segments: &[Segment<'a>], skip: Op) -> Vec<&'a str> {
        segments
            .iter()
            .filter(|s| s.op != skip)
            .flat_map(|s| s.lines.iter().copied())
            .collect()
    }

    #[test]
    fn merge_orders_deletes_before_inserts() {
        let mut segments = vec![
            seg(Op::Insert, &["x"]),
            seg(Op::Delete, &["a"]),
            seg(Op::Insert, &["y"]),
            seg(Op::Equal, &["b"]),
            seg(Op::Equal, &["c"]),
            seg(Op::Delete, &[]),
        ];
        merge(&mut segments);
        assert_eq!(
            segments,
            vec![
                seg(Op::Delete, &["a"]),
                seg(Op::Insert, &["x", "y"]),
                seg(Op::Equal, &["b", "c"]),
            ]
        );
    }

    #[test]
    fn blank_equality_between_rewrites_is_absorbed() {
        let segments = vec![
            seg(Op::Delete, &["a"]),
            seg(Op::Insert, &["x"]),
            seg(Op::Equal, &[""]),
            seg(Op::Delete, &["b"]),
            seg(Op::Insert, &["y"]),
        ];
        let cleaned = cleanup_semantic(segments);
        assert_eq!(
            cleaned,
            vec![
                seg(Op::Delete, &["a", "", "b"]),
                seg(Op::Insert, &["x", "", "y"]),
            ]
        );
    }

    #[test]
    fn content_equality_is_kept() {
        let segments = vec![
            seg(Op::Delete, &["a"]),
            seg(Op::Equal, &["keep"]),
            seg(Op::Insert, &["y"]),
        ];
        let cleaned = cleanup_semantic(segments.clone());
        assert_eq!(cleaned, segments);
    }

    #[test]
    fn long_blank_equality_is_kept() {
        let segments = vec![
            seg(Op::Delete, &["a"]),
            seg(Op::Equal, &["", ""]),
            seg(Op::Insert, &["y"]),
        ];
        let cleaned = cleanup_semantic(segments.clone());
        assert_eq!(cleaned, segments);
    }

    #[test]
    fn inserted_block_slides_to_block_boundary() {
        let segments = vec![
            seg(Op::Equal, &["a:", "  x"]),
            seg(Op::Insert, &["", "c:", "  z"]),
            seg(Op::Equal, &["", "b:", "  y"]),
        ];
        let cleaned = cleanup_semantic(segments);
        assert_eq!(
            cleaned,
            vec![
                seg(Op::Equal, &["a:", "  x", ""]),
                seg(Op::Insert, &["c:", "  z", ""]),
                seg(Op::Equal, &["b:", "  y"]),
            ]
        );
    }

    #[test]
    fn unshiftable_run_stays_put() {
        let segments = vec![
            seg(Op::Equal, &["a"]),
            seg(Op::Delete, &["b"]),
            seg(Op::Equal, &["c"]),
        ];
        assert_eq!(cleanup_semantic(segments.clone()), segments);
    }

    #[test]
    fn cleanup_preserves_both_sides() {
        let segments = vec![
            seg(Op::Equal, &["top", ""]),
            seg(Op::Delete, &["one"]),
            seg(Op::Insert, &["uno"]),
            seg(Op::Equal, &[""]),
            seg(Op::Delete, &["two"]),
            seg(Op::Insert, &["dos", ""]),
            seg(Op::Equal, &["tail"]),
        ];
        let original = side(&segments, Op::Insert);
        let modified = side(&segments, Op::Delete);

        let cleaned = cleanup_semantic(segments);
        assert_eq!(side(&cleaned, Op::Insert), original);
        assert_eq!(side(&cleaned, Op::Delete), modified);
    }
}
