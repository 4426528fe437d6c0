use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::config::Colors;
use crate::diff::{parse_hunk_header, DiffLine, LineKind, Side};
use crate::ui::syntax::StyledLine;

pub(super) const NUM_WIDTH: usize = 4;
const TAB: &str = "    ";

/// Truncate to `width` display columns (with an ellipsis) or pad with spaces
pub fn truncate_or_pad(s: &str, width: usize) -> String {
    if s.width() <= width {
        let mut padded = s.to_string();
        padded.push_str(&" ".repeat(width - s.width()));
        return padded;
    }

    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    if width > 0 {
        out.push('\u{2026}');
        used += 1;
    }
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

fn number(n: Option<usize>) -> String {
    n.map(|n| format!("{:>width$}", n, width = NUM_WIDTH))
        .unwrap_or_else(|| " ".repeat(NUM_WIDTH))
}

fn with_cursor(style: Style, cursor: bool) -> Style {
    if cursor {
        style.add_modifier(Modifier::REVERSED)
    } else {
        style
    }
}

/// Headers and notices span the full width
pub fn render_full_width(line: &DiffLine, cursor: bool, colors: &Colors) -> Line<'static> {
    if line.kind == LineKind::Header {
        if let Some(hunk) = parse_hunk_header(&line.content) {
            let mut spans = vec![Span::styled(
                format!(
                    "@@ -{},{} +{},{} @@",
                    hunk.old_start, hunk.old_count, hunk.new_start, hunk.new_count
                ),
                with_cursor(colors.style_header(), cursor),
            )];
            if let Some(section) = hunk.section {
                spans.push(Span::styled(format!(" {}", section), with_cursor(colors.style_entity(), cursor)));
            }
            return Line::from(spans);
        }
    }

    let style = match line.kind {
        LineKind::Header => colors.style_header(),
        _ => colors.style_muted(),
    };
    Line::from(Span::styled(line.content.replace('\t', TAB), with_cursor(style, cursor)))
}

/// Content spans clipped and padded to `width`, using syntax colours when
/// available
fn content_spans(
    text: &str,
    highlight: Option<&StyledLine>,
    base: Style,
    bg: Option<Color>,
    width: usize,
    cursor: bool,
) -> Vec<Span<'static>> {
    let apply = |style: Style| {
        let style = match bg {
            Some(bg) => style.bg(bg),
            None => style,
        };
        with_cursor(style, cursor)
    };

    let Some(hl) = highlight else {
        return vec![Span::styled(truncate_or_pad(&text.replace('\t', TAB), width), apply(base))];
    };

    let mut spans = Vec::new();
    let mut used = 0;
    for (fragment, style) in hl {
        let fragment = fragment.replace('\t', TAB);
        let remaining = width.saturating_sub(used);
        if remaining == 0 {
            break;
        }
        let shown = if fragment.width() > remaining {
            truncate_or_pad(&fragment, remaining)
        } else {
            fragment
        };
        used += shown.width();
        spans.push(Span::styled(shown, apply(*style)));
    }
    if used < width {
        spans.push(Span::styled(" ".repeat(width - used), apply(Style::default())));
    }
    spans
}

/// One column of a split row
pub fn render_split_cell(
    line: &DiffLine,
    side: Side,
    highlight: Option<&StyledLine>,
    width: usize,
    cursor: bool,
    colors: &Colors,
) -> Vec<Span<'static>> {
    let content_width = width.saturating_sub(NUM_WIDTH + 1);
    let num = match side {
        Side::Original => line.original_line,
        Side::Modified => line.modified_line,
    };

    let (base, bg) = match line.kind {
        LineKind::Delete => (colors.style_removed(), Some(colors.removed_bg)),
        LineKind::Insert => (colors.style_added(), Some(colors.added_bg)),
        LineKind::Blank => (colors.style_muted(), None),
        _ => (colors.style_text(), None),
    };

    let mut spans = vec![
        Span::styled(number(num), colors.style_muted()),
        Span::styled(" ", colors.style_muted()),
    ];
    spans.extend(content_spans(&line.content, highlight, base, bg, content_width, cursor));
    spans
}

/// A split row: left column, separator, right column
pub fn render_split_row(
    left: (&DiffLine, Option<&StyledLine>),
    right: (&DiffLine, Option<&StyledLine>),
    width: usize,
    cursor: bool,
    colors: &Colors,
) -> Line<'static> {
    let pane_width = width.saturating_sub(3) / 2;
    let mut spans = render_split_cell(left.0, Side::Original, left.1, pane_width, cursor, colors);
    spans.push(Span::styled(" \u{2502} ", colors.style_muted()));
    spans.extend(render_split_cell(right.0, Side::Modified, right.1, pane_width, cursor, colors));
    Line::from(spans)
}

/// A unified row: both line numbers, marker, content
pub fn render_unified_row(
    line: &DiffLine,
    highlight: Option<&StyledLine>,
    width: usize,
    cursor: bool,
    colors: &Colors,
) -> Line<'static> {
    let (base, bg) = match line.kind {
        LineKind::Insert => (colors.style_added(), Some(colors.added_bg)),
        LineKind::Delete => (colors.style_removed(), Some(colors.removed_bg)),
        _ => (colors.style_text(), None),
    };

    let mut spans = vec![
        Span::styled(number(line.original_line), colors.style_muted()),
        Span::styled(" ", colors.style_muted()),
        Span::styled(number(line.modified_line), colors.style_muted()),
        Span::styled(" ", colors.style_muted()),
        Span::styled(line.kind.marker().to_string(), with_cursor(base, cursor)),
    ];
    let content_width = width.saturating_sub(2 * NUM_WIDTH + 3);
    spans.extend(content_spans(&line.content, highlight, base, bg, content_width, cursor));
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn truncate_or_pad_ascii() {
        assert_eq!(truncate_or_pad("abc", 5), "abc  ");
        assert_eq!(truncate_or_pad("abcdef", 4), "abc\u{2026}");
        assert_eq!(truncate_or_pad("abc", 3), "abc");
        assert_eq!(truncate_or_pad("abc", 0), "");
    }

    #[test]
    fn truncate_or_pad_counts_display_width() {
        // Each CJK character is two columns wide
        let out = truncate_or_pad("日本語テキスト", 7);
        assert_eq!(out.width(), 7);
        assert!(out.ends_with('\u{2026}'));
        assert_eq!(truncate_or_pad("日本", 6).width(), 6);
    }

    #[test]
    fn unified_row_shows_numbers_and_marker() {
        let colors = Colors::dark();
        let line = render_unified_row(&DiffLine::insert("x: 1", 12), None, 40, false, &colors);
        let rendered = text(&line);
        assert!(rendered.starts_with("       12 +x: 1"));
        assert_eq!(rendered.width(), 40);
    }

    #[test]
    fn split_row_fills_both_columns() {
        let colors = Colors::dark();
        let left = DiffLine::delete("old", 3);
        let right = DiffLine::blank();
        let line = render_split_row((&left, None), (&right, None), 41, false, &colors);
        let rendered = text(&line);
        assert_eq!(rendered.width(), 41);
        assert!(rendered.starts_with("   3 old"));
        assert!(rendered.contains(" \u{2502} "));
    }

    #[test]
    fn hunk_header_shows_section() {
        let colors = Colors::dark();
        let header = DiffLine::header("@@ -1,2 +1,3 @@ feature:");
        let line = render_full_width(&header, false, &colors);
        assert_eq!(text(&line), "@@ -1,2 +1,3 @@ feature:");
        assert_eq!(line.spans.len(), 2);
    }

    #[test]
    fn highlighted_content_is_clipped() {
        let colors = Colors::dark();
        let hl: StyledLine = vec![
            ("key".to_string(), Style::default()),
            (": a very long value".to_string(), Style::default()),
        ];
        let line = render_unified_row(&DiffLine::context("key: a very long value", 1, 1), Some(&hl), 20, false, &colors);
        assert_eq!(text(&line).width(), 20);
    }
}
