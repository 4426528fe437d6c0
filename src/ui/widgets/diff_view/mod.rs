mod render;

use crossterm::event::KeyEvent;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, StatefulWidget, Widget},
};
use std::collections::HashMap;

use crate::config::Colors;
use crate::diff::{
    side_lines, to_unified_view, DiffLine, DiffSession, DiffSource, DiffViewMode, LineKind, Side, SplitView,
};
use crate::event::KeyInput;
use crate::ui::syntax::{Highlighter, StyledLine};

use super::{Action, ScrollState};
pub use render::truncate_or_pad;
use render::{render_full_width, render_split_row, render_unified_row};

/// Minimum width change to reset a manual mode override
const RESIZE_THRESHOLD: u16 = 4;

/// Diff view widget state. Owns the session of the file on screen.
pub struct DiffViewState {
    path: Option<String>,
    session: DiffSession,
    split: SplitView,
    pub view_mode: DiffViewMode,
    /// User toggled the mode; don't auto-switch until a real resize
    manual_mode: bool,
    last_width: u16,
    split_min_width: u16,
    pub scroll: ScrollState,
    highlighted_left: HashMap<usize, StyledLine>,
    highlighted_right: HashMap<usize, StyledLine>,
}

impl DiffViewState {
    pub fn new(split_min_width: u16) -> Self {
        Self {
            path: None,
            session: DiffSession::default(),
            split: SplitView::default(),
            view_mode: DiffViewMode::default(),
            manual_mode: false,
            last_width: 0,
            split_min_width,
            scroll: ScrollState::new(),
            highlighted_left: HashMap::new(),
            highlighted_right: HashMap::new(),
        }
    }

    /// Pin the view mode, e.g. from a command line flag
    pub fn force_view_mode(&mut self, mode: DiffViewMode) {
        self.view_mode = mode;
        self.manual_mode = true;
    }

    /// Show a unified diff for `path`. Re-showing the same path keeps the
    /// cursor and only recomputes when the diff text changed.
    pub fn show_unified(&mut self, path: impl Into<String>, diff_text: String, highlighter: Option<&Highlighter>) {
        let path = path.into();
        if self.path() == Some(path.as_str()) {
            if matches!(self.session.source(), DiffSource::Unified(text) if *text == diff_text) {
                return;
            }
            self.session.set_unified(diff_text);
        } else {
            self.scroll.reset();
            self.session = DiffSession::from_unified(diff_text);
        }
        self.refresh(path, highlighter);
    }

    /// Show two whole texts for `path`. On the same path only the side that
    /// changed is replaced.
    pub fn show_texts(
        &mut self,
        path: impl Into<String>,
        original: String,
        modified: String,
        highlighter: Option<&Highlighter>,
    ) {
        let path = path.into();
        if self.path() != Some(path.as_str()) {
            self.scroll.reset();
            self.session = DiffSession::from_texts(original, modified);
            self.refresh(path, highlighter);
            return;
        }

        let changed = match self.session.source() {
            DiffSource::Texts { original: o, modified: m } => (*o != original, *m != modified),
            DiffSource::Unified(_) => (true, true),
        };
        match changed {
            (false, false) => return,
            (true, false) => self.session.set_original(original),
            (false, true) => self.session.set_modified(modified),
            (true, true) => self.session = DiffSession::from_texts(original, modified),
        }
        self.refresh(path, highlighter);
    }

    fn refresh(&mut self, path: String, highlighter: Option<&Highlighter>) {
        self.highlighted_left.clear();
        self.highlighted_right.clear();
        if let Some(h) = highlighter {
            self.highlighted_left = highlight_side(h, self.session.lines(), Side::Original, &path);
            self.highlighted_right = highlight_side(h, self.session.lines(), Side::Modified, &path);
        }

        self.split = self.session.split();
        self.path = Some(path);
        self.scroll.set_len(self.session.lines().len());
    }

    pub fn clear(&mut self) {
        self.path = None;
        self.session = DiffSession::default();
        self.split = SplitView::default();
        self.highlighted_left.clear();
        self.highlighted_right.clear();
        self.scroll.set_len(0);
        self.scroll.reset();
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn session(&self) -> &DiffSession {
        &self.session
    }

    pub fn title(&self) -> String {
        self.path.clone().unwrap_or_else(|| "Preview".to_string())
    }

    /// Line number under the cursor, preferring the modified side
    pub fn current_line_number(&self) -> Option<usize> {
        self.session.lines().get(self.scroll.cursor).and_then(DiffLine::preferred_line)
    }

    /// Toggle between split and unified view modes (manual override)
    pub fn toggle_view_mode(&mut self) {
        self.view_mode = self.view_mode.toggle();
        self.manual_mode = true;
    }

    /// Pick the mode from the available width unless the user chose one
    pub fn auto_adjust_view_mode(&mut self, width: u16) {
        if self.manual_mode && self.last_width > 0 && width.abs_diff(self.last_width) >= RESIZE_THRESHOLD {
            self.manual_mode = false;
        }
        self.last_width = width;

        if self.manual_mode {
            return;
        }
        self.view_mode = if width < self.split_min_width {
            DiffViewMode::Unified
        } else {
            DiffViewMode::Split
        };
    }

    /// Move the cursor to the next hunk header
    fn jump_to_next_hunk(&mut self) {
        let lines = self.session.lines();
        if let Some(offset) = lines
            .iter()
            .skip(self.scroll.cursor + 1)
            .position(|l| l.kind == LineKind::Header && l.content.starts_with("@@"))
        {
            self.scroll.move_down_n(offset + 1);
        }
    }

    fn jump_to_prev_hunk(&mut self) {
        let lines = &self.session.lines()[..self.scroll.cursor.min(self.session.lines().len())];
        if let Some(idx) = lines
            .iter()
            .rposition(|l| l.kind == LineKind::Header && l.content.starts_with("@@"))
        {
            self.scroll.cursor = idx;
        }
    }

    /// Handle key input, return action for App to dispatch
    pub fn handle_key(&mut self, key: &KeyEvent) -> Action {
        if KeyInput::is_down(key) {
            self.scroll.move_down();
        } else if KeyInput::is_up(key) {
            self.scroll.move_up();
        } else if KeyInput::is_fast_down(key) {
            self.scroll.move_down_n(5);
        } else if KeyInput::is_fast_up(key) {
            self.scroll.move_up_n(5);
        } else if KeyInput::is_page_down(key) {
            self.scroll.move_down_n(20);
        } else if KeyInput::is_page_up(key) {
            self.scroll.move_up_n(20);
        } else if KeyInput::is_top(key) {
            self.scroll.go_top();
        } else if KeyInput::is_bottom(key) {
            self.scroll.go_bottom();
        } else if KeyInput::is_next_hunk(key) {
            self.jump_to_next_hunk();
        } else if KeyInput::is_prev_hunk(key) {
            self.jump_to_prev_hunk();
        } else {
            return Action::Ignored;
        }
        Action::None
    }
}

/// Highlight the content lines of one side, keyed by line number
fn highlight_side(h: &Highlighter, lines: &[DiffLine], side: Side, path: &str) -> HashMap<usize, StyledLine> {
    let numbered = side_lines(lines, side);
    let texts: Vec<&str> = numbered.iter().map(|(_, text)| *text).collect();
    numbered
        .iter()
        .map(|(n, _)| *n)
        .zip(h.highlight_lines(&texts, path))
        .collect()
}

/// Diff view widget
pub struct DiffView<'a> {
    colors: &'a Colors,
    focused: bool,
}

impl<'a> DiffView<'a> {
    pub fn new(colors: &'a Colors) -> Self {
        Self {
            colors,
            focused: false,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

impl<'a> StatefulWidget for DiffView<'a> {
    type State = DiffViewState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let stats = state.session.stats();
        let inner_height = area.height.saturating_sub(2) as usize;
        state.scroll.ensure_visible(inner_height);
        let scroll_info = state.scroll.scroll_percent(inner_height);

        let mut title = format!("{} [{}]", state.title(), state.view_mode.label());
        if state.path.is_some() && !stats.is_unchanged() {
            title.push_str(&format!(" +{} -{}", stats.additions, stats.deletions));
        }
        if !scroll_info.is_empty() {
            title.push_str(&format!(" \u{2500}\u{2500} {}", scroll_info));
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.colors.border_style(self.focused))
            .title(Span::styled(title, self.colors.style_header()));

        let inner = block.inner(area);
        block.render(area, buf);

        let lines = to_unified_view(state.session.lines());
        let (empty, rows) = match state.view_mode {
            DiffViewMode::Unified => (lines.is_empty(), lines.len()),
            DiffViewMode::Split => (state.split.is_empty(), state.split.len()),
        };
        if empty {
            let (msg, hint) = match state.path {
                None => ("Select a file to view diff", "Press ? for help"),
                Some(_) => ("No changes", ""),
            };
            buf.set_line(inner.x, inner.y, &Line::from(Span::styled(msg, self.colors.style_muted())), inner.width);
            if !hint.is_empty() && inner.height > 2 {
                let hint_line = Line::from(Span::styled(hint, self.colors.style_muted()));
                buf.set_line(inner.x, inner.y + 2, &hint_line, inner.width);
            }
            return;
        }

        let width = inner.width as usize;

        for (i, idx) in (state.scroll.offset..rows).take(inner.height as usize).enumerate() {
            let y = inner.y + i as u16;
            let cursor = self.focused && idx == state.scroll.cursor;
            let line = &lines[idx];

            let rendered = if matches!(line.kind, LineKind::Header | LineKind::Meta) {
                render_full_width(line, cursor, self.colors)
            } else {
                match state.view_mode {
                    DiffViewMode::Unified => {
                        let hl = match line.kind {
                            LineKind::Delete => line.original_line.and_then(|n| state.highlighted_left.get(&n)),
                            _ => line.modified_line.and_then(|n| state.highlighted_right.get(&n)),
                        };
                        render_unified_row(line, hl, width, cursor, self.colors)
                    }
                    DiffViewMode::Split => {
                        let left = &state.split.left[idx];
                        let right = &state.split.right[idx];
                        let left_hl = left.original_line.and_then(|n| state.highlighted_left.get(&n));
                        let right_hl = right.modified_line.and_then(|n| state.highlighted_right.get(&n));
                        render_split_row((left, left_hl), (right, right_hl), width, cursor, self.colors)
                    }
                }
            };

            buf.set_line(inner.x, y, &rendered, inner.width);
        }
    }
}
