use crossterm::event::KeyEvent;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, StatefulWidget, Widget},
};
use unicode_width::UnicodeWidthStr;

use crate::config::Colors;
use crate::context::{ContextIndex, EntityKind};
use crate::event::KeyInput;
use crate::git::{FileStatus, StatusEntry};

use super::{Action, ScrollState};

/// One row of the file list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: String,
    pub status: FileStatus,
    /// Entity kind, from the index or the file's location under `contexts/`
    pub kind: Option<EntityKind>,
    /// Display title when the file is a loaded context entity
    pub title: Option<String>,
    pub entity_status: Option<String>,
}

/// File list widget state
#[derive(Debug, Default)]
pub struct FileListState {
    pub entries: Vec<FileEntry>,
    pub scroll: ScrollState,
}

impl FileListState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the listed files, keeping the cursor on the same path when it
    /// is still present
    pub fn set_files(&mut self, files: Vec<StatusEntry>, index: &ContextIndex) {
        let previous = self.selected().map(|e| e.path.clone());

        self.entries = files
            .into_iter()
            .map(|f| {
                let record = index.by_path(&f.path);
                FileEntry {
                    kind: record
                        .map(|r| r.entity.kind())
                        .or_else(|| EntityKind::from_path(&f.path)),
                    title: index.title_for(&f.path),
                    entity_status: record.and_then(|r| r.entity.status()).map(str::to_string),
                    path: f.path,
                    status: f.status,
                }
            })
            .collect();
        self.scroll.set_len(self.entries.len());

        if let Some(path) = previous {
            self.select_path(&path);
        }
    }

    pub fn selected(&self) -> Option<&FileEntry> {
        self.entries.get(self.scroll.cursor)
    }

    pub fn select_path(&mut self, path: &str) -> bool {
        match self.entries.iter().position(|e| e.path == path) {
            Some(idx) => {
                self.scroll.cursor = idx;
                true
            }
            None => false,
        }
    }

    pub fn file_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of listed files that are context entities
    pub fn entity_count(&self) -> usize {
        self.entries.iter().filter(|e| e.title.is_some()).count()
    }

    /// Handle key input, return action for App to dispatch
    pub fn handle_key(&mut self, key: &KeyEvent) -> Action {
        let before = self.scroll.cursor;

        if KeyInput::is_down(key) {
            self.scroll.move_down();
        } else if KeyInput::is_up(key) {
            self.scroll.move_up();
        } else if KeyInput::is_fast_down(key) {
            self.scroll.move_down_n(5);
        } else if KeyInput::is_fast_up(key) {
            self.scroll.move_up_n(5);
        } else if KeyInput::is_top(key) {
            self.scroll.go_top();
        } else if KeyInput::is_bottom(key) {
            self.scroll.go_bottom();
        } else if KeyInput::is_enter(key) {
            return match self.selected() {
                Some(entry) => Action::FileSelected(entry.path.clone()),
                None => Action::None,
            };
        } else {
            return Action::Ignored;
        }

        if self.scroll.cursor == before {
            Action::None
        } else {
            Action::SelectionChanged
        }
    }
}

/// File list widget
pub struct FileList<'a> {
    colors: &'a Colors,
    focused: bool,
    title: String,
}

impl<'a> FileList<'a> {
    pub fn new(colors: &'a Colors) -> Self {
        Self {
            colors,
            focused: false,
            title: "Files".to_string(),
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

impl<'a> StatefulWidget for FileList<'a> {
    type State = FileListState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.colors.border_style(self.focused))
            .title(Span::styled(&self.title, self.colors.style_header()));

        let inner = block.inner(area);
        block.render(area, buf);

        if state.entries.is_empty() {
            let line = Line::from(Span::styled("No changed files", self.colors.style_muted()));
            buf.set_line(inner.x, inner.y, &line, inner.width);
            return;
        }

        state.scroll.ensure_visible(inner.height as usize);

        let visible = state
            .entries
            .iter()
            .enumerate()
            .skip(state.scroll.offset)
            .take(inner.height as usize);

        for (i, (idx, entry)) in visible.enumerate() {
            let y = inner.y + i as u16;
            let line = render_entry(entry, idx == state.scroll.cursor, inner.width as usize, self.colors);
            buf.set_line(inner.x, y, &line, inner.width);
        }
    }
}

fn status_style(status: FileStatus, colors: &Colors) -> Style {
    match status {
        FileStatus::Modified => colors.style_modified(),
        FileStatus::Added | FileStatus::Untracked => colors.style_added(),
        FileStatus::Deleted => colors.style_removed(),
        FileStatus::Renamed => Style::reset().fg(colors.renamed),
    }
}

/// `> M [kind] title (status)  path`, with the path alone when the file is
/// no entity
fn render_entry(entry: &FileEntry, selected: bool, width: usize, colors: &Colors) -> Line<'static> {
    let cursor = if selected { ">" } else { " " };
    let mut spans = vec![
        Span::raw(cursor.to_string()),
        Span::styled(format!("{} ", entry.status), status_style(entry.status, colors)),
    ];
    let mut used = 3;

    if let Some(kind) = entry.kind {
        let label = format!("[{}] ", kind);
        used += label.width();
        spans.push(Span::styled(label, colors.style_muted()));
    }

    let name_style = if selected {
        colors.style_selected()
    } else {
        colors.style_text()
    };

    match &entry.title {
        Some(title) => {
            spans.push(Span::styled(title.clone(), name_style.fg(colors.entity)));
            used += title.width();
            if let Some(status) = &entry.entity_status {
                let status = format!(" ({})", status);
                used += status.width();
                spans.push(Span::styled(status, colors.style_muted()));
            }
            if used + 2 < width {
                spans.push(Span::styled(format!("  {}", entry.path), colors.style_muted()));
            }
        }
        None => spans.push(Span::styled(entry.path.clone(), name_style)),
    }

    Line::from(spans)
}
