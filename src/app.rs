use anyhow::{Context, Result};
use crossterm::event::KeyEvent;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    Frame,
};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::context::{ContextIndex, ContextLoader, EntityRecord};
use crate::diff::DiffViewMode;
use crate::event::KeyInput;
use crate::git::{FileStatus, GitClient, RepoStats, StatusEntry};
use crate::ui::{
    centered_rect, Action, AppLayout, DiffView, DiffViewState, FileList, FileListState, HelpModal, Highlighter,
};

/// Which window is focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedWindow {
    FileList,
    Preview,
}

impl FocusedWindow {
    pub fn toggle(self) -> Self {
        match self {
            Self::FileList => Self::Preview,
            Self::Preview => Self::FileList,
        }
    }
}

/// What a session reviews
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Working tree changes against `rev` (default HEAD)
    Repo { path: PathBuf, rev: Option<String> },
    /// Two files, each a path or `REV:PATH`
    Compare { original: String, modified: String },
}

enum Source {
    Repo { git: GitClient, rev: Option<String> },
    Compare {
        git: Option<GitClient>,
        original: String,
        modified: String,
    },
}

/// Main application state
pub struct App {
    pub running: bool,
    pub config: Config,
    source: Source,

    pub focused: FocusedWindow,
    pub show_help: bool,
    /// Transient message for the status bar
    notice: Option<String>,

    pub branch: String,
    pub repo_stats: RepoStats,
    index: ContextIndex,
    gaps: usize,

    pub file_list_state: FileListState,
    pub diff_view_state: DiffViewState,

    highlighter: Highlighter,
}

impl App {
    /// Start a review session: open the repository, load the context index
    /// and the changed file list
    pub fn open(target: Target, mode: Option<DiffViewMode>, config: Config) -> Result<Self> {
        let source = match target {
            Target::Repo { path, rev } => {
                let git = GitClient::open(&path)
                    .with_context(|| format!("Not a git repository: {}", path.display()))?;
                Source::Repo { git, rev }
            }
            Target::Compare { original, modified } => {
                let git = compare_repository(&modified);
                Source::Compare { git, original, modified }
            }
        };

        let mut diff_view_state = DiffViewState::new(config.layout.split_min_width);
        if let Some(mode) = mode {
            diff_view_state.force_view_mode(mode);
        }
        let highlighter = Highlighter::for_theme(config.theme);

        let mut app = Self {
            running: true,
            config,
            source,
            focused: FocusedWindow::FileList,
            show_help: false,
            notice: None,
            branch: String::new(),
            repo_stats: RepoStats::default(),
            index: ContextIndex::default(),
            gaps: 0,
            file_list_state: FileListState::new(),
            diff_view_state,
            highlighter,
        };

        app.refresh()?;
        Ok(app)
    }

    /// End the session
    pub fn close(&mut self) {
        self.diff_view_state.clear();
        self.file_list_state.set_files(Vec::new(), &ContextIndex::default());
        self.running = false;
        log::debug!("session closed");
    }

    /// Directory the file watcher should observe
    pub fn watch_root(&self) -> PathBuf {
        match &self.source {
            Source::Repo { git, .. } => git.path().to_path_buf(),
            Source::Compare { git: Some(git), .. } => git.path().to_path_buf(),
            Source::Compare { modified, .. } => Path::new(modified)
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf),
        }
    }

    /// Reload everything from git and the context directory
    pub fn refresh(&mut self) -> Result<()> {
        let files = match &self.source {
            Source::Repo { git, rev } => {
                self.branch = git.current_branch().unwrap_or_else(|_| "HEAD".to_string());
                self.repo_stats = git.repo_stats(rev.as_deref()).unwrap_or_else(|e| {
                    log::warn!("failed to compute repository stats: {:#}", e);
                    RepoStats::default()
                });
                self.index = load_index(git.path());
                git.changed_files(rev.as_deref())?
            }
            Source::Compare { git, modified, .. } => {
                self.branch = "compare".to_string();
                self.index = compare_index(git.as_ref(), modified);
                vec![StatusEntry {
                    path: modified.clone(),
                    status: FileStatus::Modified,
                }]
            }
        };

        self.gaps = self.index.identify_gaps().len();
        self.file_list_state.set_files(files, &self.index);
        self.update_preview();
        Ok(())
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        self.notice = None;

        // Help modal takes priority
        if self.show_help {
            if KeyInput::is_help(&key) || KeyInput::is_escape(&key) {
                self.show_help = false;
            }
            return Ok(());
        }

        if KeyInput::is_quit(&key) {
            self.close();
            return Ok(());
        }

        if KeyInput::is_help(&key) {
            self.show_help = true;
            return Ok(());
        }

        if KeyInput::is_refresh(&key) {
            self.refresh()?;
            return Ok(());
        }

        if KeyInput::is_tab(&key) {
            self.focused = self.focused.toggle();
            return Ok(());
        }

        if KeyInput::is_escape(&key) && self.focused == FocusedWindow::Preview {
            self.focused = FocusedWindow::FileList;
            return Ok(());
        }

        if KeyInput::is_toggle_view_mode(&key) {
            self.diff_view_state.toggle_view_mode();
            return Ok(());
        }

        if KeyInput::is_yank(&key) {
            self.yank_location();
            return Ok(());
        }

        let action = match self.focused {
            FocusedWindow::FileList => self.file_list_state.handle_key(&key),
            FocusedWindow::Preview => self.diff_view_state.handle_key(&key),
        };
        self.dispatch(action);
        Ok(())
    }

    fn dispatch(&mut self, action: Action) {
        match action {
            Action::None | Action::Ignored => {}
            Action::SelectionChanged => self.update_preview(),
            Action::FileSelected(_) => self.focused = FocusedWindow::Preview,
        }
    }

    /// Rebuild the diff session of the selected file
    fn update_preview(&mut self) {
        let Some(path) = self.file_list_state.selected().map(|e| e.path.clone()) else {
            self.diff_view_state.clear();
            return;
        };

        let highlighter = Some(&self.highlighter);
        match &self.source {
            Source::Repo { git, rev } => {
                let diff_text = git.diff_file(&path, rev.as_deref());
                self.diff_view_state.show_unified(path, diff_text, highlighter);
            }
            Source::Compare { git, original, modified } => {
                let read = |arg: &str| {
                    read_compare_input(arg, git.as_ref()).unwrap_or_else(|e| {
                        log::warn!("{:#}", e);
                        String::new()
                    })
                };
                self.diff_view_state
                    .show_texts(path, read(original), read(modified), highlighter);
            }
        }
    }

    /// Move the selection to the file defining entity `id`. Returns false
    /// when no changed file defines it.
    pub fn select_entity(&mut self, id: &str) -> bool {
        let Some(path) = self.index.find_by_id(id).map(|r| r.path.to_string_lossy().into_owned()) else {
            self.notice = Some(format!("unknown entity {}", id));
            return false;
        };
        if !self.file_list_state.select_path(&path) {
            self.notice = Some(format!("{} is unchanged", id));
            return false;
        }
        self.update_preview();
        true
    }

    /// `path:line` in the preview, the bare path in the file list
    fn location(&self) -> Option<String> {
        let path = self.file_list_state.selected()?.path.clone();
        if self.focused == FocusedWindow::Preview {
            if let Some(line) = self.diff_view_state.current_line_number() {
                return Some(format!("{}:{}", path, line));
            }
        }
        Some(path)
    }

    fn yank_location(&mut self) {
        let Some(location) = self.location() else {
            return;
        };
        let copied = arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(location.clone()));
        self.notice = Some(match copied {
            Ok(()) => format!("copied {}", location),
            Err(e) => {
                log::warn!("clipboard unavailable: {}", e);
                "clipboard unavailable".to_string()
            }
        });
    }

    /// Render the UI
    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let areas = AppLayout::new(self.config.layout.left_ratio).compute(area);
        self.diff_view_state.auto_adjust_view_mode(area.width);

        let colors = &self.config.colors;
        let file_list = FileList::new(colors)
            .focused(self.focused == FocusedWindow::FileList)
            .title(self.file_list_title());
        frame.render_stateful_widget(file_list, areas.file_list, &mut self.file_list_state);

        let diff_view = DiffView::new(colors).focused(self.focused == FocusedWindow::Preview);
        frame.render_stateful_widget(diff_view, areas.preview, &mut self.diff_view_state);

        self.render_status_bar(frame, areas.status_bar);

        if self.show_help {
            frame.render_widget(HelpModal::new(colors), centered_rect(60, 70, area));
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let style = self.config.colors.style_status_bar();
        let left = self.status_left();
        let right = self.status_right();

        let padding = (area.width as usize).saturating_sub(left.chars().count() + right.chars().count());
        let line = Line::from(vec![
            Span::styled(left, style),
            Span::styled(" ".repeat(padding), style),
            Span::styled(right, style),
        ]);
        frame.render_widget(line, area);
    }

    fn status_left(&self) -> String {
        let mut left = format!(" {}", self.branch);
        if let Source::Repo { rev: Some(rev), .. } = &self.source {
            left.push_str(&format!(" vs {}", rev));
        }
        if self.focused == FocusedWindow::Preview && self.diff_view_state.path().is_some() {
            let stats = self.diff_view_state.session().stats();
            left.push_str(&format!(
                "  file +{} -{} ={}",
                format_count(stats.additions),
                format_count(stats.deletions),
                format_count(stats.unchanged)
            ));
        } else if self.repo_stats.files > 0 {
            left.push_str(&format!(
                "  {} files +{} -{}",
                self.repo_stats.files,
                format_count(self.repo_stats.added),
                format_count(self.repo_stats.removed)
            ));
        }
        if let Some(notice) = &self.notice {
            left.push_str(&format!("  {}", notice));
        }
        left
    }

    fn status_right(&self) -> String {
        let mut right = String::new();
        if !self.index.is_empty() {
            right.push_str(&format!(
                "{}/{} entities  ",
                self.file_list_state.entity_count(),
                self.index.len()
            ));
        }
        if self.gaps > 0 {
            right.push_str(&format!("{} gaps  ", self.gaps));
        }
        right.push_str(&format!("{}  ? help ", self.diff_view_state.view_mode.label()));
        right
    }

    fn file_list_title(&self) -> String {
        match &self.source {
            Source::Repo { .. } => format!("Files ({})", self.file_list_state.file_count()),
            Source::Compare { .. } => "Compare".to_string(),
        }
    }
}

/// Context index of the repository; a broken context directory yields an
/// empty index
pub fn load_index(repo_path: &Path) -> ContextIndex {
    match ContextLoader::new(repo_path).load_all(None) {
        Ok(records) => ContextIndex::new(records),
        Err(e) => {
            log::warn!("failed to load context entities: {}", e);
            ContextIndex::default()
        }
    }
}

/// Index holding the compared file's entity, when the modified side is a
/// context file inside a repository. Keyed by the argument as given so the
/// file list finds it.
fn compare_index(git: Option<&GitClient>, modified: &str) -> ContextIndex {
    let Some(git) = git else {
        return ContextIndex::default();
    };
    let relative = match (Path::new(modified).canonicalize(), git.path().canonicalize()) {
        (Ok(file), Ok(root)) => file.strip_prefix(&root).map(Path::to_path_buf).ok(),
        _ => None,
    };
    let Some(relative) = relative else {
        return ContextIndex::default();
    };

    match ContextLoader::new(git.path()).load_path(&relative) {
        Ok(Some(entity)) => ContextIndex::new(vec![EntityRecord {
            path: PathBuf::from(modified),
            entity,
        }]),
        Ok(None) => ContextIndex::default(),
        Err(e) => {
            log::warn!("skipping entity: {}", e);
            ContextIndex::default()
        }
    }
}

/// Repository next to the modified side of a comparison, if there is one
pub fn compare_repository(modified: &str) -> Option<GitClient> {
    let base = Path::new(modified)
        .parent()
        .filter(|p| p.is_dir())
        .unwrap_or_else(|| Path::new("."));
    GitClient::open(base).ok()
}

/// Text of one `compare` argument: a file on disk, or `REV:PATH` read from
/// the repository
pub fn read_compare_input(arg: &str, git: Option<&GitClient>) -> Result<String> {
    if Path::new(arg).exists() {
        return std::fs::read_to_string(arg).with_context(|| format!("Failed to read file: {}", arg));
    }
    match (arg.split_once(':'), git) {
        (Some((rev, path)), Some(git)) if !rev.is_empty() => git.read_file_at(rev, path),
        _ => anyhow::bail!("No such file: {}", arg),
    }
}

/// Format large numbers with K/M suffixes
fn format_count(n: usize) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 10_000 {
        format!("{}K", n / 1000)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1000.0)
    } else {
        n.to_string()
    }
}
