use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, DebouncedEventKind, Debouncer};
use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Application events
#[derive(Debug, Clone)]
pub enum AppEvent {
    Key(KeyEvent),
    /// Terminal was resized
    Resize,
    /// A relevant file in the repository changed
    FileChanged,
    Tick,
}

/// Terminal input and file watcher events, delivered on one channel
pub struct EventHandler {
    rx: mpsc::Receiver<AppEvent>,
    _watcher: Option<Debouncer<RecommendedWatcher>>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration, debounce: Duration, repo_dir: &Path) -> Self {
        let (tx, rx) = mpsc::channel();
        let watcher = setup_watcher(repo_dir, debounce, tx.clone());

        thread::spawn(move || loop {
            let event = if event::poll(tick_rate).unwrap_or(false) {
                match event::read() {
                    Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => AppEvent::Key(key),
                    Ok(Event::Resize(..)) => AppEvent::Resize,
                    _ => continue,
                }
            } else {
                AppEvent::Tick
            };
            if tx.send(event).is_err() {
                break;
            }
        });

        Self { rx, _watcher: watcher }
    }

    /// Get the next event (blocking)
    pub fn next(&self) -> Result<AppEvent> {
        Ok(self.rx.recv()?)
    }

    /// Get a queued event without blocking
    pub fn try_next(&self) -> Option<AppEvent> {
        self.rx.try_recv().ok()
    }
}

fn setup_watcher(
    repo_dir: &Path,
    debounce: Duration,
    tx: mpsc::Sender<AppEvent>,
) -> Option<Debouncer<RecommendedWatcher>> {
    let repo_path = repo_dir.to_path_buf();

    let mut builder = GitignoreBuilder::new(&repo_path);
    let gitignore_path = repo_path.join(".gitignore");
    if gitignore_path.exists() {
        if let Some(e) = builder.add(&gitignore_path) {
            log::warn!("ignoring unreadable .gitignore: {}", e);
        }
    }
    let gitignore = builder.build().ok();

    let debouncer = new_debouncer(debounce, move |res: DebounceEventResult| {
        let events = match res {
            Ok(events) => events,
            Err(e) => {
                log::warn!("file watcher error: {:?}", e);
                return;
            }
        };
        let changed = events.iter().any(|event| {
            matches!(event.kind, DebouncedEventKind::Any)
                && event
                    .path
                    .strip_prefix(&repo_path)
                    .is_ok_and(|rel| is_relevant_change(rel, event.path.is_dir(), gitignore.as_ref()))
        });
        if changed {
            let _ = tx.send(AppEvent::FileChanged);
        }
    });

    let mut debouncer = match debouncer {
        Ok(d) => d,
        Err(e) => {
            log::warn!("file watcher unavailable: {}", e);
            return None;
        }
    };
    if let Err(e) = debouncer.watcher().watch(repo_dir, RecursiveMode::Recursive) {
        log::warn!("cannot watch {}: {}", repo_dir.display(), e);
        return None;
    }
    Some(debouncer)
}

/// Changes inside `.git` only matter for the index and HEAD; everything
/// else counts unless gitignored
fn is_relevant_change(rel_path: &Path, is_dir: bool, gitignore: Option<&Gitignore>) -> bool {
    if let Ok(inside_git) = rel_path.strip_prefix(".git") {
        return inside_git == Path::new("index") || inside_git == Path::new("HEAD");
    }
    !gitignore.is_some_and(|gi| gi.matched_path_or_any_parents(rel_path, is_dir).is_ignore())
}

/// Key input helper
pub struct KeyInput;

impl KeyInput {
    pub fn is_quit(key: &KeyEvent) -> bool {
        matches!(
            key,
            KeyEvent {
                code: KeyCode::Char('q'),
                modifiers: KeyModifiers::NONE,
                ..
            } | KeyEvent {
                code: KeyCode::Char('c'),
                modifiers: KeyModifiers::CONTROL,
                ..
            }
        )
    }

    pub fn is_down(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::Char('j') | KeyCode::Down) && key.modifiers == KeyModifiers::NONE
    }

    pub fn is_up(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::Char('k') | KeyCode::Up) && key.modifiers == KeyModifiers::NONE
    }

    pub fn is_fast_down(key: &KeyEvent) -> bool {
        key.code == KeyCode::Char('J')
    }

    pub fn is_fast_up(key: &KeyEvent) -> bool {
        key.code == KeyCode::Char('K')
    }

    pub fn is_tab(key: &KeyEvent) -> bool {
        key.code == KeyCode::Tab && key.modifiers == KeyModifiers::NONE
    }

    pub fn is_page_down(key: &KeyEvent) -> bool {
        (key.code == KeyCode::Char('d') && key.modifiers == KeyModifiers::CONTROL)
            || key.code == KeyCode::PageDown
    }

    pub fn is_page_up(key: &KeyEvent) -> bool {
        (key.code == KeyCode::Char('u') && key.modifiers == KeyModifiers::CONTROL)
            || key.code == KeyCode::PageUp
    }

    pub fn is_top(key: &KeyEvent) -> bool {
        key.code == KeyCode::Char('g') && key.modifiers == KeyModifiers::NONE
    }

    pub fn is_bottom(key: &KeyEvent) -> bool {
        key.code == KeyCode::Char('G')
    }

    pub fn is_enter(key: &KeyEvent) -> bool {
        key.code == KeyCode::Enter
    }

    pub fn is_escape(key: &KeyEvent) -> bool {
        key.code == KeyCode::Esc
    }

    pub fn is_help(key: &KeyEvent) -> bool {
        key.code == KeyCode::Char('?')
    }

    pub fn is_yank(key: &KeyEvent) -> bool {
        key.code == KeyCode::Char('y') && key.modifiers == KeyModifiers::NONE
    }

    pub fn is_refresh(key: &KeyEvent) -> bool {
        key.code == KeyCode::Char('r') && key.modifiers == KeyModifiers::NONE
    }

    pub fn is_next_hunk(key: &KeyEvent) -> bool {
        key.code == KeyCode::Char(']')
    }

    pub fn is_prev_hunk(key: &KeyEvent) -> bool {
        key.code == KeyCode::Char('[')
    }

    pub fn is_toggle_view_mode(key: &KeyEvent) -> bool {
        key.code == KeyCode::Char('s') && key.modifiers == KeyModifiers::NONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn quit_keys() {
        assert!(KeyInput::is_quit(&key(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(KeyInput::is_quit(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!KeyInput::is_quit(&key(KeyCode::Char('c'), KeyModifiers::NONE)));
    }

    #[test]
    fn shifted_letters_match_with_or_without_modifier() {
        assert!(KeyInput::is_bottom(&key(KeyCode::Char('G'), KeyModifiers::SHIFT)));
        assert!(KeyInput::is_bottom(&key(KeyCode::Char('G'), KeyModifiers::NONE)));
        assert!(KeyInput::is_fast_down(&key(KeyCode::Char('J'), KeyModifiers::SHIFT)));
        assert!(!KeyInput::is_down(&key(KeyCode::Char('J'), KeyModifiers::SHIFT)));
    }

    #[test]
    fn page_keys() {
        assert!(KeyInput::is_page_down(&key(KeyCode::Char('d'), KeyModifiers::CONTROL)));
        assert!(!KeyInput::is_page_down(&key(KeyCode::Char('d'), KeyModifiers::NONE)));
        assert!(KeyInput::is_page_up(&key(KeyCode::PageUp, KeyModifiers::NONE)));
    }

    #[test]
    fn git_internals_are_filtered() {
        assert!(is_relevant_change(Path::new(".git/index"), false, None));
        assert!(is_relevant_change(Path::new(".git/HEAD"), false, None));
        assert!(!is_relevant_change(Path::new(".git/objects/ab/cdef"), false, None));
        assert!(!is_relevant_change(Path::new(".git/index.lock"), false, None));
        assert!(is_relevant_change(Path::new("contexts/features/F-1.yaml"), false, None));
    }

    #[test]
    fn gitignored_paths_are_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = GitignoreBuilder::new(dir.path());
        builder.add_line(None, "target/").unwrap();
        builder.add_line(None, "*.log").unwrap();
        let gitignore = builder.build().unwrap();

        assert!(!is_relevant_change(Path::new("target/debug/app"), false, Some(&gitignore)));
        assert!(!is_relevant_change(Path::new("ctxdiff.log"), false, Some(&gitignore)));
        assert!(is_relevant_change(Path::new("src/main.rs"), false, Some(&gitignore)));
    }
}
