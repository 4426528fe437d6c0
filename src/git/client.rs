use anyhow::{Context, Result};
use git2::{DiffFormat, DiffOptions, ErrorCode, Repository, Tree};
use std::path::{Path, PathBuf};

use super::types::*;

/// Git client using libgit2
pub struct GitClient {
    repo: Repository,
    path: PathBuf,
}

impl GitClient {
    /// Open the repository containing `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let repo = Repository::discover(path.as_ref()).context("Failed to open git repository")?;
        let path = repo
            .workdir()
            .map(Path::to_path_buf)
            .context("Bare repositories have no working tree")?;
        log::debug!("opened repository at {}", path.display());
        Ok(Self { repo, path })
    }

    /// Working tree root
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the current branch name
    pub fn current_branch(&self) -> Result<String> {
        match self.repo.head() {
            Ok(head) => Ok(head.shorthand().unwrap_or("HEAD").to_string()),
            // Fresh repository with no commits yet
            Err(e) if e.code() == ErrorCode::UnbornBranch => Ok(self.unborn_branch_name()),
            Err(e) => Err(e).context("Failed to get HEAD"),
        }
    }

    fn unborn_branch_name(&self) -> String {
        self.repo
            .find_reference("HEAD")
            .ok()
            .and_then(|r| r.symbolic_target().map(|t| t.trim_start_matches("refs/heads/").to_string()))
            .unwrap_or_else(|| "HEAD".to_string())
    }

    /// Tree at `rev`, or at HEAD when no revision is given.
    /// An unborn HEAD resolves to no tree.
    fn resolve_tree(&self, rev: Option<&str>) -> Result<Option<Tree<'_>>> {
        match rev {
            Some(rev) => {
                let object = self
                    .repo
                    .revparse_single(rev)
                    .with_context(|| format!("Unknown revision: {}", rev))?;
                let tree = object
                    .peel_to_tree()
                    .with_context(|| format!("Revision has no tree: {}", rev))?;
                Ok(Some(tree))
            }
            None => match self.repo.head() {
                Ok(head) => Ok(Some(head.peel_to_tree()?)),
                Err(e) if e.code() == ErrorCode::UnbornBranch => Ok(None),
                Err(e) => Err(e).context("Failed to get HEAD"),
            },
        }
    }

    fn diff_options(path: Option<&str>) -> DiffOptions {
        let mut opts = DiffOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .show_untracked_content(true);
        if let Some(path) = path {
            opts.pathspec(path).disable_pathspec_match(true);
        }
        opts
    }

    /// Files differing between `rev` (default HEAD) and the working tree,
    /// untracked files included, sorted by path
    pub fn changed_files(&self, rev: Option<&str>) -> Result<Vec<StatusEntry>> {
        let tree = self.resolve_tree(rev)?;
        let mut opts = Self::diff_options(None);
        let diff = self
            .repo
            .diff_tree_to_workdir_with_index(tree.as_ref(), Some(&mut opts))
            .context("Failed to diff working tree")?;

        let mut entries: Vec<StatusEntry> = diff
            .deltas()
            .filter_map(|delta| {
                let status = FileStatus::from_delta(delta.status())?;
                let path = delta
                    .new_file()
                    .path()
                    .or_else(|| delta.old_file().path())?
                    .to_string_lossy()
                    .to_string();
                Some(StatusEntry { path, status })
            })
            .collect();

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        entries.dedup_by(|a, b| a.path == b.path);
        log::debug!("{} changed files against {}", entries.len(), rev.unwrap_or("HEAD"));
        Ok(entries)
    }

    /// Unified diff text of one file against `rev` (default HEAD).
    /// Failures are logged and yield an empty diff.
    pub fn diff_file(&self, path: &str, rev: Option<&str>) -> String {
        match self.try_diff_file(path, rev) {
            Ok(diff) => diff,
            Err(e) => {
                log::warn!("diff failed for {}: {:#}", path, e);
                String::new()
            }
        }
    }

    fn try_diff_file(&self, path: &str, rev: Option<&str>) -> Result<String> {
        let tree = self.resolve_tree(rev)?;
        let mut opts = Self::diff_options(Some(path));
        let diff = self
            .repo
            .diff_tree_to_workdir_with_index(tree.as_ref(), Some(&mut opts))?;
        let result = diff_to_string(&diff)?;

        if result.is_empty() && self.is_untracked(path) {
            return self.format_new_file(path);
        }
        Ok(result)
    }

    fn is_untracked(&self, path: &str) -> bool {
        self.repo
            .status_file(Path::new(path))
            .map(|s| s.is_wt_new())
            .unwrap_or(false)
    }

    fn format_new_file(&self, path: &str) -> Result<String> {
        let content = self.read_file(path)?;
        let lines: Vec<&str> = content.lines().collect();

        let mut result = format!("diff --git a/{} b/{}\n", path, path);
        result.push_str("new file mode 100644\n");
        result.push_str("--- /dev/null\n");
        result.push_str(&format!("+++ b/{}\n", path));
        if lines.is_empty() {
            return Ok(result);
        }

        result.push_str(&format!("@@ -0,0 +1,{} @@\n", lines.len()));
        for line in lines {
            result.push('+');
            result.push_str(line);
            result.push('\n');
        }
        Ok(result)
    }

    /// Read a file from the working tree
    pub fn read_file(&self, path: &str) -> Result<String> {
        let full_path = self.path.join(path);
        std::fs::read_to_string(&full_path).with_context(|| format!("Failed to read file: {}", path))
    }

    /// Read a file as it was at `rev`. Empty when the file did not exist there.
    pub fn read_file_at(&self, rev: &str, path: &str) -> Result<String> {
        let Some(tree) = self.resolve_tree(Some(rev))? else {
            return Ok(String::new());
        };

        let entry = match tree.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(String::new()),
            Err(e) => return Err(e).with_context(|| format!("Failed to look up {} at {}", path, rev)),
        };

        let blob = entry
            .to_object(&self.repo)?
            .peel_to_blob()
            .with_context(|| format!("Not a file at {}: {}", rev, path))?;
        Ok(String::from_utf8_lossy(blob.content()).into_owned())
    }

    /// Line totals of every change against `rev` (default HEAD)
    pub fn repo_stats(&self, rev: Option<&str>) -> Result<RepoStats> {
        let tree = self.resolve_tree(rev)?;
        let mut opts = Self::diff_options(None);
        let diff = self
            .repo
            .diff_tree_to_workdir_with_index(tree.as_ref(), Some(&mut opts))?;
        let stats = diff.stats()?;
        Ok(RepoStats {
            files: stats.files_changed(),
            added: stats.insertions(),
            removed: stats.deletions(),
        })
    }
}

/// Render a libgit2 diff as unified patch text
fn diff_to_string(diff: &git2::Diff) -> Result<String> {
    let mut result = String::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        let content = String::from_utf8_lossy(line.content());
        match line.origin() {
            '+' | '-' | ' ' => {
                result.push(line.origin());
                result.push_str(&content);
            }
            // EOF markers arrive as "\n\\ No newline at end of file\n"
            '=' | '>' | '<' => result.push_str(content.trim_start_matches('\n')),
            // File headers, hunk headers, binary notices
            _ => result.push_str(&content),
        }
        if !result.ends_with('\n') {
            result.push('\n');
        }
        true
    })?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{DiffSession, DiffStats, LineKind};
    use git2::{IndexAddOption, RepositoryInitOptions, Signature};
    use std::fs;

    fn init_repo() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(dir.path(), &opts).unwrap();
        (dir, repo)
    }

    fn commit_all(repo: &Repository, message: &str) {
        let mut index = repo.index().unwrap();
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = Signature::now("Test", "test@example.com").unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents).unwrap();
    }

    fn write(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn branch_of_unborn_and_committed_repo() {
        let (dir, repo) = init_repo();
        let client = GitClient::open(dir.path()).unwrap();
        assert_eq!(client.current_branch().unwrap(), "main");

        write(dir.path(), "a.txt", "a\n");
        commit_all(&repo, "init");
        assert_eq!(client.current_branch().unwrap(), "main");
    }

    #[test]
    fn changed_files_include_untracked_sorted() {
        let (dir, repo) = init_repo();
        write(dir.path(), "contexts/features/F-1.yaml", "id: F-1\n");
        write(dir.path(), "b.txt", "b\n");
        commit_all(&repo, "init");

        write(dir.path(), "contexts/features/F-1.yaml", "id: F-1\ntitle: Login\n");
        write(dir.path(), "a.txt", "new\n");

        let client = GitClient::open(dir.path()).unwrap();
        let files = client.changed_files(None).unwrap();
        assert_eq!(
            files,
            vec![
                StatusEntry { path: "a.txt".into(), status: FileStatus::Untracked },
                StatusEntry { path: "contexts/features/F-1.yaml".into(), status: FileStatus::Modified },
            ]
        );
    }

    #[test]
    fn diff_file_parses_into_lines() {
        let (dir, repo) = init_repo();
        write(dir.path(), "f.yaml", "a: 1\nb: 2\nc: 3\n");
        commit_all(&repo, "init");
        write(dir.path(), "f.yaml", "a: 1\nb: 20\nc: 3\n");

        let client = GitClient::open(dir.path()).unwrap();
        let session = DiffSession::from_unified(client.diff_file("f.yaml", None));

        assert_eq!(session.stats(), DiffStats { additions: 1, deletions: 1, unchanged: 2 });
        let inserted: Vec<_> = session.lines().iter().filter(|l| l.kind == LineKind::Insert).collect();
        assert_eq!(inserted[0].content, "b: 20");
        assert_eq!(inserted[0].modified_line, Some(2));
    }

    #[test]
    fn untracked_file_becomes_new_file_diff() {
        let (dir, repo) = init_repo();
        write(dir.path(), "keep.txt", "k\n");
        commit_all(&repo, "init");
        write(dir.path(), "new.txt", "one\ntwo\n");

        let client = GitClient::open(dir.path()).unwrap();
        let session = DiffSession::from_unified(client.diff_file("new.txt", None));
        assert_eq!(session.stats(), DiffStats { additions: 2, deletions: 0, unchanged: 0 });
    }

    #[test]
    fn missing_trailing_newline_is_a_notice_not_a_line() {
        let (dir, repo) = init_repo();
        write(dir.path(), "F-1.yaml", "id: F-1\ntitle: a");
        commit_all(&repo, "init");
        write(dir.path(), "F-1.yaml", "id: F-1\ntitle: b");

        let client = GitClient::open(dir.path()).unwrap();
        let text = client.diff_file("F-1.yaml", None);
        assert!(!text.contains("\n\n"), "blank line in patch: {:?}", text);

        let session = DiffSession::from_unified(text);
        let lines = session.lines();
        assert_eq!(session.stats(), DiffStats { additions: 1, deletions: 1, unchanged: 1 });
        assert!(!lines.iter().any(|l| l.kind == LineKind::Context && l.content.is_empty()));

        let deleted = lines.iter().find(|l| l.kind == LineKind::Delete).unwrap();
        assert_eq!((deleted.content.as_str(), deleted.original_line), ("title: a", Some(2)));
        let inserted = lines.iter().find(|l| l.kind == LineKind::Insert).unwrap();
        assert_eq!((inserted.content.as_str(), inserted.modified_line), ("title: b", Some(2)));

        let notices = lines
            .iter()
            .filter(|l| l.kind == LineKind::Meta && l.content.contains("No newline"))
            .count();
        assert!(notices >= 1);
    }

    #[test]
    fn unchanged_file_and_bad_rev_yield_empty_diff() {
        let (dir, repo) = init_repo();
        write(dir.path(), "same.txt", "s\n");
        commit_all(&repo, "init");

        let client = GitClient::open(dir.path()).unwrap();
        assert_eq!(client.diff_file("same.txt", None), "");
        assert_eq!(client.diff_file("same.txt", Some("no-such-rev")), "");
    }

    #[test]
    fn diff_against_older_revision() {
        let (dir, repo) = init_repo();
        write(dir.path(), "f.txt", "v1\n");
        commit_all(&repo, "first");
        write(dir.path(), "f.txt", "v2\n");
        commit_all(&repo, "second");

        let client = GitClient::open(dir.path()).unwrap();
        assert_eq!(client.diff_file("f.txt", None), "");
        let session = DiffSession::from_unified(client.diff_file("f.txt", Some("HEAD~1")));
        assert_eq!(session.stats().additions, 1);
        assert_eq!(client.changed_files(Some("HEAD~1")).unwrap().len(), 1);
    }

    #[test]
    fn read_file_at_revision() {
        let (dir, repo) = init_repo();
        write(dir.path(), "f.txt", "committed\n");
        commit_all(&repo, "init");
        write(dir.path(), "f.txt", "working\n");

        let client = GitClient::open(dir.path()).unwrap();
        assert_eq!(client.read_file_at("HEAD", "f.txt").unwrap(), "committed\n");
        assert_eq!(client.read_file("f.txt").unwrap(), "working\n");
        assert_eq!(client.read_file_at("HEAD", "missing.txt").unwrap(), "");
    }

    #[test]
    fn repo_stats_sum_changes() {
        let (dir, repo) = init_repo();
        write(dir.path(), "f.txt", "a\nb\n");
        commit_all(&repo, "init");
        write(dir.path(), "f.txt", "a\nc\nd\n");

        let client = GitClient::open(dir.path()).unwrap();
        let stats = client.repo_stats(None).unwrap();
        assert_eq!(stats, RepoStats { files: 1, added: 2, removed: 1 });
    }
}
