//! Non-interactive output: plain text diffs or JSON on stdout

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::app::{compare_repository, load_index, read_compare_input, Target};
use crate::diff::{to_unified_view, DiffLine, DiffSession, DiffStats, DiffViewMode, LineKind, Side};
use crate::git::GitClient;
use crate::ui::truncate_or_pad;

/// Width of split output when stdout is not a terminal
const DEFAULT_WIDTH: usize = 160;

/// Diff of one file, ready for output
pub struct FileDiff {
    pub path: String,
    pub session: DiffSession,
}

#[derive(Serialize)]
struct JsonFile<'a> {
    path: &'a str,
    stats: DiffStats,
    lines: &'a [DiffLine],
}

#[derive(Serialize)]
struct JsonReport<'a> {
    files: Vec<JsonFile<'a>>,
    stats: DiffStats,
}

/// Compute the diffs of every changed file, or of the compared pair
pub fn collect(target: &Target) -> Result<Vec<FileDiff>> {
    match target {
        Target::Repo { path, rev } => {
            let git = GitClient::open(path).with_context(|| format!("Not a git repository: {}", path.display()))?;
            let files = git.changed_files(rev.as_deref())?;
            Ok(files
                .into_iter()
                .map(|f| FileDiff {
                    session: DiffSession::from_unified(git.diff_file(&f.path, rev.as_deref())),
                    path: f.path,
                })
                .collect())
        }
        Target::Compare { original, modified } => {
            let git = compare_repository(modified);
            let original_text = read_compare_input(original, git.as_ref())?;
            let modified_text = read_compare_input(modified, git.as_ref())?;
            Ok(vec![FileDiff {
                path: modified.clone(),
                session: DiffSession::from_texts(original_text, modified_text),
            }])
        }
    }
}

/// Keep only the diff of the file that defines entity `id`
pub fn retain_entity(files: &mut Vec<FileDiff>, target: &Target, id: &str) -> Result<()> {
    let index = match target {
        Target::Repo { path, .. } => {
            let git = GitClient::open(path).with_context(|| format!("Not a git repository: {}", path.display()))?;
            load_index(git.path())
        }
        Target::Compare { .. } => anyhow::bail!("--entity selects within a repository, not a comparison"),
    };
    let record = index
        .find_by_id(id)
        .with_context(|| format!("Unknown entity: {}", id))?;
    files.retain(|f| Path::new(&f.path) == record.path);
    Ok(())
}

/// Width available for split output
pub fn output_width() -> usize {
    crossterm::terminal::size()
        .map(|(w, _)| w as usize)
        .unwrap_or(DEFAULT_WIDTH)
}

pub fn write_text(out: &mut impl Write, files: &[FileDiff], mode: DiffViewMode, width: usize) -> Result<()> {
    for file in files {
        let stats = file.session.stats();
        writeln!(out, "=== {} (+{} -{})", file.path, stats.additions, stats.deletions)?;
        if file.session.lines().is_empty() {
            writeln!(out, "No changes")?;
            continue;
        }
        match mode {
            DiffViewMode::Unified => write_unified(out, to_unified_view(file.session.lines()))?,
            DiffViewMode::Split => write_split(out, &file.session, width)?,
        }
    }
    Ok(())
}

fn number(n: Option<usize>) -> String {
    n.map(|n| format!("{:>4}", n)).unwrap_or_else(|| "    ".to_string())
}

fn write_unified(out: &mut impl Write, lines: &[DiffLine]) -> Result<()> {
    for line in lines {
        if line.kind.is_content() {
            writeln!(
                out,
                "{} {} {}{}",
                number(line.original_line),
                number(line.modified_line),
                line.kind.marker(),
                line.content
            )?;
        } else {
            writeln!(out, "{}", line.content)?;
        }
    }
    Ok(())
}

fn split_cell(line: &DiffLine, side: Side, width: usize) -> String {
    let num = match side {
        Side::Original => line.original_line,
        Side::Modified => line.modified_line,
    };
    let marker = match line.kind {
        LineKind::Blank => ' ',
        kind => kind.marker(),
    };
    let content = format!("{}{}", marker, line.content.replace('\t', "    "));
    format!("{} {}", number(num), truncate_or_pad(&content, width.saturating_sub(5)))
}

fn write_split(out: &mut impl Write, session: &DiffSession, width: usize) -> Result<()> {
    let pane = width.saturating_sub(3) / 2;
    for (left, right) in session.split().rows() {
        if matches!(left.kind, LineKind::Header | LineKind::Meta) {
            writeln!(out, "{}", left.content)?;
            continue;
        }
        let row = format!(
            "{} | {}",
            split_cell(left, Side::Original, pane),
            split_cell(right, Side::Modified, pane)
        );
        writeln!(out, "{}", row.trim_end())?;
    }
    Ok(())
}

pub fn write_json(out: &mut impl Write, files: &[FileDiff]) -> Result<()> {
    let total = files.iter().fold(DiffStats::default(), |mut acc, f| {
        let stats = f.session.stats();
        acc.additions += stats.additions;
        acc.deletions += stats.deletions;
        acc.unchanged += stats.unchanged;
        acc
    });
    let report = JsonReport {
        files: files
            .iter()
            .map(|f| JsonFile {
                path: &f.path,
                stats: f.session.stats(),
                lines: f.session.lines(),
            })
            .collect(),
        stats: total,
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}
