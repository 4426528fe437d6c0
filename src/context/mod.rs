//! Context repository model
//!
//! Entities live as one YAML document per file under
//! `contexts/<kind-dir>/`. Files are loaded leniently: a file that fails to
//! parse is logged and skipped so one broken entity does not hide the rest.

mod entity;

pub use entity::{Entity, EntityKind};

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while reading a context repository
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// An entity together with the file it was loaded from
#[derive(Debug, Clone)]
pub struct EntityRecord {
    /// Path relative to the repository root
    pub path: PathBuf,
    pub entity: Entity,
}

/// Loads entities from a repository checkout
pub struct ContextLoader {
    repo_path: PathBuf,
}

impl ContextLoader {
    pub fn new(repo_path: impl AsRef<Path>) -> Self {
        Self {
            repo_path: repo_path.as_ref().to_path_buf(),
        }
    }

    fn contexts_dir(&self) -> PathBuf {
        self.repo_path.join("contexts")
    }

    /// Load every entity, optionally restricted to some kinds.
    /// Records are sorted by path.
    pub fn load_all(&self, include: Option<&[EntityKind]>) -> Result<Vec<EntityRecord>, ContextError> {
        let mut records = Vec::new();

        for kind in EntityKind::ALL {
            if include.is_some_and(|kinds| !kinds.contains(&kind)) {
                continue;
            }

            let dir = self.contexts_dir().join(kind.dir_name());
            if !dir.is_dir() {
                continue;
            }

            let entries = std::fs::read_dir(&dir).map_err(|source| ContextError::Io {
                path: dir.clone(),
                source,
            })?;

            for entry in entries.flatten() {
                let path = entry.path();
                if !path.is_file() || !entity::is_yaml(&path) {
                    continue;
                }
                let relative = path
                    .strip_prefix(&self.repo_path)
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|_| path.clone());

                match self.load_file(kind, &path) {
                    Ok(entity) => records.push(EntityRecord { path: relative, entity }),
                    Err(e) => log::warn!("skipping entity: {}", e),
                }
            }
        }

        records.sort_by(|a, b| a.path.cmp(&b.path));
        log::debug!("loaded {} context entities", records.len());
        Ok(records)
    }

    fn load_file(&self, kind: EntityKind, path: &Path) -> Result<Entity, ContextError> {
        let content = std::fs::read_to_string(path).map_err(|source| ContextError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Entity::parse(kind, &content).map_err(|source| ContextError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load a single entity file by its repository-relative path
    pub fn load_path(&self, relative: impl AsRef<Path>) -> Result<Option<Entity>, ContextError> {
        let relative = relative.as_ref();
        let Some(kind) = EntityKind::from_path(relative) else {
            return Ok(None);
        };
        self.load_file(kind, &self.repo_path.join(relative)).map(Some)
    }
}

/// Lookup of loaded entities by path and id
#[derive(Debug, Default)]
pub struct ContextIndex {
    records: Vec<EntityRecord>,
    by_path: HashMap<PathBuf, usize>,
    by_id: HashMap<String, usize>,
}

impl ContextIndex {
    pub fn new(records: Vec<EntityRecord>) -> Self {
        let mut by_path = HashMap::new();
        let mut by_id = HashMap::new();
        for (i, record) in records.iter().enumerate() {
            by_path.insert(record.path.clone(), i);
            if let Some(id) = record.entity.id() {
                by_id.entry(id.to_string()).or_insert(i);
            }
        }
        Self {
            records,
            by_path,
            by_id,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn by_path(&self, path: impl AsRef<Path>) -> Option<&EntityRecord> {
        self.by_path.get(path.as_ref()).map(|&i| &self.records[i])
    }

    pub fn find_by_id(&self, id: &str) -> Option<&EntityRecord> {
        self.by_id.get(id).map(|&i| &self.records[i])
    }

    /// Title to show for a repository file, when it is a known entity
    pub fn title_for(&self, path: impl AsRef<Path>) -> Option<String> {
        self.by_path(path).map(|r| r.entity.display_title())
    }

    /// Entities missing both a title and an objective
    pub fn identify_gaps(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| r.entity.lacks_description())
            .map(|r| {
                let id = r
                    .entity
                    .id()
                    .map(str::to_string)
                    .unwrap_or_else(|| r.path.display().to_string());
                format!("{}: Missing title/objective", id)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn sample_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "contexts/features/F-001.yaml", "id: F-001\ntitle: Diff viewer\nstatus: active\n");
        write(root, "contexts/userstories/US-001.yaml", "id: US-001\niWant: split view\n");
        write(root, "contexts/tasks/T-001.yml", "id: T-001\n");
        write(root, "contexts/tasks/broken.yaml", "id: [unclosed\n");
        write(root, "contexts/tasks/notes.md", "# not an entity\n");
        write(root, "README.md", "hello\n");
        dir
    }

    #[test]
    fn load_all_reads_every_kind_and_skips_broken_files() {
        let repo = sample_repo();
        let records = ContextLoader::new(repo.path()).load_all(None).unwrap();

        let paths: Vec<String> = records.iter().map(|r| r.path.display().to_string()).collect();
        assert_eq!(
            paths,
            vec![
                "contexts/features/F-001.yaml",
                "contexts/tasks/T-001.yml",
                "contexts/userstories/US-001.yaml",
            ]
        );
    }

    #[test]
    fn load_all_filters_kinds() {
        let repo = sample_repo();
        let records = ContextLoader::new(repo.path())
            .load_all(Some(&[EntityKind::UserStory]))
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].entity.kind(), EntityKind::UserStory);
    }

    #[test]
    fn missing_contexts_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let records = ContextLoader::new(dir.path()).load_all(None).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn load_path_reports_yaml_errors() {
        let repo = sample_repo();
        let loader = ContextLoader::new(repo.path());

        assert!(matches!(
            loader.load_path("contexts/tasks/broken.yaml"),
            Err(ContextError::Yaml { .. })
        ));
        assert!(loader.load_path("README.md").unwrap().is_none());
        let feature = loader.load_path("contexts/features/F-001.yaml").unwrap().unwrap();
        assert_eq!(feature.status(), Some("active"));
    }

    #[test]
    fn index_resolves_titles_and_ids() {
        let repo = sample_repo();
        let index = ContextIndex::new(ContextLoader::new(repo.path()).load_all(None).unwrap());

        assert_eq!(index.len(), 3);
        assert_eq!(index.title_for("contexts/features/F-001.yaml").as_deref(), Some("Diff viewer"));
        assert_eq!(index.title_for("contexts/userstories/US-001.yaml").as_deref(), Some("split view"));
        assert_eq!(index.title_for("README.md"), None);
        assert_eq!(
            index.find_by_id("T-001").map(|r| r.path.display().to_string()).as_deref(),
            Some("contexts/tasks/T-001.yml")
        );
    }

    #[test]
    fn gaps_list_undescribed_entities() {
        let repo = sample_repo();
        let index = ContextIndex::new(ContextLoader::new(repo.path()).load_all(None).unwrap());
        assert_eq!(
            index.identify_gaps(),
            vec!["T-001: Missing title/objective", "US-001: Missing title/objective"]
        );
    }
}
