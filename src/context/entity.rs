use serde::Deserialize;
use std::fmt;
use std::path::{Component as PathComponent, Path};

/// Kinds of entity stored in a context repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Feature,
    UserStory,
    Spec,
    Task,
    Service,
    Package,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        Self::Feature,
        Self::UserStory,
        Self::Spec,
        Self::Task,
        Self::Service,
        Self::Package,
    ];

    /// Directory under `contexts/` holding this kind
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Feature => "features",
            Self::UserStory => "userstories",
            Self::Spec => "specs",
            Self::Task => "tasks",
            Self::Service => "services",
            Self::Package => "packages",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Feature => "feature",
            Self::UserStory => "story",
            Self::Spec => "spec",
            Self::Task => "task",
            Self::Service => "service",
            Self::Package => "package",
        }
    }

    pub fn from_dir_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.dir_name() == name)
    }

    /// Classify a repository-relative path like `contexts/features/F-001.yaml`
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        if !is_yaml(path) {
            return None;
        }

        let parts: Vec<&str> = path
            .components()
            .filter_map(|c| match c {
                PathComponent::Normal(s) => s.to_str(),
                _ => None,
            })
            .collect();

        match parts.as_slice() {
            ["contexts", dir, _file] => Self::from_dir_name(dir),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

pub(crate) fn is_yaml(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("yaml") | Some("yml"))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Feature {
    pub id: Option<String>,
    pub title: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UserStory {
    pub id: Option<String>,
    pub title: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "asA", alias = "as_a")]
    pub as_a: Option<String>,
    #[serde(rename = "iWant", alias = "i_want")]
    pub i_want: Option<String>,
    #[serde(rename = "soThat", alias = "so_that")]
    pub so_that: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Spec {
    pub id: Option<String>,
    pub title: Option<String>,
    pub status: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Task {
    pub id: Option<String>,
    pub title: Option<String>,
    pub status: Option<String>,
    pub objective: Option<String>,
}

/// Services and packages share one shape
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Component {
    pub id: Option<String>,
    pub title: Option<String>,
    pub status: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// A context entity with the fields its kind defines
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    Feature(Feature),
    UserStory(UserStory),
    Spec(Spec),
    Task(Task),
    Service(Component),
    Package(Component),
}

impl Entity {
    /// Parse one entity document of a known kind
    pub fn parse(kind: EntityKind, yaml: &str) -> Result<Self, serde_yaml::Error> {
        Ok(match kind {
            EntityKind::Feature => Self::Feature(parse_or_default(yaml)?),
            EntityKind::UserStory => Self::UserStory(parse_or_default(yaml)?),
            EntityKind::Spec => Self::Spec(parse_or_default(yaml)?),
            EntityKind::Task => Self::Task(parse_or_default(yaml)?),
            EntityKind::Service => Self::Service(parse_or_default(yaml)?),
            EntityKind::Package => Self::Package(parse_or_default(yaml)?),
        })
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Feature(_) => EntityKind::Feature,
            Self::UserStory(_) => EntityKind::UserStory,
            Self::Spec(_) => EntityKind::Spec,
            Self::Task(_) => EntityKind::Task,
            Self::Service(_) => EntityKind::Service,
            Self::Package(_) => EntityKind::Package,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Feature(e) => e.id.as_deref(),
            Self::UserStory(e) => e.id.as_deref(),
            Self::Spec(e) => e.id.as_deref(),
            Self::Task(e) => e.id.as_deref(),
            Self::Service(e) | Self::Package(e) => e.id.as_deref(),
        }
    }

    pub fn status(&self) -> Option<&str> {
        match self {
            Self::Feature(e) => e.status.as_deref(),
            Self::UserStory(e) => e.status.as_deref(),
            Self::Spec(e) => e.status.as_deref(),
            Self::Task(e) => e.status.as_deref(),
            Self::Service(e) | Self::Package(e) => e.status.as_deref(),
        }
    }

    fn title(&self) -> Option<&str> {
        match self {
            Self::Feature(e) => e.title.as_deref(),
            Self::UserStory(e) => e.title.as_deref(),
            Self::Spec(e) => e.title.as_deref(),
            Self::Task(e) => e.title.as_deref(),
            Self::Service(e) | Self::Package(e) => e.title.as_deref(),
        }
    }

    /// The field a kind uses in place of a title
    fn title_substitute(&self) -> Option<&str> {
        match self {
            Self::UserStory(e) => e.i_want.as_deref(),
            Self::Task(e) => e.objective.as_deref(),
            Self::Service(e) | Self::Package(e) => e.name.as_deref(),
            Self::Feature(_) | Self::Spec(_) => None,
        }
    }

    /// Title shown for this entity: its title, else the kind's substitute
    /// field, else its id
    pub fn display_title(&self) -> String {
        [self.title(), self.title_substitute(), self.id()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("(untitled {})", self.kind()))
    }

    /// True when neither a title nor an objective describes the entity
    pub fn lacks_description(&self) -> bool {
        let objective = match self {
            Self::Task(t) => t.objective.as_deref(),
            _ => None,
        };
        self.title().map_or(true, |t| t.trim().is_empty())
            && objective.map_or(true, |o| o.trim().is_empty())
    }
}

/// Empty documents deserialize to the default record
fn parse_or_default<T: for<'de> Deserialize<'de> + Default>(yaml: &str) -> Result<T, serde_yaml::Error> {
    if yaml.trim().is_empty() {
        return Ok(T::default());
    }
    let value: Option<T> = serde_yaml::from_str(yaml)?;
    Ok(value.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_path_classifies_entity_files() {
        assert_eq!(EntityKind::from_path("contexts/features/F-001.yaml"), Some(EntityKind::Feature));
        assert_eq!(EntityKind::from_path("contexts/userstories/US-1.yml"), Some(EntityKind::UserStory));
        assert_eq!(EntityKind::from_path("contexts/tasks/T-1.yaml"), Some(EntityKind::Task));
        assert_eq!(EntityKind::from_path("contexts/features/F-001.md"), None);
        assert_eq!(EntityKind::from_path("contexts/unknown/X.yaml"), None);
        assert_eq!(EntityKind::from_path("src/features/F.yaml"), None);
        assert_eq!(EntityKind::from_path("contexts/features/nested/F.yaml"), None);
    }

    #[test]
    fn display_title_prefers_title() {
        let entity = Entity::parse(EntityKind::Feature, "id: F-1\ntitle: Login flow\n").unwrap();
        assert_eq!(entity.display_title(), "Login flow");
        assert_eq!(entity.id(), Some("F-1"));
    }

    #[test]
    fn display_title_uses_kind_specific_field() {
        let story = Entity::parse(
            EntityKind::UserStory,
            "id: US-2\nasA: reviewer\niWant: to see diffs side by side\nsoThat: I review faster\n",
        )
        .unwrap();
        assert_eq!(story.display_title(), "to see diffs side by side");

        let task = Entity::parse(EntityKind::Task, "id: T-3\nobjective: Parse hunk headers\n").unwrap();
        assert_eq!(task.display_title(), "Parse hunk headers");

        let service = Entity::parse(EntityKind::Service, "id: S-1\nname: api-gateway\n").unwrap();
        assert_eq!(service.display_title(), "api-gateway");
    }

    #[test]
    fn display_title_falls_back_to_id_then_placeholder() {
        let spec = Entity::parse(EntityKind::Spec, "id: SPEC-9\ntitle: '  '\n").unwrap();
        assert_eq!(spec.display_title(), "SPEC-9");

        let empty = Entity::parse(EntityKind::Package, "").unwrap();
        assert_eq!(empty.display_title(), "(untitled package)");
    }

    #[test]
    fn snake_case_aliases_are_accepted() {
        let story = Entity::parse(EntityKind::UserStory, "i_want: aliases\n").unwrap();
        match story {
            Entity::UserStory(s) => assert_eq!(s.i_want.as_deref(), Some("aliases")),
            other => panic!("unexpected entity: {:?}", other),
        }
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let entity = Entity::parse(EntityKind::Feature, "id: F-1\ntags: [a, b]\nowner: me\n").unwrap();
        assert_eq!(entity.kind(), EntityKind::Feature);
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        assert!(Entity::parse(EntityKind::Feature, "id: [unclosed").is_err());
    }

    #[test]
    fn lacks_description_checks_title_and_objective() {
        let bare = Entity::parse(EntityKind::Task, "id: T-1\n").unwrap();
        assert!(bare.lacks_description());
        let with_objective = Entity::parse(EntityKind::Task, "id: T-1\nobjective: do it\n").unwrap();
        assert!(!with_objective.lacks_description());
    }
}
