use std::fmt;

/// File status relative to the compared revision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Modified,
    Added,
    Deleted,
    Renamed,
    Untracked,
}

impl FileStatus {
    pub fn as_char(&self) -> char {
        match self {
            Self::Modified => 'M',
            Self::Added => 'A',
            Self::Deleted => 'D',
            Self::Renamed => 'R',
            Self::Untracked => '?',
        }
    }

    pub(crate) fn from_delta(delta: git2::Delta) -> Option<Self> {
        match delta {
            git2::Delta::Added | git2::Delta::Copied => Some(Self::Added),
            git2::Delta::Deleted => Some(Self::Deleted),
            git2::Delta::Modified | git2::Delta::Typechange => Some(Self::Modified),
            git2::Delta::Renamed => Some(Self::Renamed),
            git2::Delta::Untracked => Some(Self::Untracked),
            _ => None,
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A changed file with its status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub path: String,
    pub status: FileStatus,
}

/// Line totals across every changed file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepoStats {
    pub files: usize,
    pub added: usize,
    pub removed: usize,
}
