use serde::{Deserialize, Serialize};
use std::fmt;

/// Source position of a parsed node (1-based line and column)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Classification of a single difference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    /// Present only in the new document
    Added,
    /// Present only in the old document
    Deleted,
    /// Scalar text differs
    Modified,
    /// Node kind differs (e.g. scalar became mapping)
    TypeChanged,
}

impl DiffKind {
    pub fn label(&self) -> &'static str {
        match self {
            DiffKind::Added => "added",
            DiffKind::Deleted => "deleted",
            DiffKind::Modified => "modified",
            DiffKind::TypeChanged => "type_changed",
        }
    }

    /// Whether entries of this kind carry an old-side value
    pub fn has_old(&self) -> bool {
        !matches!(self, DiffKind::Added)
    }

    /// Whether entries of this kind carry a new-side value
    pub fn has_new(&self) -> bool {
        !matches!(self, DiffKind::Deleted)
    }
}

impl fmt::Display for DiffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One located change between two documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Difference {
    pub kind: DiffKind,
    /// Canonical address, e.g. "spec.containers[0].image"
    pub path: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    /// Anchor location: the old node for deletions, the new node otherwise
    pub location: Location,
}

impl Difference {
    pub fn added(path: impl Into<String>, new_value: impl Into<String>, location: Location) -> Self {
        Self {
            kind: DiffKind::Added,
            path: path.into(),
            old_value: None,
            new_value: Some(new_value.into()),
            location,
        }
    }

    pub fn deleted(path: impl Into<String>, old_value: impl Into<String>, location: Location) -> Self {
        Self {
            kind: DiffKind::Deleted,
            path: path.into(),
            old_value: Some(old_value.into()),
            new_value: None,
            location,
        }
    }

    pub fn modified(
        path: impl Into<String>,
        old_value: impl Into<String>,
        new_value: impl Into<String>,
        location: Location,
    ) -> Self {
        Self {
            kind: DiffKind::Modified,
            path: path.into(),
            old_value: Some(old_value.into()),
            new_value: Some(new_value.into()),
            location,
        }
    }

    pub fn type_changed(
        path: impl Into<String>,
        old_kind: impl Into<String>,
        new_kind: impl Into<String>,
        location: Location,
    ) -> Self {
        Self {
            kind: DiffKind::TypeChanged,
            path: path.into(),
            old_value: Some(old_kind.into()),
            new_value: Some(new_kind.into()),
            location,
        }
    }
}

/// Normalization settings for one comparison run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareOptions {
    /// Match mapping keys regardless of case
    #[serde(default)]
    pub case_insensitive_keys: bool,

    /// Compare scalar values regardless of case
    #[serde(default)]
    pub case_insensitive_values: bool,

    /// Trim scalar values and collapse inner whitespace runs before comparing
    #[serde(default)]
    pub ignore_whitespace: bool,
}

impl CompareOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ignore_case() -> Self {
        Self {
            case_insensitive_keys: true,
            case_insensitive_values: true,
            ..Default::default()
        }
    }

    pub fn ignore_whitespace() -> Self {
        Self {
            ignore_whitespace: true,
            ..Default::default()
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Compare wide mappings and sequences on worker threads
    #[serde(default)]
    pub parallel: bool,

    /// Disable ANSI colors in terminal output
    #[serde(default)]
    pub no_color: bool,

    /// Enable portable mode (config alongside binary)
    #[serde(default)]
    pub portable_mode: bool,

    /// Default normalization settings, overridden by command-line flags
    #[serde(default)]
    pub compare: CompareOptions,
}
