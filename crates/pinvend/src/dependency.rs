// Copyright 2026 Oxide Computer Company

//! Dependency records.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A specific revision of one importable package.
///
/// Only the import path, comment and revision are persisted. The
/// [`Location`] is filled in while resolving dependencies against a
/// workspace and is never serialized.
///
/// # Examples
///
/// ```
/// use pinvend::Dependency;
///
/// let dep = Dependency::new("example.com/lib", "0123abcd")
///     .with_comment("v1.2.0");
/// assert_eq!(dep.import_path(), "example.com/lib");
/// assert_eq!(dep.comment(), "v1.2.0");
/// assert!(dep.location().is_none());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Dependency {
    import_path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    comment: String,
    rev: String,
    #[serde(skip)]
    location: Option<Location>,
}

// Equality is about what gets persisted: two records for the same import
// path and revision are equal no matter where they were resolved from.
impl PartialEq for Dependency {
    fn eq(&self, other: &Self) -> bool {
        self.import_path == other.import_path
            && self.comment == other.comment
            && self.rev == other.rev
    }
}

impl Eq for Dependency {}

impl Dependency {
    /// Creates a dependency pinned to `rev`, with no comment and no
    /// location.
    pub fn new(import_path: impl Into<String>, rev: impl Into<String>) -> Self {
        Dependency {
            import_path: import_path.into(),
            comment: String::new(),
            rev: rev.into(),
            location: None,
        }
    }

    /// Sets the human-readable description of the revision.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Attaches the on-disk location the dependency was resolved from.
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Returns the import path.
    pub fn import_path(&self) -> &str {
        &self.import_path
    }

    /// Returns the description of the revision, or an empty string.
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Returns the backend-specific revision identifier.
    pub fn rev(&self) -> &str {
        &self.rev
    }

    /// Returns where the dependency was resolved from, if it has been
    /// resolved in this run.
    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    /// Replaces the location.
    pub fn set_location(&mut self, location: Option<Location>) {
        self.location = location;
    }

    /// Returns the repository root import path, if resolved.
    pub fn repo_root(&self) -> Option<&str> {
        self.location.as_ref().map(|l| l.repo_root.as_str())
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.import_path, self.rev)
    }
}

/// Where a dependency lives in the workspace it was resolved from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    workspace: Utf8PathBuf,
    dir: Utf8PathBuf,
    repo_root: String,
}

impl Location {
    /// Creates a new location.
    ///
    /// `workspace` is the workspace root (the directory containing `src`),
    /// `dir` is the package directory, and `repo_root` is the import path
    /// of the repository that owns the package.
    pub fn new(
        workspace: impl Into<Utf8PathBuf>,
        dir: impl Into<Utf8PathBuf>,
        repo_root: impl Into<String>,
    ) -> Self {
        Location {
            workspace: workspace.into(),
            dir: dir.into(),
            repo_root: repo_root.into(),
        }
    }

    /// Returns the workspace root.
    pub fn workspace(&self) -> &Utf8Path {
        &self.workspace
    }

    /// Returns the directory holding the package sources.
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// Returns the import path of the owning repository.
    pub fn repo_root(&self) -> &str {
        &self.repo_root
    }

    /// Returns the directory import paths are resolved against:
    /// `<workspace>/src`.
    pub fn src_root(&self) -> Utf8PathBuf {
        self.workspace.join("src")
    }
}
