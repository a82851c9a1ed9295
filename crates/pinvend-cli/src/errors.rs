// Copyright 2026 Oxide Computer Company

//! Error types for listing packages, resolving dependencies and running
//! the `save` and `update` operations.

use camino::Utf8PathBuf;
use pinvend::{ConflictError, ManifestError};
use pinvend_vcs::{CommandError, SyncError, VcsDetectError, VcsEnvError};
use std::io;
use thiserror::Error;

/// An error from the package lister as a whole, as opposed to an error for
/// one package.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ListError {
    /// Failed to spawn the lister.
    #[error("failed to run {binary:?} in {dir}")]
    Spawn {
        /// The lister executable.
        binary: String,
        /// The working directory.
        dir: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The lister ran but failed.
    #[error("`{command}` failed in {dir} ({exit_status}): {stderr}")]
    Failed {
        /// The command line that was run.
        command: String,
        /// The working directory.
        dir: Utf8PathBuf,
        /// A human-readable description of the exit status.
        exit_status: String,
        /// The standard error of the command.
        stderr: String,
    },

    /// The lister produced output that could not be interpreted.
    #[error("unexpected output from `{command}`: {output:?}")]
    UnexpectedOutput {
        /// The command line that was run.
        command: String,
        /// The output.
        output: String,
    },

    /// Listing the workspace directory itself returned no package.
    #[error("no package found in {dir}")]
    NoRootPackage {
        /// The workspace directory.
        dir: Utf8PathBuf,
    },
}

/// Why one dependency could not be resolved to a revision.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResolveFailure {
    /// The lister reported an error for the package.
    #[error("{import_path}: {message}")]
    Package {
        /// The import path of the package.
        import_path: String,
        /// The lister's error message.
        message: String,
    },

    /// The lister returned nothing for the package.
    #[error("{import_path}: error listing package")]
    Missing {
        /// The import path of the package.
        import_path: String,
    },

    /// The owning VCS could not be determined.
    #[error("{import_path}: failed to determine version control system")]
    Detect {
        /// The import path of the package.
        import_path: String,
        /// The underlying detection error.
        #[source]
        source: VcsDetectError,
    },

    /// The checked-out revision could not be identified.
    #[error("{import_path}: failed to identify revision")]
    Identify {
        /// The import path of the package.
        import_path: String,
        /// The underlying command error.
        #[source]
        source: CommandError,
    },

    /// The working tree differs from the checked-out revision.
    #[error("dirty working tree: {dir}")]
    Dirty {
        /// The import path of the package.
        import_path: String,
        /// The package directory.
        dir: Utf8PathBuf,
        /// The revision the tree was compared against.
        rev: String,
    },
}

impl ResolveFailure {
    /// Returns the import path of the dependency that failed.
    pub fn import_path(&self) -> &str {
        match self {
            ResolveFailure::Package { import_path, .. }
            | ResolveFailure::Missing { import_path }
            | ResolveFailure::Detect { import_path, .. }
            | ResolveFailure::Identify { import_path, .. }
            | ResolveFailure::Dirty { import_path, .. } => import_path,
        }
    }
}

/// An error from a `save` or `update` operation.
///
/// Every variant other than [`Error::Sync`] is reported before the
/// manifest or the vendor tree is modified.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The package lister failed.
    #[error("failed to list packages")]
    List(#[from] ListError),

    /// Reading or writing the manifest failed.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// One or more dependencies could not be resolved. Each failure has
    /// already been logged.
    #[error("error loading dependencies ({} failed)", failures.len())]
    ResolutionFailed {
        /// Every failure, in the order encountered.
        failures: Vec<ResolveFailure>,
    },

    /// A dependency's working tree differs from its checked-out revision.
    #[error("dirty working tree for {import_path}: {dir}")]
    DirtyWorkingTree {
        /// The import path of the dependency.
        import_path: String,
        /// The dependency's directory.
        dir: Utf8PathBuf,
        /// The revision the tree was compared against.
        rev: String,
    },

    /// Two dependencies from one repository disagree on the revision.
    #[error(transparent)]
    Conflict(#[from] ConflictError),

    /// None of the update patterns matched a dependency in the manifest.
    #[error("no dependencies in the manifest match {}", patterns.join(" "))]
    NoMatchingDependency {
        /// The patterns as given.
        patterns: Vec<String>,
    },

    /// The vendor tree could not be brought fully in sync with the
    /// manifest, which has already been written.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// A tool path in the environment is invalid.
    #[error(transparent)]
    Env(#[from] VcsEnvError),
}
