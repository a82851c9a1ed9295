// Copyright 2026 Oxide Computer Company

//! Error types for VCS operations and vendor tree synchronization.

use crate::VcsName;
use camino::Utf8PathBuf;
use pinvend::AtomicWriteError;
use std::{ffi::OsString, fmt, io, path::PathBuf};
use thiserror::Error;

// ---- VCS errors ----

/// An error from reading a VCS binary path from the environment.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VcsEnvError {
    /// The environment variable is set but is not valid UTF-8.
    #[error(
        "${var} environment variable is not valid \
         UTF-8: {value:?}"
    )]
    NonUtf8 {
        /// The environment variable name.
        var: &'static str,
        /// The non-UTF-8 value.
        value: OsString,
    },
}

/// An error that occurs while determining which VCS owns a directory.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VcsDetectError {
    /// The directory does not exist.
    #[error("{dir} does not exist")]
    PathNotFound {
        /// The directory that was inspected.
        dir: Utf8PathBuf,
    },

    /// The path is not a directory.
    #[error("{dir} is not a directory")]
    NotADirectory {
        /// The path that was inspected.
        dir: Utf8PathBuf,
    },

    /// The directory is not below the source root that import paths are
    /// resolved against.
    #[error("directory {dir} is outside source root {src_root}")]
    OutsideSourceRoot {
        /// The directory that was inspected.
        dir: Utf8PathBuf,
        /// The source root.
        src_root: Utf8PathBuf,
    },

    /// An I/O error occurred while probing for VCS metadata.
    #[error("I/O error while checking for VCS at {path}")]
    Io {
        /// The path being checked when the error occurred.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// No known VCS metadata was found between the directory and the
    /// source root.
    #[error(
        "directory {dir} is not using a known version control system"
    )]
    NotFound {
        /// The directory that was inspected.
        dir: Utf8PathBuf,
    },

    /// The directory is owned by a VCS that has no registered backend.
    #[error("{vcs_name} is unsupported: {dir}")]
    Unsupported {
        /// The detected VCS.
        vcs_name: VcsName,
        /// The directory that was inspected.
        dir: Utf8PathBuf,
    },
}

/// An error from running a VCS command.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CommandError {
    /// The VCS executable could not be found.
    #[error("missing {vcs_name} command ({binary_path:?})")]
    BackendUnavailable {
        /// The name of the VCS.
        vcs_name: VcsName,
        /// The path to the VCS executable.
        binary_path: String,
    },

    /// Failed to spawn the VCS process.
    #[error("failed to run {vcs_name} at {binary_path:?} in {dir}")]
    SpawnFailed {
        /// The name of the VCS.
        vcs_name: VcsName,
        /// The path to the VCS executable.
        binary_path: String,
        /// The working directory where the command was run.
        dir: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The VCS command ran but failed.
    #[error("`{command}` failed in {dir} ({exit_status}): {output}")]
    Failed {
        /// The name of the VCS.
        vcs_name: VcsName,
        /// The command line that was run.
        command: String,
        /// The working directory where the command was run.
        dir: Utf8PathBuf,
        /// A human-readable description of the exit status (e.g.,
        /// "exit status: 128").
        exit_status: String,
        /// The combined stdout and stderr of the command.
        output: String,
    },
}

// ---- Synchronization errors ----

/// An error affecting a single file or package while synchronizing the
/// vendor tree.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CopyError {
    /// The dependency has not been resolved to a directory.
    #[error("{import_path} has no source location")]
    NoLocation {
        /// The import path of the dependency.
        import_path: String,
    },

    /// The package directory is not below its workspace source root.
    #[error("{dir} is outside source root {src_root}")]
    OutsideSourceRoot {
        /// The package directory.
        dir: Utf8PathBuf,
        /// The source root.
        src_root: Utf8PathBuf,
    },

    /// Failed to remove a path from the vendor tree.
    #[error("failed to remove {path}")]
    Remove {
        /// The path being removed.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        error: io::Error,
    },

    /// Walking the source tree failed.
    #[error("failed to walk {root}")]
    Walk {
        /// The directory being walked.
        root: Utf8PathBuf,
        /// The underlying walk error.
        #[source]
        error: walkdir::Error,
    },

    /// A path in the source tree is not valid UTF-8.
    #[error("path is not valid UTF-8: {path:?}")]
    NonUtf8Path {
        /// The offending path.
        path: PathBuf,
    },

    /// Failed to create a destination directory.
    #[error("failed to create directory {path}")]
    CreateDir {
        /// The directory path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        error: io::Error,
    },

    /// Failed to reproduce a symbolic link.
    #[error("failed to link {dst} -> {target}")]
    Symlink {
        /// The link being created.
        dst: Utf8PathBuf,
        /// The link target.
        target: PathBuf,
        /// The underlying I/O error.
        #[source]
        error: io::Error,
    },

    /// Failed to read a source file or link.
    #[error("failed to read {path}")]
    Read {
        /// The source path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        error: io::Error,
    },

    /// Failed to write a destination file.
    #[error("failed to write {path}")]
    Write {
        /// The destination path.
        path: Utf8PathBuf,
        /// The underlying write error.
        #[source]
        error: AtomicWriteError,
    },
}

/// Which synchronization step failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncOperation {
    /// Copying dependency sources into the vendor tree.
    Copy,
    /// Removing dependency sources from the vendor tree.
    Remove,
}

impl fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOperation::Copy => write!(f, "copying source code"),
            SyncOperation::Remove => write!(f, "removing source code"),
        }
    }
}

/// One failed file or package, and the step it failed in.
#[derive(Debug, Error)]
#[error("error {operation}")]
pub struct SyncFailure {
    /// The step that failed.
    pub operation: SyncOperation,
    /// What went wrong.
    #[source]
    pub error: CopyError,
}

/// The vendor tree could not be brought fully in sync.
///
/// Individual failures are logged as they happen; the tree may be
/// incomplete.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyncError {
    /// One or more files or packages failed.
    #[error(
        "{} failure(s) synchronizing source code, vendor tree may be incomplete",
        failures.len()
    )]
    Incomplete {
        /// Every failure, in the order encountered.
        failures: Vec<SyncFailure>,
    },
}
