// Copyright 2026 Oxide Computer Company

//! Error types for manifest operations.

use camino::Utf8PathBuf;
use std::io;
use thiserror::Error;

/// An error that occurs while reading or writing a
/// [`Manifest`](crate::Manifest).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ManifestError {
    /// The manifest file exists but could not be read.
    #[error("failed to read manifest {path}")]
    Read {
        /// The path to the manifest.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        error: io::Error,
    },

    /// The manifest file is not a valid JSON manifest.
    #[error("invalid manifest format in {path}")]
    Parse {
        /// The path to the manifest.
        path: Utf8PathBuf,
        /// Details about the decoding error.
        #[source]
        error: serde_json::Error,
    },

    /// The manifest could not be encoded as JSON.
    #[error("failed to encode manifest")]
    Encode(#[source] serde_json::Error),

    /// Failed to create the directory that holds the manifest.
    #[error("failed to create manifest directory {path}")]
    CreateDir {
        /// The directory path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        error: io::Error,
    },

    /// Failed to write the manifest.
    #[error("failed to write manifest to {path}")]
    Write {
        /// The path where the write failed.
        path: Utf8PathBuf,
        /// The underlying write error.
        #[source]
        error: AtomicWriteError,
    },
}

/// Two dependencies from one repository are pinned to different revisions.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConflictError {
    /// The two import paths are parent and child, or share a repository
    /// root, but disagree on the revision.
    #[error(
        "conflicting revisions {first_rev} ({first}) and \
         {second_rev} ({second})"
    )]
    ConflictingRevisions {
        /// The first import path.
        first: String,
        /// The revision of the first import path.
        first_rev: String,
        /// The second import path.
        second: String,
        /// The revision of the second import path.
        second_rev: String,
    },
}

/// An error that occurred during an atomic file write.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AtomicWriteError {
    /// Writing contents to the temporary file failed.
    #[error("writing file contents failed")]
    Write(#[source] io::Error),

    /// The atomic write infrastructure failed (e.g., creating the
    /// temporary file, or renaming it into place).
    #[error("atomic create or rename failed")]
    Rename(#[source] io::Error),
}

impl From<atomicwrites::Error<io::Error>> for AtomicWriteError {
    fn from(error: atomicwrites::Error<io::Error>) -> Self {
        match error {
            atomicwrites::Error::Internal(e) => AtomicWriteError::Rename(e),
            atomicwrites::Error::User(e) => AtomicWriteError::Write(e),
        }
    }
}
