// Copyright 2026 Oxide Computer Company

//! Synchronization of the on-disk vendor tree with a resolved manifest.

use crate::{
    CopyError, SyncError, SyncFailure, SyncOperation,
    copy_without_import_comment, is_source_file,
};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use pinvend::{AtomicWriteError, Dependency};
use std::io::{self, BufReader, Write};
use tracing::{debug, error};
use walkdir::{DirEntry, WalkDir};

/// The contents of the README written at the top of a vendor tree.
pub const README: &str = "\
This directory tree is generated automatically by pinvend.

Please do not edit.
";

/// The vendor tree: a copy of every dependency's sources, keyed by import
/// path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorTree {
    root: Utf8PathBuf,
}

impl VendorTree {
    /// Creates a handle for the vendor tree at `root`. Nothing is touched
    /// on disk.
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        VendorTree { root: root.into() }
    }

    /// Returns the root of the vendor tree.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Returns the directory holding the copy of `import_path`.
    pub fn path_for(&self, import_path: &str) -> Utf8PathBuf {
        self.root.join(import_path)
    }

    /// Writes the README at the top of the tree.
    pub fn write_readme(&self) -> Result<(), CopyError> {
        let path = self.root.join("README");
        create_parent(&path)?;
        AtomicFile::new(&path, OverwriteBehavior::AllowOverwrite)
            .write(|f| f.write_all(README.as_bytes()))
            .map_err(|error| CopyError::Write {
                path,
                error: AtomicWriteError::from(error),
            })
    }

    /// Deletes the copy of each dependency. Copies that are already
    /// absent are not an error.
    ///
    /// Every dependency is attempted; failures are logged and returned
    /// together.
    pub fn remove(&self, deps: &[Dependency]) -> Result<(), SyncError> {
        let mut failures = Vec::new();
        self.remove_into(deps, &mut failures);
        finish(failures)
    }

    /// Copies the sources of each dependency into the tree, replacing any
    /// previous copy.
    ///
    /// Each dependency must have a [`Location`](pinvend::Location). Files
    /// and directories whose names start with `.` or `_` are skipped,
    /// symbolic links are recreated rather than followed, and source files
    /// have their import annotations stripped.
    ///
    /// Every file is attempted; failures are logged and returned together.
    pub fn copy(&self, deps: &[Dependency]) -> Result<(), SyncError> {
        let mut failures = Vec::new();
        self.copy_into(deps, &mut failures);
        finish(failures)
    }

    /// Removes the copies of `removed`, then copies `added`.
    ///
    /// A failed removal does not stop the copy. Failures from both steps
    /// are returned together.
    pub fn sync(
        &self,
        removed: &[Dependency],
        added: &[Dependency],
    ) -> Result<(), SyncError> {
        let mut failures = Vec::new();
        self.remove_into(removed, &mut failures);
        self.copy_into(added, &mut failures);
        finish(failures)
    }

    fn remove_into(&self, deps: &[Dependency], failures: &mut Vec<SyncFailure>) {
        for dep in deps {
            let path = self.path_for(dep.import_path());
            debug!(import_path = dep.import_path(), %path, "removing");
            if let Err(error) = remove_all(&path) {
                record(failures, SyncOperation::Remove, error);
            }
        }
    }

    fn copy_into(&self, deps: &[Dependency], failures: &mut Vec<SyncFailure>) {
        for dep in deps {
            self.copy_package(dep, failures);
        }
    }

    fn copy_package(&self, dep: &Dependency, failures: &mut Vec<SyncFailure>) {
        let mut fail = |e: CopyError| record(failures, SyncOperation::Copy, e);

        let Some(location) = dep.location() else {
            fail(CopyError::NoLocation {
                import_path: dep.import_path().to_owned(),
            });
            return;
        };
        let src_root = location.src_root();
        let Ok(rel) = location.dir().strip_prefix(&src_root) else {
            fail(CopyError::OutsideSourceRoot {
                dir: location.dir().to_owned(),
                src_root,
            });
            return;
        };

        let dst_pkg_root = self.root.join(rel);
        debug!(
            import_path = dep.import_path(),
            src = %location.dir(),
            dst = %dst_pkg_root,
            "copying",
        );
        // Clear out any copy from a previous revision first, so files that
        // no longer exist upstream do not linger.
        if let Err(e) = remove_all(&dst_pkg_root) {
            fail(e);
        }

        let walker = WalkDir::new(location.dir())
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_ignored(e));
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    fail(CopyError::Walk {
                        root: location.dir().to_owned(),
                        error,
                    });
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                continue;
            }
            let Some(src) = Utf8Path::from_path(entry.path()) else {
                fail(CopyError::NonUtf8Path { path: entry.path().to_owned() });
                continue;
            };
            let Ok(rel) = src.strip_prefix(&src_root) else {
                fail(CopyError::OutsideSourceRoot {
                    dir: src.to_owned(),
                    src_root: src_root.clone(),
                });
                continue;
            };
            let dst = self.root.join(rel);
            if let Err(e) = copy_file(&dst, src) {
                fail(e);
            }
        }
    }
}

/// Copies the file or symbolic link at `src` to `dst`, creating parent
/// directories as needed.
///
/// Symbolic links are recreated with the same target. Source files (see
/// [`is_source_file`]) have their import annotations stripped.
pub fn copy_file(dst: &Utf8Path, src: &Utf8Path) -> Result<(), CopyError> {
    create_parent(dst)?;

    let meta = fs::symlink_metadata(src)
        .map_err(|error| CopyError::Read { path: src.to_owned(), error })?;
    if meta.file_type().is_symlink() {
        let target = fs::read_link(src)
            .map_err(|error| CopyError::Read { path: src.to_owned(), error })?;
        return symlink(&target, dst).map_err(|error| CopyError::Symlink {
            dst: dst.to_owned(),
            target,
            error,
        });
    }

    let file = fs::File::open(src)
        .map_err(|error| CopyError::Read { path: src.to_owned(), error })?;
    let mut reader = BufReader::new(file);
    let strip = is_source_file(dst);
    AtomicFile::new(dst, OverwriteBehavior::AllowOverwrite)
        .write(|f| {
            if strip {
                copy_without_import_comment(&mut reader, f)
            } else {
                io::copy(&mut reader, f).map(|_| ())
            }
        })
        .map_err(|error| CopyError::Write {
            path: dst.to_owned(),
            error: AtomicWriteError::from(error),
        })
}

#[cfg(unix)]
fn symlink(target: &std::path::Path, dst: &Utf8Path) -> io::Result<()> {
    fs::os::unix::fs::symlink(target, dst)
}

#[cfg(windows)]
fn symlink(target: &std::path::Path, dst: &Utf8Path) -> io::Result<()> {
    fs::os::windows::fs::symlink_file(target, dst)
}

/// Skip names the way package discovery does.
fn is_ignored(entry: &DirEntry) -> bool {
    matches!(
        entry.file_name().as_encoded_bytes().first(),
        Some(b'.') | Some(b'_')
    )
}

fn create_parent(path: &Utf8Path) -> Result<(), CopyError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|error| CopyError::CreateDir {
            path: parent.to_owned(),
            error,
        })?;
    }
    Ok(())
}

/// Removes whatever is at `path`: a directory tree, a file or a link.
fn remove_all(path: &Utf8Path) -> Result<(), CopyError> {
    let remove_error =
        |error: io::Error| CopyError::Remove { path: path.to_owned(), error };
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(error) => return Err(remove_error(error)),
    };
    if meta.is_dir() {
        fs::remove_dir_all(path).map_err(remove_error)
    } else {
        fs::remove_file(path).map_err(remove_error)
    }
}

fn record(
    failures: &mut Vec<SyncFailure>,
    operation: SyncOperation,
    error: CopyError,
) {
    let failure = SyncFailure { operation, error };
    error!("{}", error_chain(&failure));
    failures.push(failure);
}

fn finish(failures: Vec<SyncFailure>) -> Result<(), SyncError> {
    if failures.is_empty() {
        Ok(())
    } else {
        Err(SyncError::Incomplete { failures })
    }
}

fn error_chain(error: &dyn std::error::Error) -> String {
    let mut s = error.to_string();
    let mut source = error.source();
    while let Some(e) = source {
        s.push_str(": ");
        s.push_str(&e.to_string());
        source = e.source();
    }
    s
}

// Tests are in tests/integration/sync.rs.
