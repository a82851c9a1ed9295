// Copyright 2026 Oxide Computer Company

//! Manifest model for vendored dependencies.
//!
//! A *manifest* (usually `vendor/Deps.json`) pins every dependency of a
//! project to a specific version-control revision. Each
//! [`Dependency`] names an import path, the revision it was copied from,
//! and optionally a human-readable description of that revision such as a
//! tag name.
//!
//! This crate holds the data model and the pure parts of reconciliation:
//!
//! - [`Manifest`]: reading, canonical serialization and atomic writes.
//! - [`Pattern`]: selection of import paths for updates.
//! - [`difference`] and [`Reconciliation`]: what to add, keep and remove.
//! - [`check_conflicts`]: at most one revision per repository.
//!
//! # Examples
//!
//! ```
//! use pinvend::{Dependency, Manifest, Reconciliation, check_conflicts};
//!
//! let mut manifest = Manifest::new("example.com/app");
//! manifest.deps = vec![
//!     Dependency::new("example.com/old", "aaaa"),
//!     Dependency::new("example.com/lib", "bbbb"),
//! ];
//!
//! // What the workspace needs right now.
//! let desired = [
//!     Dependency::new("example.com/lib", "cccc"),
//!     Dependency::new("example.com/new", "dddd"),
//! ];
//!
//! let r = Reconciliation::new(&manifest.deps, &desired);
//! assert_eq!(r.removed[0].import_path(), "example.com/old");
//! assert_eq!(r.added[0].import_path(), "example.com/new");
//! // Recorded revisions win for dependencies that are kept.
//! assert_eq!(r.kept[0].rev(), "bbbb");
//!
//! manifest.deps = r.merged();
//! check_conflicts(&manifest.deps).unwrap();
//! ```
//!
//! # Related crates
//!
//! For resolving revisions with version control tools and copying source
//! trees, see `pinvend-vcs`.

#![deny(missing_docs)]

mod dependency;
mod diff;
mod errors;
mod import_path;
mod manifest;
mod pattern;

pub use dependency::{Dependency, Location};
pub use diff::{Reconciliation, check_conflicts, difference};
pub use errors::{AtomicWriteError, ConflictError, ManifestError};
pub use import_path::{contains_path_prefix, is_path_prefix, unqualify};
pub use manifest::Manifest;
pub use pattern::{Pattern, WILDCARD};
