// Copyright 2026 Oxide Computer Company

//! Vendoring operations for the `pinvend` command.
//!
//! A [`Workspace`] ties together a project directory ([`Config`]), a
//! [`PackageLister`] that reports which packages the project imports, and
//! the version control [`Backends`](pinvend_vcs::Backends) used to pin
//! each dependency to a revision. It supports two operations:
//!
//! - [`Workspace::save`] records new dependencies at the revision checked
//!   out in the workspace, drops dependencies that are no longer imported,
//!   and keeps every other dependency at its recorded revision.
//! - [`Workspace::update`] re-pins selected dependencies to the revision
//!   checked out in the workspace.
//!
//! Both operations resolve every dependency before changing anything on
//! disk, and report all resolution failures together.

#![deny(missing_docs)]

mod config;
mod errors;
mod packages;
mod resolve;
mod workspace;

pub use config::{Config, DEFAULT_VENDOR_DIR, MANIFEST_FILE};
pub use errors::{Error, ListError, ResolveFailure};
pub use packages::{GoList, PackageInfo, PackageLister};
pub use resolve::{Candidate, Outcome, list_deps, locate, pin_candidates};
pub use workspace::{
    DEFAULT_SAVE_PATTERN, DEFAULT_UPDATE_PATTERN, SaveSummary, UpdateSummary,
    Workspace, dependency_patterns,
};
