// Copyright 2026 Oxide Computer Company

//! Version control backends and vendor tree synchronization.
//!
//! A dependency is pinned by asking the version control system that owns
//! its directory three questions: which revision is checked out
//! ([`Backend::identify`]), how should that revision be described
//! ([`Backend::describe`]), and does the working tree differ from it
//! ([`Backend::is_dirty`]). Each supported system answers them with a
//! small set of [`CommandTemplates`]; Git, Mercurial and Bazaar are
//! registered by [`Backends::from_env`].
//!
//! Once dependencies are resolved, a [`VendorTree`] copies their sources
//! into the vendor directory, or removes copies that are no longer needed.
//!
//! # Usage
//!
//! ```no_run
//! use camino::Utf8Path;
//! use pinvend::{Dependency, Location};
//! use pinvend_vcs::{Backends, VendorTree};
//!
//! let backends = Backends::from_env().expect("VCS environment is valid");
//! let src_root = Utf8Path::new("/home/me/work/src");
//! let dir = src_root.join("example.com/lib");
//!
//! let repo = backends.detect(&dir, src_root).expect("VCS detected");
//! let rev = repo.backend().identify(&dir).expect("revision identified");
//! assert!(!repo.backend().is_dirty(&dir, &rev));
//!
//! let dep = Dependency::new("example.com/lib", &rev)
//!     .with_comment(repo.backend().describe(&dir, &rev))
//!     .with_location(Location::new("/home/me/work", &dir, repo.root()));
//!
//! let vendor = VendorTree::new("/home/me/work/src/example.com/app/vendor");
//! vendor.copy(&[dep]).expect("sources copied");
//! ```

#![deny(missing_docs)]

mod errors;
mod strip;
mod sync;
mod vcs;

pub use errors::{
    CommandError, CopyError, SyncError, SyncFailure, SyncOperation,
    VcsDetectError, VcsEnvError,
};
pub use strip::{
    SOURCE_EXTENSION, copy_without_import_comment, is_source_file,
    strip_import_comment,
};
pub use sync::{README, VendorTree, copy_file};
pub use vcs::{
    Backend, Backends, CommandTemplates, REV, Repository, VcsName,
    expand_template, read_binary_env,
};
