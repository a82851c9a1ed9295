// Copyright 2026 Oxide Computer Company

//! Set algebra over dependency lists, and revision conflict detection.

use crate::{ConflictError, Dependency, is_path_prefix};
use std::collections::HashSet;

/// Returns the entries of `a` whose import path does not appear in `b`,
/// in `a`'s order.
///
/// ```
/// use pinvend::{Dependency, difference};
///
/// let a = [Dependency::new("x", "1"), Dependency::new("y", "1")];
/// let b = [Dependency::new("y", "2")];
/// let diff = difference(&a, &b);
/// assert_eq!(diff, [Dependency::new("x", "1")]);
/// ```
pub fn difference(a: &[Dependency], b: &[Dependency]) -> Vec<Dependency> {
    let exclude: HashSet<&str> = b.iter().map(|d| d.import_path()).collect();
    a.iter().filter(|d| !exclude.contains(d.import_path())).cloned().collect()
}

/// The result of reconciling the dependencies recorded in a manifest with
/// the dependencies a workspace currently needs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Recorded dependencies that are still needed, at their recorded
    /// revision.
    pub kept: Vec<Dependency>,
    /// Needed dependencies that were not recorded.
    pub added: Vec<Dependency>,
    /// Recorded dependencies that are no longer needed.
    pub removed: Vec<Dependency>,
}

impl Reconciliation {
    /// Reconciles `current` (from the manifest) against `desired` (from the
    /// workspace).
    ///
    /// Kept dependencies retain their recorded revision and comment but
    /// take their location from the matching desired entry, so that
    /// repository-level conflicts can be detected against them.
    pub fn new(current: &[Dependency], desired: &[Dependency]) -> Self {
        let removed = difference(current, desired);
        let added = difference(desired, current);
        let kept = difference(current, &removed)
            .into_iter()
            .map(|mut dep| {
                let location = desired
                    .iter()
                    .find(|d| d.import_path() == dep.import_path())
                    .and_then(|d| d.location().cloned());
                if location.is_some() {
                    dep.set_location(location);
                }
                dep
            })
            .collect();
        Reconciliation { kept, added, removed }
    }

    /// Returns the kept dependencies followed by the added ones.
    pub fn merged(&self) -> Vec<Dependency> {
        self.kept.iter().chain(&self.added).cloned().collect()
    }

    /// Returns true if nothing was added or removed.
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Checks that a single repository contributes exactly one revision.
///
/// Two dependencies must agree on their revision if one import path lies
/// below the other, or if they belong to the same repository. Repository
/// membership is only known for dependencies with a
/// [`Location`](crate::Location).
pub fn check_conflicts(deps: &[Dependency]) -> Result<(), ConflictError> {
    for (i, a) in deps.iter().enumerate() {
        for b in &deps[i + 1..] {
            if a.rev() != b.rev() && same_repository(a, b) {
                return Err(ConflictError::ConflictingRevisions {
                    first: a.import_path().to_owned(),
                    first_rev: a.rev().to_owned(),
                    second: b.import_path().to_owned(),
                    second_rev: b.rev().to_owned(),
                });
            }
        }
    }
    Ok(())
}

fn same_repository(a: &Dependency, b: &Dependency) -> bool {
    if is_path_prefix(a.import_path(), b.import_path())
        || is_path_prefix(b.import_path(), a.import_path())
    {
        return true;
    }
    match (a.repo_root(), b.repo_root()) {
        (Some(ra), Some(rb)) if ra == rb => true,
        (ra, rb) => {
            ra.is_some_and(|r| is_path_prefix(r, b.import_path()))
                || rb.is_some_and(|r| is_path_prefix(r, a.import_path()))
        }
    }
}
