// Copyright 2026 Oxide Computer Company

//! Resolution of dependencies to revisions.
//!
//! Resolution runs in two phases. The first resolves every dependency,
//! logging and collecting failures instead of stopping at the first one,
//! and produces an [`Outcome`]. Only when the outcome holds no failures
//! does the caller go on to check conflicts and write anything.

use crate::{Error, ListError, PackageInfo, PackageLister, ResolveFailure};
use pinvend::{Dependency, Location, contains_path_prefix, unqualify};
use pinvend_vcs::{Backends, Repository};
use tracing::{debug, warn};

/// A value produced by resolution, together with every failure seen while
/// producing it.
#[derive(Debug)]
pub struct Outcome<T> {
    /// What was resolved successfully.
    pub value: T,
    /// Every failure, in the order encountered.
    pub failures: Vec<ResolveFailure>,
}

impl<T> Outcome<T> {
    /// Creates an outcome with no failures.
    pub fn new(value: T) -> Self {
        Outcome { value, failures: Vec::new() }
    }

    /// Logs and records a failure.
    pub fn fail(&mut self, failure: ResolveFailure) {
        warn!(import_path = failure.import_path(), "{}", error_chain(&failure));
        self.failures.push(failure);
    }

    /// Returns true if nothing failed.
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    /// Converts into a result.
    ///
    /// A dirty working tree takes precedence over other failures and is
    /// reported as [`Error::DirtyWorkingTree`]; anything else becomes
    /// [`Error::ResolutionFailed`].
    pub fn into_result(self) -> Result<T, Error> {
        if self.failures.is_empty() {
            return Ok(self.value);
        }
        let dirty = self.failures.iter().find_map(|f| match f {
            ResolveFailure::Dirty { import_path, dir, rev } => {
                Some(Error::DirtyWorkingTree {
                    import_path: import_path.clone(),
                    dir: dir.clone(),
                    rev: rev.clone(),
                })
            }
            _ => None,
        });
        Err(dirty.unwrap_or(Error::ResolutionFailed { failures: self.failures }))
    }
}

/// Lists the dependencies of the packages matching `patterns` and pins
/// each to the revision checked out in the workspace.
///
/// Standard library packages and packages in the same repositories as the
/// matched packages are not dependencies. A package inside another
/// dependency's import path is covered by that dependency and is not
/// listed separately.
pub fn list_deps(
    lister: &impl PackageLister,
    backends: &Backends,
    patterns: &[String],
    vendor_element: &str,
) -> Result<Outcome<Vec<Dependency>>, ListError> {
    let mut outcome = Outcome::new(Vec::new());
    let mut seen: Vec<String> = Vec::new();
    let mut paths: Vec<String> = Vec::new();

    let roots = lister.list(patterns)?;
    for p in &roots {
        if p.standard {
            debug!(import_path = %p.import_path, "ignoring standard library package");
            continue;
        }
        if let Some(failure) = package_error(p) {
            outcome.fail(failure);
            continue;
        }
        match detect(backends, p) {
            Ok(repo) => seen.push(repo.root().to_owned()),
            Err(failure) => {
                outcome.fail(failure);
                continue;
            }
        }
        paths.extend(p.deps.iter().cloned());
    }

    let test_imports: Vec<String> = roots
        .iter()
        .flat_map(|p| p.test_imports.iter().chain(&p.xtest_imports))
        .cloned()
        .collect();
    for p in lister.list(&test_imports)? {
        if p.standard {
            continue;
        }
        if let Some(failure) = package_error(&p) {
            outcome.fail(failure);
            continue;
        }
        paths.push(p.import_path);
        paths.extend(p.deps);
    }

    let mut paths: Vec<String> = paths
        .iter()
        .map(|p| unqualify(p, vendor_element).to_owned())
        .collect();
    paths.sort();
    paths.dedup();

    for p in lister.list(&paths)? {
        if let Some(failure) = package_error(&p) {
            outcome.fail(failure);
            continue;
        }
        if p.standard {
            continue;
        }
        let repo = match detect(backends, &p) {
            Ok(repo) => repo,
            Err(failure) => {
                outcome.fail(failure);
                continue;
            }
        };
        if contains_path_prefix(&seen, &p.import_path) {
            continue;
        }
        seen.push(p.import_path.clone());

        match pin(&p.import_path, &location(&p, &repo), &repo) {
            Ok(dep) => outcome.value.push(dep),
            Err(failure) => outcome.fail(failure),
        }
    }

    Ok(outcome)
}

/// A manifest dependency located in the workspace, with the repository
/// that owns it.
#[derive(Debug)]
pub struct Candidate<'a> {
    /// The dependency as recorded, with its location attached.
    pub dep: Dependency,
    /// The owning repository.
    pub repo: Repository<'a>,
}

/// Finds each of `deps` in the workspace.
///
/// Returns one result per dependency, in order. Failures are not logged,
/// since whether they matter is up to the caller.
pub fn locate<'b>(
    lister: &impl PackageLister,
    backends: &'b Backends,
    deps: &[Dependency],
) -> Result<Vec<Result<Candidate<'b>, ResolveFailure>>, ListError> {
    let paths: Vec<String> =
        deps.iter().map(|d| d.import_path().to_owned()).collect();
    let packages = lister.list(&paths)?;

    let located = deps
        .iter()
        .map(|dep| -> Result<Candidate<'b>, ResolveFailure> {
            let p = packages
                .iter()
                .find(|p| p.import_path == dep.import_path())
                .ok_or_else(|| ResolveFailure::Missing {
                    import_path: dep.import_path().to_owned(),
                })?;
            if let Some(failure) = package_error(p) {
                return Err(failure);
            }
            let repo = detect(backends, p)?;
            Ok(Candidate {
                dep: dep.clone().with_location(location(p, &repo)),
                repo,
            })
        })
        .collect();
    Ok(located)
}

/// Pins each candidate to the revision currently checked out.
///
/// A dirty working tree stops resolution: later candidates are not
/// attempted.
pub fn pin_candidates(candidates: &[Candidate<'_>]) -> Outcome<Vec<Dependency>> {
    let mut outcome = Outcome::new(Vec::new());
    for c in candidates {
        let Some(location) = c.dep.location() else {
            outcome.fail(ResolveFailure::Missing {
                import_path: c.dep.import_path().to_owned(),
            });
            continue;
        };
        match pin(c.dep.import_path(), location, &c.repo) {
            Ok(dep) => outcome.value.push(dep),
            Err(failure @ ResolveFailure::Dirty { .. }) => {
                outcome.fail(failure);
                break;
            }
            Err(failure) => outcome.fail(failure),
        }
    }
    outcome
}

fn pin(
    import_path: &str,
    location: &Location,
    repo: &Repository<'_>,
) -> Result<Dependency, ResolveFailure> {
    let backend = repo.backend();
    let dir = location.dir();
    let rev = backend.identify(dir).map_err(|source| {
        ResolveFailure::Identify { import_path: import_path.to_owned(), source }
    })?;
    if backend.is_dirty(dir, &rev) {
        return Err(ResolveFailure::Dirty {
            import_path: import_path.to_owned(),
            dir: dir.to_owned(),
            rev,
        });
    }
    let comment = backend.describe(dir, &rev);
    debug!(import_path, %rev, comment, "pinned");
    Ok(Dependency::new(import_path, rev)
        .with_comment(comment)
        .with_location(location.clone()))
}

fn package_error(p: &PackageInfo) -> Option<ResolveFailure> {
    p.error.as_ref().map(|message| ResolveFailure::Package {
        import_path: p.import_path.clone(),
        message: message.clone(),
    })
}

fn detect<'b>(
    backends: &'b Backends,
    p: &PackageInfo,
) -> Result<Repository<'b>, ResolveFailure> {
    backends.detect(&p.dir, &p.src_root()).map_err(|source| {
        ResolveFailure::Detect { import_path: p.import_path.clone(), source }
    })
}

fn location(p: &PackageInfo, repo: &Repository<'_>) -> Location {
    Location::new(&p.root, &p.dir, repo.root())
}

/// Renders an error and its sources on one line.
pub(crate) fn error_chain(error: &dyn std::error::Error) -> String {
    let mut s = error.to_string();
    let mut source = error.source();
    while let Some(e) = source {
        s.push_str(": ");
        s.push_str(&e.to_string());
        source = e.source();
    }
    s
}
