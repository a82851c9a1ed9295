// Copyright 2026 Oxide Computer Company

//! The `save` and `update` operations.

use crate::{
    Config, Error, GoList, ListError, PackageLister,
    resolve::{self, Candidate, Outcome, error_chain},
};
use pinvend::{
    Dependency, Manifest, Pattern, Reconciliation, check_conflicts, difference,
};
use pinvend_vcs::{Backends, VendorTree};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// The root pattern `save` uses when none are given or recorded.
pub const DEFAULT_SAVE_PATTERN: &str = "./...";

/// The pattern `update` uses when none are given.
pub const DEFAULT_UPDATE_PATTERN: &str = "...";

/// What a successful `save` changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SaveSummary {
    /// Dependencies added to the manifest and copied.
    pub added: Vec<Dependency>,
    /// Dependencies removed from the manifest and the vendor tree.
    pub removed: Vec<Dependency>,
}

/// What a successful `update` changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    /// Dependencies that were re-resolved and copied, at their new
    /// revisions.
    pub updated: Vec<Dependency>,
}

/// A project together with the tools used to inspect its workspace.
#[derive(Debug)]
pub struct Workspace<L> {
    config: Config,
    lister: L,
    backends: Backends,
}

impl<L: PackageLister> Workspace<L> {
    /// Creates a workspace.
    pub fn new(config: Config, lister: L, backends: Backends) -> Self {
        Workspace { config, lister, backends }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Records the dependencies of the packages matching `patterns` and
    /// vendors them.
    ///
    /// With no patterns, the patterns recorded in the manifest are used,
    /// and failing that every package in the project directory.
    ///
    /// Dependencies already in the manifest keep their recorded revision.
    /// New dependencies are pinned to the revision checked out in the
    /// workspace, and dependencies no longer imported are dropped. The
    /// manifest is written only if every dependency resolves and no two
    /// dependencies from one repository disagree on a revision. The vendor
    /// tree is synchronized afterwards; a copy that cannot be removed does
    /// not stop new dependencies from being copied.
    pub fn save(&self, patterns: &[String]) -> Result<SaveSummary, Error> {
        let manifest_path = self.config.manifest_path();
        let mut manifest = Manifest::read(&manifest_path)?;

        if !patterns.is_empty() {
            manifest.packages = patterns.to_vec();
        }
        let roots = if manifest.packages.is_empty() {
            vec![DEFAULT_SAVE_PATTERN.to_owned()]
        } else {
            manifest.packages.clone()
        };

        manifest.tool_version = self.lister.tool_version()?;
        manifest.import_path = self.root_import_path()?;

        let desired = resolve::list_deps(
            &self.lister,
            &self.backends,
            &roots,
            self.config.vendor_element(),
        )?
        .into_result()?;

        let reconciled = Reconciliation::new(&manifest.deps, &desired);
        manifest.deps = reconciled.merged();
        check_conflicts(&manifest.deps)?;

        let vendor = VendorTree::new(self.config.vendor_path());
        if let Err(e) = vendor.write_readme() {
            warn!("{}", error_chain(&e));
        }
        manifest.write(&manifest_path)?;

        for dep in &reconciled.removed {
            info!(import_path = dep.import_path(), "removing dependency");
        }
        for dep in &reconciled.added {
            info!(import_path = dep.import_path(), rev = dep.rev(), "adding dependency");
        }
        vendor.sync(&reconciled.removed, &reconciled.added)?;

        Ok(SaveSummary { added: reconciled.added, removed: reconciled.removed })
    }

    /// Re-pins the manifest dependencies matching `patterns` to the
    /// revisions checked out in the workspace, and vendors them again.
    ///
    /// With no patterns every dependency is updated. A pattern that
    /// matches nothing is logged; if no pattern matches anything the
    /// update fails with [`Error::NoMatchingDependency`].
    ///
    /// Dependencies that share a repository with a matched dependency are
    /// updated along with it. A dirty working tree aborts the update
    /// before anything is written.
    pub fn update(&self, patterns: &[String]) -> Result<UpdateSummary, Error> {
        let patterns = if patterns.is_empty() {
            vec![DEFAULT_UPDATE_PATTERN.to_owned()]
        } else {
            patterns.to_vec()
        };
        let manifest_path = self.config.manifest_path();
        let mut manifest = Manifest::read(&manifest_path)?;

        let matched = match_patterns(&patterns, &manifest.deps);
        if matched.is_empty() {
            return Err(Error::NoMatchingDependency { patterns });
        }

        let located = resolve::locate(&self.lister, &self.backends, &manifest.deps)?;

        // Whole repositories are updated together, so every revision a
        // repository contributes stays the same.
        let matched_roots: HashSet<String> = manifest
            .deps
            .iter()
            .zip(&located)
            .filter(|(dep, _)| matched.contains(dep.import_path()))
            .filter_map(|(_, l)| l.as_ref().ok())
            .map(|c| c.repo.root().to_owned())
            .collect();

        let mut outcome: Outcome<Vec<Candidate<'_>>> = Outcome::new(Vec::new());
        let mut current = Vec::with_capacity(manifest.deps.len());
        for (dep, result) in manifest.deps.iter().zip(located) {
            let selected = matched.contains(dep.import_path());
            match result {
                Ok(candidate) => {
                    current.push(candidate.dep.clone());
                    if selected || matched_roots.contains(candidate.repo.root()) {
                        if !selected {
                            info!(
                                import_path = dep.import_path(),
                                repo_root = candidate.repo.root(),
                                "updating with the rest of its repository",
                            );
                        }
                        outcome.value.push(candidate);
                    }
                }
                Err(failure) if selected => outcome.fail(failure),
                Err(failure) => {
                    debug!(
                        import_path = dep.import_path(),
                        "not updated: {}",
                        error_chain(&failure),
                    );
                    current.push(dep.clone());
                }
            }
        }
        let candidates = outcome.into_result()?;
        let updated = resolve::pin_candidates(&candidates).into_result()?;

        let mut deps = difference(&current, &updated);
        deps.extend(updated.iter().cloned());
        check_conflicts(&deps)?;

        manifest.deps = deps;
        manifest.sort_deps();
        manifest.write(&manifest_path)?;

        for dep in &updated {
            info!(import_path = dep.import_path(), rev = dep.rev(), "updating dependency");
        }
        VendorTree::new(self.config.vendor_path()).copy(&updated)?;

        Ok(UpdateSummary { updated })
    }

    fn root_import_path(&self) -> Result<String, Error> {
        let packages = self.lister.list(&[".".to_owned()])?;
        match packages.into_iter().next() {
            Some(p) => Ok(p.import_path),
            None => Err(ListError::NoRootPackage {
                dir: self.config.dir().to_owned(),
            }
            .into()),
        }
    }
}

impl Workspace<GoList> {
    /// Creates a workspace that lists packages with `$GO` and resolves
    /// revisions with `$GIT`, `$HG` and `$BZR`.
    pub fn from_env(config: Config) -> Result<Self, Error> {
        let lister = GoList::from_env(config.dir())?;
        let backends = Backends::from_env()?;
        Ok(Workspace::new(config, lister, backends))
    }
}

/// Returns the patterns in `patterns` that can select dependencies for
/// [`Workspace::update`].
///
/// Relative patterns such as `./cmd/...` name packages of the project
/// itself and never match a dependency, so they are dropped.
pub fn dependency_patterns(patterns: &[String]) -> Vec<String> {
    patterns.iter().filter(|p| !is_relative(p)).cloned().collect()
}

fn is_relative(pattern: &str) -> bool {
    pattern == "."
        || pattern == ".."
        || pattern.starts_with("./")
        || pattern.starts_with("../")
}

/// Returns the import paths of `deps` matched by any of `patterns`,
/// logging each pattern that matches nothing.
fn match_patterns<'d>(
    patterns: &[String],
    deps: &'d [Dependency],
) -> HashSet<&'d str> {
    let mut matched = HashSet::new();
    for raw in patterns {
        let pattern = Pattern::new(raw.as_str());
        let before = matched.len();
        let mut any = false;
        for dep in deps.iter().filter(|d| pattern.matches(d.import_path())) {
            matched.insert(dep.import_path());
            any = true;
        }
        if !any {
            warn!(%pattern, "not in manifest");
        }
        debug!(%pattern, new = matched.len() - before, "matched");
    }
    matched
}
