// Copyright 2026 Oxide Computer Company

//! Version control backends for identifying, describing and checking
//! revisions.

use crate::{CommandError, VcsDetectError, VcsEnvError};
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use std::{fmt, io, process::Command};
use tracing::{debug, warn};

/// Reads a tool binary path from an environment variable, falling back
/// to `default` if the variable is unset or empty.
///
/// The value is trimmed of leading and trailing whitespace.
///
/// Returns an error if the variable is set but is not valid UTF-8.
pub fn read_binary_env(
    var: &'static str,
    default: &str,
) -> Result<String, VcsEnvError> {
    match std::env::var(var) {
        Ok(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Ok(default.to_string())
            } else {
                Ok(trimmed.to_string())
            }
        }
        Err(std::env::VarError::NotPresent) => Ok(default.to_string()),
        Err(std::env::VarError::NotUnicode(value)) => {
            Err(VcsEnvError::NonUtf8 { var, value })
        }
    }
}

/// The name of a version control system.
///
/// Every name here can be detected; only those with
/// [`templates`](VcsName::templates) can be used as a [`Backend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum VcsName {
    /// Git.
    Git,
    /// Mercurial.
    Hg,
    /// Bazaar.
    Bzr,
    /// Subversion. Detected, but not supported.
    Svn,
}

impl VcsName {
    /// All known systems, in detection order.
    pub const ALL: [VcsName; 4] =
        [VcsName::Git, VcsName::Hg, VcsName::Bzr, VcsName::Svn];

    /// Returns the metadata entry that marks a repository root, e.g.
    /// `.git`.
    pub fn marker(self) -> &'static str {
        match self {
            VcsName::Git => ".git",
            VcsName::Hg => ".hg",
            VcsName::Bzr => ".bzr",
            VcsName::Svn => ".svn",
        }
    }

    /// Returns the command templates for this system, if it is supported.
    pub fn templates(self) -> Option<&'static CommandTemplates> {
        match self {
            VcsName::Git => Some(&GIT),
            VcsName::Hg => Some(&HG),
            VcsName::Bzr => Some(&BZR),
            VcsName::Svn => None,
        }
    }

    fn env_var(self) -> &'static str {
        match self {
            VcsName::Git => "GIT",
            VcsName::Hg => "HG",
            VcsName::Bzr => "BZR",
            VcsName::Svn => "SVN",
        }
    }
}

impl fmt::Display for VcsName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VcsName::Git => write!(f, "git"),
            VcsName::Hg => write!(f, "hg"),
            VcsName::Bzr => write!(f, "bzr"),
            VcsName::Svn => write!(f, "svn"),
        }
    }
}

/// The placeholder substituted with a revision identifier.
pub const REV: &str = "rev";

/// The command lines a backend runs, as whitespace-separated templates.
///
/// Placeholders of the form `{name}` are substituted per argument after
/// splitting; unknown placeholders are passed through untouched.
#[derive(Debug, PartialEq, Eq)]
pub struct CommandTemplates {
    /// Prints the revision of the working tree.
    pub identify: &'static str,
    /// Prints a description of `{rev}`, such as the nearest tag.
    pub describe: &'static str,
    /// Prints the differences between the working tree and `{rev}`.
    pub diff: &'static str,
}

static GIT: CommandTemplates = CommandTemplates {
    identify: "rev-parse HEAD",
    describe: "describe --tags",
    diff: "diff {rev}",
};

static HG: CommandTemplates = CommandTemplates {
    identify: "identify --id --debug",
    describe: "log -r . --template {latesttag}-{latesttagdistance}",
    diff: "diff -r {rev}",
};

static BZR: CommandTemplates = CommandTemplates {
    identify: "version-info --custom --template {revision_id}",
    describe: "revno",
    diff: "diff -r {rev}",
};

/// Splits `template` into arguments and substitutes `{key}` with its
/// value in each argument.
///
/// ```
/// use pinvend_vcs::expand_template;
///
/// let args = expand_template("diff -r {rev}", &[("rev", "abc123")]);
/// assert_eq!(args, ["diff", "-r", "abc123"]);
/// ```
pub fn expand_template(template: &str, vars: &[(&str, &str)]) -> Vec<String> {
    template
        .split_whitespace()
        .map(|arg| {
            vars.iter().fold(arg.to_owned(), |arg, (key, value)| {
                arg.replace(&format!("{{{key}}}"), value)
            })
        })
        .collect()
}

/// A supported version control system bound to an executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backend {
    name: VcsName,
    binary: String,
    templates: &'static CommandTemplates,
}

impl Backend {
    /// Creates a Git backend using the `$GIT` environment variable or
    /// `"git"`.
    pub fn git() -> Result<Self, VcsEnvError> {
        Self::from_env(VcsName::Git, &GIT)
    }

    /// Creates a Mercurial backend using the `$HG` environment variable
    /// or `"hg"`.
    pub fn hg() -> Result<Self, VcsEnvError> {
        Self::from_env(VcsName::Hg, &HG)
    }

    /// Creates a Bazaar backend using the `$BZR` environment variable or
    /// `"bzr"`.
    pub fn bzr() -> Result<Self, VcsEnvError> {
        Self::from_env(VcsName::Bzr, &BZR)
    }

    /// Creates a backend for `name` that runs `binary`.
    ///
    /// Returns `None` if `name` has no command templates.
    pub fn with_binary(name: VcsName, binary: impl Into<String>) -> Option<Self> {
        let templates = name.templates()?;
        Some(Backend { name, binary: binary.into(), templates })
    }

    fn from_env(
        name: VcsName,
        templates: &'static CommandTemplates,
    ) -> Result<Self, VcsEnvError> {
        let binary = read_binary_env(name.env_var(), &name.to_string())?;
        Ok(Backend { name, binary, templates })
    }

    /// Returns the name of the VCS.
    pub fn name(&self) -> VcsName {
        self.name
    }

    /// Returns the path to the VCS binary.
    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Returns the revision of the working tree at `dir`.
    pub fn identify(&self, dir: &Utf8Path) -> Result<String, CommandError> {
        let out = self.run(dir, self.templates.identify, &[], true)?;
        Ok(String::from_utf8_lossy(&out).trim().to_owned())
    }

    /// Returns a human-readable description of `rev`, or an empty string
    /// if there is none.
    pub fn describe(&self, dir: &Utf8Path, rev: &str) -> String {
        match self.run(dir, self.templates.describe, &[(REV, rev)], false) {
            Ok(out) => String::from_utf8_lossy(&out).trim().to_owned(),
            Err(_) => String::new(),
        }
    }

    /// Returns true if the working tree at `dir` differs from `rev`, or if
    /// that could not be determined.
    pub fn is_dirty(&self, dir: &Utf8Path, rev: &str) -> bool {
        match self.run(dir, self.templates.diff, &[(REV, rev)], true) {
            Ok(out) => !out.is_empty(),
            Err(_) => true,
        }
    }

    /// Runs an expanded template in `dir`, returning stdout followed by
    /// stderr.
    ///
    /// Failures are logged with the command line and its output; when
    /// `verbose` is false they are logged at debug level only.
    fn run(
        &self,
        dir: &Utf8Path,
        template: &str,
        vars: &[(&str, &str)],
        verbose: bool,
    ) -> Result<Vec<u8>, CommandError> {
        let args = expand_template(template, vars);
        let output = Command::new(&self.binary)
            .args(&args)
            .current_dir(dir)
            .output()
            .map_err(|source| {
                // A missing working directory also reports NotFound.
                if source.kind() == io::ErrorKind::NotFound && dir.is_dir() {
                    warn!("missing {} command", self.name);
                    CommandError::BackendUnavailable {
                        vcs_name: self.name,
                        binary_path: self.binary.clone(),
                    }
                } else {
                    CommandError::SpawnFailed {
                        vcs_name: self.name,
                        binary_path: self.binary.clone(),
                        dir: dir.to_owned(),
                        source,
                    }
                }
            })?;

        let mut combined = output.stdout;
        combined.extend_from_slice(&output.stderr);

        if output.status.success() {
            return Ok(combined);
        }

        let command = format!("{} {}", self.binary, args.join(" "));
        let text = String::from_utf8_lossy(&combined).trim().to_owned();
        if verbose {
            warn!("# cd {dir}; {command}\n{text}");
        } else {
            debug!("# cd {dir}; {command}\n{text}");
        }
        Err(CommandError::Failed {
            vcs_name: self.name,
            command,
            dir: dir.to_owned(),
            exit_status: output.status.to_string(),
            output: text,
        })
    }
}

/// A repository root together with the backend that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository<'a> {
    backend: &'a Backend,
    root_dir: Utf8PathBuf,
    root: String,
}

impl<'a> Repository<'a> {
    /// Returns the backend that owns the repository.
    pub fn backend(&self) -> &'a Backend {
        self.backend
    }

    /// Returns the directory at the top of the repository.
    pub fn root_dir(&self) -> &Utf8Path {
        &self.root_dir
    }

    /// Returns the import path of the repository root, relative to the
    /// source root it was detected under.
    pub fn root(&self) -> &str {
        &self.root
    }
}

/// The registered backends, keyed by VCS.
///
/// Construct once with [`Backends::from_env`] and share by reference; the
/// registry is never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backends {
    backends: Vec<Backend>,
}

impl Backends {
    /// Registers Git, Mercurial and Bazaar, reading `$GIT`, `$HG` and
    /// `$BZR` for their executables.
    pub fn from_env() -> Result<Self, VcsEnvError> {
        Ok(Backends {
            backends: vec![Backend::git()?, Backend::hg()?, Backend::bzr()?],
        })
    }

    /// Registers exactly the given backends.
    pub fn new(backends: impl IntoIterator<Item = Backend>) -> Self {
        Backends { backends: backends.into_iter().collect() }
    }

    /// Returns the backend registered for `name`, if any.
    pub fn get(&self, name: VcsName) -> Option<&Backend> {
        self.backends.iter().find(|b| b.name == name)
    }

    /// Determines which VCS owns `dir` and where its repository root is.
    ///
    /// `src_root` is the directory import paths are relative to. The
    /// search walks up from `dir` and stops before reaching `src_root`; at
    /// each level the systems in [`VcsName::ALL`] are checked in order.
    ///
    /// Fails with [`VcsDetectError::Unsupported`] if the owning VCS has no
    /// registered backend.
    pub fn detect(
        &self,
        dir: &Utf8Path,
        src_root: &Utf8Path,
    ) -> Result<Repository<'_>, VcsDetectError> {
        // Use metadata() to distinguish "not a directory" from I/O
        // errors (e.g., permission denied).
        match fs::metadata(dir) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(VcsDetectError::NotADirectory {
                    dir: dir.to_owned(),
                });
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(VcsDetectError::PathNotFound {
                    dir: dir.to_owned(),
                });
            }
            Err(err) => {
                return Err(VcsDetectError::Io {
                    path: dir.to_owned(),
                    source: err,
                });
            }
        }

        let outside = || VcsDetectError::OutsideSourceRoot {
            dir: dir.to_owned(),
            src_root: src_root.to_owned(),
        };
        match dir.strip_prefix(src_root) {
            Ok(rel) if !rel.as_str().is_empty() => {}
            _ => return Err(outside()),
        }

        let mut current = dir;
        while current.starts_with(src_root) && current != src_root {
            for name in VcsName::ALL {
                let marker = current.join(name.marker());
                match marker.try_exists() {
                    Ok(true) => {
                        return self.repository(name, current, src_root, dir);
                    }
                    Ok(false) => {}
                    Err(source) => {
                        return Err(VcsDetectError::Io { path: marker, source });
                    }
                }
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        Err(VcsDetectError::NotFound { dir: dir.to_owned() })
    }

    fn repository(
        &self,
        name: VcsName,
        root_dir: &Utf8Path,
        src_root: &Utf8Path,
        dir: &Utf8Path,
    ) -> Result<Repository<'_>, VcsDetectError> {
        let backend = self.get(name).ok_or_else(|| {
            VcsDetectError::Unsupported { vcs_name: name, dir: dir.to_owned() }
        })?;
        let rel = root_dir.strip_prefix(src_root).map_err(|_| {
            VcsDetectError::OutsideSourceRoot {
                dir: dir.to_owned(),
                src_root: src_root.to_owned(),
            }
        })?;
        let root = rel
            .components()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join("/");
        Ok(Repository { backend, root_dir: root_dir.to_owned(), root })
    }
}
