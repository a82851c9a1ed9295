// Copyright 2026 Oxide Computer Company

//! The package graph of a workspace, as reported by an external lister.

use crate::ListError;
use camino::{Utf8Path, Utf8PathBuf};
use pinvend_vcs::{VcsEnvError, read_binary_env};
use serde::Deserialize;
use std::process::Command;
use tracing::debug;

/// One package reported by a [`PackageLister`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PackageInfo {
    /// The import path.
    pub import_path: String,
    /// The directory holding the package sources.
    pub dir: Utf8PathBuf,
    /// The workspace root the package was found in: the directory that
    /// contains `src`.
    pub root: Utf8PathBuf,
    /// True for packages of the standard library.
    pub standard: bool,
    /// An error loading this package, if any.
    pub error: Option<String>,
    /// Every package the package imports, directly or indirectly.
    pub deps: Vec<String>,
    /// Packages imported by the package's in-package tests.
    pub test_imports: Vec<String>,
    /// Packages imported by the package's external tests.
    pub xtest_imports: Vec<String>,
}

impl PackageInfo {
    /// Returns the directory import paths are resolved against:
    /// `<root>/src`.
    pub fn src_root(&self) -> Utf8PathBuf {
        self.root.join("src")
    }
}

/// Lists packages and their transitive imports.
pub trait PackageLister {
    /// Lists the packages matching `patterns`.
    ///
    /// A package that cannot be loaded is still returned, with
    /// [`PackageInfo::error`] set. An empty pattern list yields no
    /// packages rather than a default set.
    fn list(&self, patterns: &[String]) -> Result<Vec<PackageInfo>, ListError>;

    /// Returns the version of the build tool, for the manifest.
    fn tool_version(&self) -> Result<String, ListError>;
}

impl<L: PackageLister + ?Sized> PackageLister for &L {
    fn list(&self, patterns: &[String]) -> Result<Vec<PackageInfo>, ListError> {
        (**self).list(patterns)
    }

    fn tool_version(&self) -> Result<String, ListError> {
        (**self).tool_version()
    }
}

/// A [`PackageLister`] backed by `go list`.
///
/// The executable is read from `$GO`, defaulting to `go`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GoList {
    binary: String,
    dir: Utf8PathBuf,
}

impl GoList {
    /// Creates a lister that runs in `dir`, reading `$GO` for the
    /// executable.
    pub fn from_env(dir: impl Into<Utf8PathBuf>) -> Result<Self, VcsEnvError> {
        Ok(GoList::with_binary(read_binary_env("GO", "go")?, dir))
    }

    /// Creates a lister that runs `binary` in `dir`.
    pub fn with_binary(
        binary: impl Into<String>,
        dir: impl Into<Utf8PathBuf>,
    ) -> Self {
        GoList { binary: binary.into(), dir: dir.into() }
    }

    /// Returns the directory the lister runs in.
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    fn run(&self, args: &[&str]) -> Result<Vec<u8>, ListError> {
        let command = format!("{} {}", self.binary, args.join(" "));
        debug!(dir = %self.dir, "{command}");
        let output = Command::new(&self.binary)
            .args(args)
            .current_dir(&self.dir)
            .output()
            .map_err(|source| ListError::Spawn {
                binary: self.binary.clone(),
                dir: self.dir.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ListError::Failed {
                command,
                dir: self.dir.clone(),
                exit_status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr)
                    .trim()
                    .to_owned(),
            });
        }
        if !output.stderr.is_empty() {
            debug!("{}", String::from_utf8_lossy(&output.stderr).trim());
        }
        Ok(output.stdout)
    }
}

impl PackageLister for GoList {
    fn list(&self, patterns: &[String]) -> Result<Vec<PackageInfo>, ListError> {
        if patterns.is_empty() {
            return Ok(Vec::new());
        }
        let mut args = vec!["list", "-e", "-json"];
        args.extend(patterns.iter().map(String::as_str));
        let stdout = self.run(&args)?;
        Ok(parse_list_output(&stdout))
    }

    fn tool_version(&self) -> Result<String, ListError> {
        let stdout = self.run(&["version"])?;
        let output = String::from_utf8_lossy(&stdout);
        match parse_tool_version(&output) {
            Some(version) => Ok(version.to_owned()),
            None => Err(ListError::UnexpectedOutput {
                command: format!("{} version", self.binary),
                output: output.into_owned(),
            }),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct GoPackage {
    import_path: String,
    dir: String,
    root: String,
    standard: bool,
    error: Option<GoPackageError>,
    deps: Vec<String>,
    test_imports: Vec<String>,
    #[serde(rename = "XTestImports")]
    xtest_imports: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GoPackageError {
    #[serde(rename = "Err")]
    err: String,
}

impl From<GoPackage> for PackageInfo {
    fn from(p: GoPackage) -> Self {
        PackageInfo {
            import_path: p.import_path,
            dir: p.dir.into(),
            root: p.root.into(),
            standard: p.standard,
            error: p.error.map(|e| e.err).filter(|e| !e.is_empty()),
            deps: p.deps,
            test_imports: p.test_imports,
            xtest_imports: p.xtest_imports,
        }
    }
}

/// Decodes the stream of JSON objects printed by `go list -json`.
///
/// A decoding error ends the stream and is reported as one final package
/// carrying the error.
fn parse_list_output(stdout: &[u8]) -> Vec<PackageInfo> {
    let mut packages = Vec::new();
    let stream =
        serde_json::Deserializer::from_slice(stdout).into_iter::<GoPackage>();
    for package in stream {
        match package {
            Ok(package) => packages.push(package.into()),
            Err(error) => {
                packages.push(PackageInfo {
                    error: Some(error.to_string()),
                    ..Default::default()
                });
                break;
            }
        }
    }
    packages
}

/// Extracts the version from `go version` output, e.g. `go1.22.1` from
/// `go version go1.22.1 linux/amd64`.
fn parse_tool_version(output: &str) -> Option<&str> {
    output.split_whitespace().nth(2)
}
