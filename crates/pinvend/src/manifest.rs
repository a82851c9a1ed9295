// Copyright 2026 Oxide Computer Company

//! The persisted manifest.

use crate::{AtomicWriteError, Dependency, ManifestError};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use camino::Utf8Path;
use fs_err as fs;
use serde::{Deserialize, Deserializer, Serialize};
use std::io::{self, Write};

/// The reconciliation state for one workspace root.
///
/// A manifest is serialized as an indented JSON object with its
/// dependencies sorted by import path and a trailing newline, so that
/// rewriting an unchanged manifest produces identical bytes.
///
/// # Examples
///
/// ```
/// use pinvend::{Dependency, Manifest};
///
/// let mut manifest = Manifest::new("example.com/app");
/// manifest.deps.push(Dependency::new("example.com/z", "r2"));
/// manifest.deps.push(Dependency::new("example.com/a", "r1"));
///
/// let contents = manifest.to_file_contents().unwrap();
/// let a = contents.find("example.com/a").unwrap();
/// let z = contents.find("example.com/z").unwrap();
/// assert!(a < z);
/// assert!(contents.ends_with("}\n"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Manifest {
    /// The import path of the project that owns the manifest.
    #[serde(default)]
    pub import_path: String,

    /// The version of the build tool that produced the manifest.
    #[serde(default, rename = "GoVersion", alias = "ToolVersion")]
    pub tool_version: String,

    /// The explicit patterns the manifest was saved with, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub packages: Vec<String>,

    /// The pinned dependencies.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub deps: Vec<Dependency>,
}

/// Older writers emit `"Deps": null` for a manifest without dependencies.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Dependency>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Dependency>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Manifest {
    /// Creates an empty manifest for the project at `import_path`.
    pub fn new(import_path: impl Into<String>) -> Self {
        Manifest { import_path: import_path.into(), ..Default::default() }
    }

    /// Reads the manifest at `path`.
    ///
    /// A missing file is not an error: it yields an empty manifest.
    pub fn read(path: &Utf8Path) -> Result<Self, ManifestError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Ok(Manifest::default());
            }
            Err(error) => {
                return Err(ManifestError::Read {
                    path: path.to_owned(),
                    error,
                });
            }
        };
        Self::from_json(&contents).map_err(|error| ManifestError::Parse {
            path: path.to_owned(),
            error,
        })
    }

    /// Parses a manifest from JSON text.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Sorts the dependencies by import path.
    pub fn sort_deps(&mut self) {
        self.deps.sort_by(|a, b| a.import_path().cmp(b.import_path()));
    }

    /// Returns the dependency with the given import path, if present.
    pub fn dep(&self, import_path: &str) -> Option<&Dependency> {
        self.deps.iter().find(|d| d.import_path() == import_path)
    }

    /// Returns the canonical file contents: tab-indented JSON with sorted
    /// dependencies, terminated by a newline.
    pub fn to_file_contents(&self) -> Result<String, ManifestError> {
        let mut sorted = self.clone();
        sorted.sort_deps();

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        sorted.serialize(&mut ser).map_err(ManifestError::Encode)?;
        buf.push(b'\n');

        // serde_json only ever emits valid UTF-8.
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Atomically replaces the file at `path` with the canonical contents,
    /// creating parent directories as needed.
    pub fn write(&self, path: &Utf8Path) -> Result<(), ManifestError> {
        let contents = self.to_file_contents()?;

        if let Some(parent) = path.parent() {
            if !parent.as_str().is_empty() {
                fs::create_dir_all(parent).map_err(|error| {
                    ManifestError::CreateDir { path: parent.to_owned(), error }
                })?;
            }
        }

        AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
            .write(|f| f.write_all(contents.as_bytes()))
            .map_err(|error| ManifestError::Write {
                path: path.to_owned(),
                error: AtomicWriteError::from(error),
            })
    }
}
