// Copyright 2026 Oxide Computer Company

//! Where a workspace keeps its manifest and vendor tree.

use camino::{Utf8Path, Utf8PathBuf};

/// The default name of the vendor directory.
pub const DEFAULT_VENDOR_DIR: &str = "vendor";

/// The name of the manifest file inside the vendor directory.
pub const MANIFEST_FILE: &str = "Deps.json";

/// Settings for one run against a workspace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    dir: Utf8PathBuf,
    vendor_dir: Utf8PathBuf,
}

impl Config {
    /// Creates a configuration for the project in `dir`, with the default
    /// vendor directory.
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Config { dir: dir.into(), vendor_dir: DEFAULT_VENDOR_DIR.into() }
    }

    /// Sets the vendor directory, relative to the project directory.
    pub fn with_vendor_dir(mut self, vendor_dir: impl Into<Utf8PathBuf>) -> Self {
        self.vendor_dir = vendor_dir.into();
        self
    }

    /// Returns the project directory.
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// Returns the vendor directory.
    pub fn vendor_path(&self) -> Utf8PathBuf {
        self.dir.join(&self.vendor_dir)
    }

    /// Returns the path to the manifest.
    pub fn manifest_path(&self) -> Utf8PathBuf {
        self.vendor_path().join(MANIFEST_FILE)
    }

    /// Returns the path element that marks a vendored import path, e.g.
    /// `vendor` in `a/vendor/b`.
    pub fn vendor_element(&self) -> &str {
        self.vendor_dir.file_name().unwrap_or(DEFAULT_VENDOR_DIR)
    }
}
