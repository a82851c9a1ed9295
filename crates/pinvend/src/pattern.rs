// Copyright 2026 Oxide Computer Company

//! Selection patterns over import paths.

use std::fmt;

/// The wildcard token. It matches any string, including one containing
/// slashes.
pub const WILDCARD: &str = "...";

/// A compiled selection pattern.
///
/// Matching is anchored at both ends. The only special token is `...`,
/// which matches any string; every other character is literal. As a
/// special case, a pattern ending in `/...` also matches the path before
/// the slash, so `a/...` selects `a` itself as well as everything below
/// it.
///
/// # Examples
///
/// ```
/// use pinvend::Pattern;
///
/// let pattern = Pattern::new("example.com/lib/...");
/// assert!(pattern.matches("example.com/lib"));
/// assert!(pattern.matches("example.com/lib/sub"));
/// assert!(!pattern.matches("example.com/library"));
///
/// let exact = Pattern::new("example.com/lib");
/// assert!(!exact.matches("example.com/lib/sub"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    raw: String,
    pieces: Vec<String>,
    // For patterns ending in "/...": the pieces of the pattern with that
    // suffix removed.
    bare: Option<Vec<String>>,
}

impl Pattern {
    /// Compiles `pattern`.
    pub fn new(pattern: impl Into<String>) -> Self {
        let raw = pattern.into();
        let pieces = split_pieces(&raw);
        let bare = raw
            .strip_suffix(WILDCARD)
            .and_then(|p| p.strip_suffix('/'))
            .map(split_pieces);
        Pattern { raw, pieces, bare }
    }

    /// Returns the pattern as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns true if `path` matches the pattern in its entirety.
    pub fn matches(&self, path: &str) -> bool {
        matches_pieces(&self.pieces, path)
            || self.bare.as_deref().is_some_and(|b| matches_pieces(b, path))
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for Pattern {
    fn from(s: &str) -> Self {
        Pattern::new(s)
    }
}

fn split_pieces(pattern: &str) -> Vec<String> {
    pattern.split(WILDCARD).map(str::to_owned).collect()
}

/// Literal pieces separated by wildcards. The first piece is anchored at
/// the start, the last at the end, and the rest are found left to right
/// in between.
fn matches_pieces(pieces: &[String], path: &str) -> bool {
    let (first, rest) = match pieces.split_first() {
        Some(split) => split,
        None => return path.is_empty(),
    };
    let Some((last, middle)) = rest.split_last() else {
        return path == first;
    };

    if path.len() < first.len() + last.len()
        || !path.starts_with(first.as_str())
        || !path.ends_with(last.as_str())
    {
        return false;
    }

    let mut window = &path[first.len()..path.len() - last.len()];
    for piece in middle {
        match window.find(piece.as_str()) {
            Some(i) => window = &window[i + piece.len()..],
            None => return false,
        }
    }
    true
}
