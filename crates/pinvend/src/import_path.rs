// Copyright 2026 Oxide Computer Company

//! Helpers for slash-separated import paths.

/// Returns true if `path` is `prefix` or lies below it.
///
/// `"a"` contains `"a"` and `"a/b"`, but not `"ab"`.
pub fn is_path_prefix(prefix: &str, path: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Returns true if any of `prefixes` is `path` or a directory containing
/// it.
pub fn contains_path_prefix<S: AsRef<str>>(prefixes: &[S], path: &str) -> bool {
    prefixes.iter().any(|p| is_path_prefix(p.as_ref(), path))
}

/// Returns the part of `import_path` after the last `/<vendor>/` element,
/// i.e. the import path a vendored package had before it was copied.
///
/// ```
/// use pinvend::unqualify;
///
/// assert_eq!(unqualify("C", "vendor"), "C");
/// assert_eq!(unqualify("D/vendor/C", "vendor"), "C");
/// assert_eq!(unqualify("A/vendor/B/vendor/C/x", "vendor"), "C/x");
/// ```
pub fn unqualify<'a>(import_path: &'a str, vendor_dir: &str) -> &'a str {
    let sep = format!("/{vendor_dir}/");
    match import_path.rfind(&sep) {
        Some(i) => &import_path[i + sep.len()..],
        None => import_path,
    }
}
