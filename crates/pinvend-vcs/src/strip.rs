// Copyright 2026 Oxide Computer Company

//! Removal of canonical import path annotations from copied sources.
//!
//! A package clause may carry an annotation naming the package's canonical
//! import path:
//!
//! ```text
//! package foo // import "example.com/foo"
//! package foo /* import "example.com/foo" */
//! ```
//!
//! Once a package has been copied into a vendor tree the annotation names
//! the wrong path, so it is removed while copying.

use camino::Utf8Path;
use lazy_static::lazy_static;
use regex::bytes::Regex;
use std::{
    borrow::Cow,
    io::{self, BufRead, Write},
};

/// Files with this extension have their import annotations stripped.
pub const SOURCE_EXTENSION: &str = "go";

const PACKAGE_PREFIX: &[u8] = b"package ";

lazy_static! {
    static ref IMPORT_COMMENT: Regex = {
        let annotation = r#"import\s+(?:"[^"]*"|`[^`]*`)"#;
        let comment =
            format!(r"(?://\s*{annotation}\s*$|/\*\s*{annotation}\s*\*/)");
        Regex::new(&format!(r"(?-u)^\s*(package\s+\w+)\s+{comment}(.*)$"))
            .expect("import comment pattern is valid")
    };
}

/// Returns true if `path` is a source file whose annotations should be
/// stripped.
pub fn is_source_file(path: &Utf8Path) -> bool {
    path.extension() == Some(SOURCE_EXTENSION)
}

/// Returns `line` with its import annotation removed.
///
/// `line` must not include its terminating newline. Lines that are not a
/// package clause followed by an annotation are returned unaltered. A
/// line comment must be the rest of the line; code after a block comment
/// is kept.
///
/// ```
/// use pinvend_vcs::strip_import_comment;
///
/// let s = |l: &str| String::from_utf8(strip_import_comment(l.as_bytes()).into_owned()).unwrap();
/// assert_eq!(s(r#"package foo // import "bar/foo""#), "package foo");
/// assert_eq!(s(r#"package foo /* import "bar/foo" */; var x int"#), "package foo; var x int");
/// assert_eq!(s(r#"package foo // import "bar/foo" garbage"#), r#"package foo // import "bar/foo" garbage"#);
/// ```
pub fn strip_import_comment(line: &[u8]) -> Cow<'_, [u8]> {
    // Nearly every line fails this check. Leading whitespace before the
    // keyword is not expected.
    if !line.starts_with(PACKAGE_PREFIX) {
        return Cow::Borrowed(line);
    }
    match IMPORT_COMMENT.captures(line) {
        Some(caps) => {
            let mut out = caps[1].to_vec();
            out.extend_from_slice(&caps[2]);
            Cow::Owned(out)
        }
        None => Cow::Borrowed(line),
    }
}

/// Copies `r` to `w` line by line, stripping import annotations.
///
/// Every line written is terminated with a newline, including a final
/// line that had none.
pub fn copy_without_import_comment<R: BufRead, W: Write>(
    mut r: R,
    mut w: W,
) -> io::Result<()> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if r.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        let line = buf.strip_suffix(b"\n").unwrap_or(&buf);
        w.write_all(&strip_import_comment(line))?;
        w.write_all(b"\n")?;
    }
}
