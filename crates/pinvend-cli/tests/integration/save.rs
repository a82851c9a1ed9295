// Copyright 2026 Oxide Computer Company

use crate::fixture::{Scratch, TOOL_VERSION, decl, pkg, summary};
use anyhow::Result;
use pinvend::ConflictError;
use pinvend_cli::{Error, ResolveFailure};
use pinvend_vcs::{SyncError, SyncOperation};

/// Sets up the project `C`, importing `imports`.
fn project(scratch: &Scratch, imports: &[&str]) -> Result<()> {
    scratch.init_repo("C")?;
    scratch.write("C", "main.go", pkg("main", imports))?;
    scratch.commit("C", "")?;
    Ok(())
}

#[test]
fn test_save_simple() -> Result<()> {
    let scratch = Scratch::new()?;
    scratch.init_repo("D")?;
    scratch.write("D", "main.go", pkg("D", &[]) + &decl("D1"))?;
    let d1 = scratch.commit("D", "D1")?;
    project(&scratch, &["D"])?;

    let saved = scratch.workspace("C")?.save(&[])?;
    assert_eq!(saved.added.len(), 1);
    assert!(saved.removed.is_empty());

    let manifest = scratch.manifest("C")?;
    assert_eq!(manifest.import_path, "C");
    assert_eq!(manifest.tool_version, TOOL_VERSION);
    assert!(manifest.packages.is_empty(), "no explicit patterns were given");
    assert_eq!(summary(&manifest), [("D", "D1")]);
    assert_eq!(manifest.deps[0].rev(), d1);

    assert_eq!(scratch.vendored("C", "D/main.go")?, pkg("D", &[]) + &decl("D1"));
    assert!(scratch.is_vendored("C", "README"));

    Ok(())
}

#[test]
fn test_save_strip_import_comment() -> Result<()> {
    let scratch = Scratch::new()?;
    scratch.init_repo("D")?;
    scratch.write(
        "D",
        "main.go",
        "package D // import \"D\"\n".to_owned() + &decl("D1"),
    )?;
    scratch.commit("D", "D1")?;
    project(&scratch, &["D"])?;

    scratch.workspace("C")?.save(&[])?;

    assert_eq!(
        scratch.vendored("C", "D/main.go")?,
        "package D\n".to_owned() + &decl("D1")
    );

    Ok(())
}

#[test]
fn test_save_is_idempotent() -> Result<()> {
    let scratch = Scratch::new()?;
    scratch.init_repo("D")?;
    scratch.write("D", "main.go", pkg("D", &[]) + &decl("D1"))?;
    scratch.commit("D", "D1")?;
    project(&scratch, &["D"])?;

    let workspace = scratch.workspace("C")?;
    workspace.save(&[])?;
    let first = scratch.manifest_bytes("C").expect("manifest written");
    let vendored = scratch.vendored("C", "D/main.go")?;

    let again = workspace.save(&[])?;
    assert!(again.added.is_empty() && again.removed.is_empty());
    assert_eq!(
        scratch.manifest_bytes("C").expect("manifest written"),
        first,
        "second save should produce a byte-identical manifest"
    );
    assert_eq!(scratch.vendored("C", "D/main.go")?, vendored);

    Ok(())
}

#[test]
fn test_save_transitive_dependency() -> Result<()> {
    let scratch = Scratch::new()?;
    scratch.init_repo("E")?;
    scratch.write("E", "main.go", pkg("E", &[]) + &decl("E1"))?;
    scratch.commit("E", "E1")?;
    scratch.init_repo("D")?;
    scratch.write("D", "main.go", pkg("D", &["E"]) + &decl("D1"))?;
    scratch.commit("D", "D1")?;
    project(&scratch, &["D"])?;

    scratch.workspace("C")?.save(&[])?;

    assert_eq!(summary(&scratch.manifest("C")?), [("D", "D1"), ("E", "E1")]);
    assert!(scratch.is_vendored("C", "D/main.go"));
    assert!(scratch.is_vendored("C", "E/main.go"));

    Ok(())
}

#[test]
fn test_save_skips_own_repository_and_standard_library() -> Result<()> {
    let scratch = Scratch::new()?;
    scratch.init_repo("D")?;
    scratch.write("D", "main.go", pkg("D", &["fmt"]) + &decl("D1"))?;
    scratch.commit("D", "D1")?;
    scratch.init_repo("C")?;
    scratch.write("C", "main.go", pkg("main", &["C/util", "D", "os"]))?;
    scratch.write("C", "util/util.go", pkg("util", &["strings"]))?;
    scratch.commit("C", "")?;

    scratch.workspace("C")?.save(&[])?;

    assert_eq!(summary(&scratch.manifest("C")?), [("D", "D1")]);
    assert!(!scratch.is_vendored("C", "C"));

    Ok(())
}

#[test]
fn test_save_includes_test_imports() -> Result<()> {
    let scratch = Scratch::new()?;
    scratch.init_repo("T")?;
    scratch.write("T", "assert.go", pkg("T", &[]) + &decl("T1"))?;
    scratch.commit("T", "T1")?;
    scratch.init_repo("C")?;
    scratch.write("C", "main.go", pkg("main", &[]))?;
    scratch.write("C", "main_test.go", pkg("main", &["T", "testing"]))?;
    scratch.commit("C", "")?;

    scratch.workspace("C")?.save(&[])?;

    assert_eq!(summary(&scratch.manifest("C")?), [("T", "T1")]);

    Ok(())
}

#[test]
fn test_save_subpackage_covered_by_parent() -> Result<()> {
    let scratch = Scratch::new()?;
    scratch.init_repo("D")?;
    scratch.write("D", "main.go", pkg("D", &["D/A"]) + &decl("D1"))?;
    scratch.write("D", "A/main.go", pkg("A", &[]) + &decl("A1"))?;
    scratch.commit("D", "D1")?;
    project(&scratch, &["D"])?;

    scratch.workspace("C")?.save(&[])?;

    assert_eq!(summary(&scratch.manifest("C")?), [("D", "D1")]);
    assert!(
        scratch.is_vendored("C", "D/A/main.go"),
        "subpackage is copied as part of its parent"
    );

    Ok(())
}

#[cfg(unix)]
#[test]
fn test_save_symlink() -> Result<()> {
    let scratch = Scratch::new()?;
    scratch.init_repo("D")?;
    scratch.write("D", "main.go", pkg("D", &[]) + &decl("D1"))?;
    std::os::unix::fs::symlink("main.go", scratch.src("D").join("alias.go"))?;
    scratch.commit("D", "D1")?;
    project(&scratch, &["D"])?;

    scratch.workspace("C")?.save(&[])?;

    let link = scratch.src("C").join("vendor/D/alias.go");
    assert!(std::fs::symlink_metadata(&link)?.file_type().is_symlink());
    assert_eq!(std::fs::read_link(&link)?, std::path::Path::new("main.go"));

    Ok(())
}

#[test]
fn test_save_add_keeps_recorded_version() -> Result<()> {
    let scratch = Scratch::new()?;
    scratch.init_repo("D")?;
    scratch.write("D", "main.go", pkg("D", &[]) + &decl("D1"))?;
    let d1 = scratch.commit("D", "D1")?;
    scratch.init_repo("E")?;
    scratch.write("E", "main.go", pkg("E", &[]) + &decl("E1"))?;
    scratch.commit("E", "E1")?;
    project(&scratch, &["D"])?;
    scratch.workspace("C")?.save(&[])?;

    // D moves on, and C starts importing E.
    scratch.write("D", "main.go", pkg("D", &[]) + &decl("D2"))?;
    scratch.commit("D", "D2")?;
    scratch.write("C", "main.go", pkg("main", &["D", "E"]))?;
    scratch.commit("C", "")?;

    let saved = scratch.workspace("C")?.save(&[])?;
    assert_eq!(saved.added.len(), 1);
    assert_eq!(saved.added[0].import_path(), "E");

    let manifest = scratch.manifest("C")?;
    assert_eq!(summary(&manifest), [("D", "D1"), ("E", "E1")]);
    assert_eq!(manifest.dep("D").map(|d| d.rev()), Some(d1.as_str()));
    assert_eq!(
        scratch.vendored("C", "D/main.go")?,
        pkg("D", &[]) + &decl("D1"),
        "kept dependencies are not copied again"
    );

    Ok(())
}

#[test]
fn test_save_remove_keeps_other_version() -> Result<()> {
    let scratch = Scratch::new()?;
    scratch.init_repo("D")?;
    scratch.write("D", "main.go", pkg("D", &[]) + &decl("D1"))?;
    scratch.commit("D", "D1")?;
    scratch.init_repo("E")?;
    scratch.write("E", "main.go", pkg("E", &[]) + &decl("E1"))?;
    scratch.commit("E", "E1")?;
    project(&scratch, &["D", "E"])?;
    scratch.workspace("C")?.save(&[])?;
    assert!(scratch.is_vendored("C", "E/main.go"));

    scratch.write("D", "main.go", pkg("D", &[]) + &decl("D2"))?;
    scratch.commit("D", "D2")?;
    scratch.write("C", "main.go", pkg("main", &["D"]))?;
    scratch.commit("C", "")?;

    let saved = scratch.workspace("C")?.save(&[])?;
    assert!(saved.added.is_empty());
    assert_eq!(saved.removed.len(), 1);

    assert_eq!(summary(&scratch.manifest("C")?), [("D", "D1")]);
    assert!(!scratch.is_vendored("C", "E"), "E should be removed");
    assert_eq!(scratch.vendored("C", "D/main.go")?, pkg("D", &[]) + &decl("D1"));

    Ok(())
}

#[test]
fn test_save_add_from_same_repository() -> Result<()> {
    let scratch = Scratch::new()?;
    scratch.init_repo("D")?;
    scratch.write("D", "A/main.go", pkg("A", &[]) + &decl("A1"))?;
    scratch.write("D", "B/main.go", pkg("B", &[]) + &decl("B1"))?;
    scratch.commit("D", "D1")?;
    project(&scratch, &["D/A"])?;
    scratch.workspace("C")?.save(&[])?;

    scratch.write("C", "main.go", pkg("main", &["D/A", "D/B"]))?;
    scratch.commit("C", "")?;
    scratch.workspace("C")?.save(&[])?;

    assert_eq!(summary(&scratch.manifest("C")?), [("D/A", "D1"), ("D/B", "D1")]);
    assert!(scratch.is_vendored("C", "D/B/main.go"));

    Ok(())
}

#[test]
fn test_save_conflicting_revisions() -> Result<()> {
    let scratch = Scratch::new()?;
    scratch.init_repo("D")?;
    scratch.write("D", "A/main.go", pkg("A", &[]) + &decl("A1"))?;
    scratch.write("D", "B/main.go", pkg("B", &[]) + &decl("B1"))?;
    scratch.commit("D", "D1")?;
    project(&scratch, &["D/A"])?;
    scratch.workspace("C")?.save(&[])?;
    let before = scratch.manifest_bytes("C").expect("manifest written");

    // D/A stays pinned at D1, but D/B would be added at D2.
    scratch.write("D", "A/main.go", pkg("A", &[]) + &decl("A2"))?;
    scratch.write("D", "B/main.go", pkg("B", &[]) + &decl("B2"))?;
    scratch.commit("D", "D2")?;
    scratch.write("C", "main.go", pkg("main", &["D/A", "D/B"]))?;
    scratch.commit("C", "")?;

    let result = scratch.workspace("C")?.save(&[]);
    assert!(
        matches!(
            &result,
            Err(Error::Conflict(ConflictError::ConflictingRevisions {
                first,
                second,
                ..
            })) if first == "D/A" && second == "D/B"
        ),
        "expected a conflict, got {result:?}"
    );
    assert_eq!(scratch.manifest_bytes("C"), Some(before));
    assert!(!scratch.is_vendored("C", "D/B"));

    Ok(())
}

#[test]
fn test_save_replace_with_parent() -> Result<()> {
    let scratch = Scratch::new()?;
    scratch.init_repo("D")?;
    scratch.write("D", "main.go", pkg("D", &[]) + &decl("D1"))?;
    scratch.write("D", "A/main.go", pkg("A", &[]) + &decl("A1"))?;
    scratch.commit("D", "D1")?;
    project(&scratch, &["D/A"])?;
    scratch.workspace("C")?.save(&[])?;
    assert_eq!(summary(&scratch.manifest("C")?), [("D/A", "D1")]);

    scratch.write("C", "main.go", pkg("main", &["D"]))?;
    scratch.commit("C", "")?;
    scratch.workspace("C")?.save(&[])?;

    assert_eq!(summary(&scratch.manifest("C")?), [("D", "D1")]);
    assert!(scratch.is_vendored("C", "D/main.go"));
    assert!(scratch.is_vendored("C", "D/A/main.go"));

    Ok(())
}

#[test]
fn test_save_replace_with_parent_at_new_revision() -> Result<()> {
    let scratch = Scratch::new()?;
    scratch.init_repo("D")?;
    scratch.write("D", "main.go", pkg("D", &[]) + &decl("D1"))?;
    scratch.write("D", "A/main.go", pkg("A", &[]) + &decl("A1"))?;
    scratch.commit("D", "D1")?;
    project(&scratch, &["D/A"])?;
    scratch.workspace("C")?.save(&[])?;

    scratch.write("D", "main.go", pkg("D", &[]) + &decl("D2"))?;
    scratch.write("D", "A/main.go", pkg("A", &[]) + &decl("A2"))?;
    scratch.commit("D", "D2")?;
    scratch.write("C", "main.go", pkg("main", &["D"]))?;
    scratch.commit("C", "")?;
    scratch.workspace("C")?.save(&[])?;

    // D/A is no longer imported directly, so D takes over at the revision
    // checked out now.
    assert_eq!(summary(&scratch.manifest("C")?), [("D", "D2")]);
    assert_eq!(
        scratch.vendored("C", "D/A/main.go")?,
        pkg("A", &[]) + &decl("A2")
    );

    Ok(())
}

#[test]
fn test_save_replace_with_child() -> Result<()> {
    let scratch = Scratch::new()?;
    scratch.init_repo("D")?;
    scratch.write("D", "main.go", pkg("D", &[]) + &decl("D1"))?;
    scratch.write("D", "A/main.go", pkg("A", &[]) + &decl("A1"))?;
    scratch.commit("D", "D1")?;
    project(&scratch, &["D"])?;
    scratch.workspace("C")?.save(&[])?;
    assert!(scratch.is_vendored("C", "D/main.go"));

    scratch.write("C", "main.go", pkg("main", &["D/A"]))?;
    scratch.commit("C", "")?;
    scratch.workspace("C")?.save(&[])?;

    assert_eq!(summary(&scratch.manifest("C")?), [("D/A", "D1")]);
    assert!(!scratch.is_vendored("C", "D/main.go"));
    assert_eq!(
        scratch.vendored("C", "D/A/main.go")?,
        pkg("A", &[]) + &decl("A1")
    );

    Ok(())
}

#[test]
fn test_save_copies_after_failed_removal() -> Result<()> {
    let scratch = Scratch::new()?;
    scratch.init_repo("D")?;
    scratch.write("D", "A/main.go", pkg("A", &[]) + &decl("A1"))?;
    scratch.commit("D", "D1")?;
    scratch.init_repo("E")?;
    scratch.write("E", "main.go", pkg("E", &[]) + &decl("E1"))?;
    scratch.commit("E", "E1")?;
    project(&scratch, &["D/A"])?;
    scratch.workspace("C")?.save(&[])?;
    assert!(scratch.is_vendored("C", "D/A/main.go"));

    // A file in place of vendor/D makes removing vendor/D/A fail.
    let vendor_d = scratch.src("C").join("vendor/D");
    std::fs::remove_dir_all(&vendor_d)?;
    std::fs::write(&vendor_d, "not a directory\n")?;

    scratch.write("C", "main.go", pkg("main", &["E"]))?;
    scratch.commit("C", "")?;
    let result = scratch.workspace("C")?.save(&[]);

    match &result {
        Err(Error::Sync(SyncError::Incomplete { failures })) => {
            assert_eq!(failures.len(), 1, "only the removal should fail");
            assert_eq!(failures[0].operation, SyncOperation::Remove);
        }
        other => panic!("expected an incomplete sync, got {other:?}"),
    }
    assert_eq!(summary(&scratch.manifest("C")?), [("E", "E1")]);
    assert_eq!(
        scratch.vendored("C", "E/main.go")?,
        pkg("E", &[]) + &decl("E1"),
        "E is copied even though D/A could not be removed"
    );

    Ok(())
}

#[test]
fn test_save_removes_stale_file() -> Result<()> {
    let scratch = Scratch::new()?;
    scratch.init_repo("D")?;
    scratch.write("D", "main.go", pkg("D", &[]) + &decl("D1"))?;
    scratch.commit("D", "D1")?;
    scratch.init_repo("E")?;
    scratch.write("E", "main.go", pkg("E", &[]) + &decl("E1"))?;
    scratch.commit("E", "E1")?;
    project(&scratch, &["D"])?;
    scratch.workspace("C")?.save(&[])?;

    // The vendored copy of D has been replaced by a plain file.
    let vendor_d = scratch.src("C").join("vendor/D");
    std::fs::remove_dir_all(&vendor_d)?;
    std::fs::write(&vendor_d, "not a directory\n")?;

    scratch.write("C", "main.go", pkg("main", &["E"]))?;
    scratch.commit("C", "")?;
    scratch.workspace("C")?.save(&[])?;

    assert_eq!(summary(&scratch.manifest("C")?), [("E", "E1")]);
    assert!(!vendor_d.exists(), "the stale file should be removed");
    assert!(scratch.is_vendored("C", "E/main.go"));

    Ok(())
}

#[test]
fn test_save_dirty_dependency() -> Result<()> {
    let scratch = Scratch::new()?;
    scratch.init_repo("D")?;
    scratch.write("D", "main.go", pkg("D", &[]) + &decl("D1"))?;
    scratch.commit("D", "D1")?;
    scratch.write("D", "main.go", pkg("D", &[]) + &decl("uncommitted"))?;
    project(&scratch, &["D"])?;

    let result = scratch.workspace("C")?.save(&[]);
    assert!(
        matches!(
            &result,
            Err(Error::DirtyWorkingTree { import_path, .. }) if import_path == "D"
        ),
        "expected a dirty working tree, got {result:?}"
    );
    assert_eq!(scratch.manifest_bytes("C"), None, "nothing should be written");
    assert!(!scratch.is_vendored("C", "D"));

    Ok(())
}

#[test]
fn test_save_reports_every_failure() -> Result<()> {
    let scratch = Scratch::new()?;
    scratch.init_repo("D")?;
    scratch.write("D", "main.go", pkg("D", &[]) + &decl("D1"))?;
    scratch.commit("D", "D1")?;
    // X does not exist and Y is not under version control.
    scratch.write("Y", "main.go", pkg("Y", &[]))?;
    project(&scratch, &["D", "X", "Y"])?;

    let result = scratch.workspace("C")?.save(&[]);
    match result {
        Err(Error::ResolutionFailed { failures }) => {
            let paths: Vec<_> = failures.iter().map(|f| f.import_path()).collect();
            assert_eq!(paths, ["X", "Y"]);
            assert!(matches!(failures[0], ResolveFailure::Package { .. }));
            assert!(matches!(failures[1], ResolveFailure::Detect { .. }));
        }
        other => panic!("expected a resolution failure, got {other:?}"),
    }
    assert_eq!(scratch.manifest_bytes("C"), None, "nothing should be written");

    Ok(())
}

#[test]
fn test_save_records_patterns() -> Result<()> {
    let scratch = Scratch::new()?;
    scratch.init_repo("D")?;
    scratch.write("D", "main.go", pkg("D", &[]) + &decl("D1"))?;
    scratch.commit("D", "D1")?;
    scratch.init_repo("E")?;
    scratch.write("E", "main.go", pkg("E", &[]) + &decl("E1"))?;
    scratch.commit("E", "E1")?;
    scratch.init_repo("C")?;
    scratch.write("C", "main.go", pkg("main", &["D"]))?;
    scratch.write("C", "tools/tools.go", pkg("tools", &["E"]))?;
    scratch.commit("C", "")?;

    let workspace = scratch.workspace("C")?;
    workspace.save(&[".".to_owned()])?;
    let manifest = scratch.manifest("C")?;
    assert_eq!(manifest.packages, ["."]);
    assert_eq!(summary(&manifest), [("D", "D1")]);

    // A later save without patterns reuses the recorded ones.
    workspace.save(&[])?;
    assert_eq!(summary(&scratch.manifest("C")?), [("D", "D1")]);

    workspace.save(&["./...".to_owned()])?;
    let manifest = scratch.manifest("C")?;
    assert_eq!(manifest.packages, ["./..."]);
    assert_eq!(summary(&manifest), [("D", "D1"), ("E", "E1")]);

    Ok(())
}
