// Copyright 2026 Oxide Computer Company

use crate::helpers::{commit_all, git, init_git_repo, write_file};
use anyhow::Result;
use camino_tempfile::Utf8TempDir;
use pinvend_vcs::{Backend, Backends, CommandError, VcsName};

/// Sets up `<tmp>/src/example.com/lib` as a git repository with one commit.
/// Returns (temp_dir, commit_hash).
fn setup_lib_repo() -> Result<(Utf8TempDir, String)> {
    let temp = Utf8TempDir::with_prefix("pinvend-backend-")?;
    let repo = temp.path().join("src/example.com/lib");
    init_git_repo(&repo)?;
    write_file(repo.join("lib.go"), "package lib\n")?;
    let rev = commit_all(&repo, "initial")?;
    Ok((temp, rev))
}

#[test]
fn test_git_identify() -> Result<()> {
    let (temp, rev) = setup_lib_repo()?;
    let dir = temp.path().join("src/example.com/lib");

    let backend = Backend::git()?;
    assert_eq!(backend.identify(&dir)?, rev);

    Ok(())
}

#[test]
fn test_git_identify_outside_repository() -> Result<()> {
    let temp = Utf8TempDir::with_prefix("pinvend-backend-")?;
    let backend = Backend::git()?;

    let result = backend.identify(temp.path());
    assert!(
        matches!(result, Err(CommandError::Failed { vcs_name: VcsName::Git, .. })),
        "identify outside a repository should fail, got {result:?}"
    );

    Ok(())
}

#[test]
fn test_git_describe() -> Result<()> {
    let (temp, rev) = setup_lib_repo()?;
    let dir = temp.path().join("src/example.com/lib");
    let backend = Backend::git()?;

    assert_eq!(
        backend.describe(&dir, &rev),
        "",
        "describe without tags should be empty"
    );

    git(&dir, &["tag", "v1.0.0"])?;
    assert_eq!(backend.describe(&dir, &rev), "v1.0.0");

    Ok(())
}

#[test]
fn test_git_is_dirty() -> Result<()> {
    let (temp, rev) = setup_lib_repo()?;
    let dir = temp.path().join("src/example.com/lib");
    let backend = Backend::git()?;

    assert!(!backend.is_dirty(&dir, &rev), "fresh checkout should be clean");

    write_file(dir.join("lib.go"), "package lib\n\nvar X int\n")?;
    assert!(backend.is_dirty(&dir, &rev), "modified file should be dirty");

    Ok(())
}

#[test]
fn test_git_is_dirty_on_failure() -> Result<()> {
    let (temp, _) = setup_lib_repo()?;
    let dir = temp.path().join("src/example.com/lib");
    let backend = Backend::git()?;

    assert!(
        backend.is_dirty(&dir, "0000000000000000000000000000000000000000"),
        "a diff that cannot be computed counts as dirty"
    );

    Ok(())
}

#[test]
fn test_backend_unavailable() -> Result<()> {
    let (temp, _) = setup_lib_repo()?;
    let dir = temp.path().join("src/example.com/lib");
    let backend =
        Backend::with_binary(VcsName::Git, "pinvend-nonexistent-git-binary")
            .expect("git has templates");

    let result = backend.identify(&dir);
    assert!(
        matches!(
            result,
            Err(CommandError::BackendUnavailable { vcs_name: VcsName::Git, .. })
        ),
        "missing binary should be reported as unavailable, got {result:?}"
    );
    assert!(backend.is_dirty(&dir, "HEAD"));
    assert_eq!(backend.describe(&dir, "HEAD"), "");

    Ok(())
}

#[test]
fn test_detect_then_identify() -> Result<()> {
    let (temp, rev) = setup_lib_repo()?;
    let src_root = temp.path().join("src");
    let pkg = src_root.join("example.com/lib/sub/pkg");
    write_file(pkg.join("pkg.go"), "package pkg\n")?;

    let backends = Backends::from_env()?;
    let repo = backends.detect(&pkg, &src_root)?;
    assert_eq!(repo.backend().name(), VcsName::Git);
    assert_eq!(repo.root(), "example.com/lib");
    assert_eq!(repo.root_dir(), src_root.join("example.com/lib").as_path());

    // The new package is untracked, so the tree still matches the commit.
    assert_eq!(repo.backend().identify(&pkg)?, rev);
    assert!(!repo.backend().is_dirty(&pkg, &rev));

    Ok(())
}
