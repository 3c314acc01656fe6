//! End-to-end repository behavior against real on-disk fixtures.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use tana_repo::{QueryLanguage, RepoError, Repository, Resource, SqliteStore};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_base() -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = env::temp_dir().join(format!("tana-e2e-{}-{}", std::process::id(), id));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn cleanup(dir: &Path) {
    let _ = fs::remove_dir_all(dir);
}

/// `add` a directory, then address a file beneath it by virtual path.
#[test]
fn mapped_directory_exposes_its_files() -> Result<()> {
    let base = temp_base();
    fs::create_dir_all(base.join("fs/css"))?;
    fs::write(base.join("fs/css/main.css"), "body {}")?;

    let mut repo = Repository::transient(&base)?;
    repo.add("/app/css", Resource::directory(base.join("fs/css")))?;

    let resource = repo.get("/app/css/main.css")?;
    assert_eq!(resource.fs_path(), Some(base.join("fs/css/main.css").as_path()));
    assert_eq!(resource.virtual_path(), Some("/app/css/main.css"));
    assert!(resource.is_file());

    cleanup(&base);
    Ok(())
}

#[test]
fn listing_children_of_a_mapped_directory() -> Result<()> {
    let base = temp_base();
    fs::create_dir_all(base.join("fs/css"))?;
    fs::write(base.join("fs/css/main.css"), "body {}")?;

    let mut repo = Repository::transient(&base)?;
    repo.add("/app/css", Resource::directory(base.join("fs/css")))?;

    let children = repo.list_children("/app/css")?;
    assert_eq!(children.len(), 1);
    assert_eq!(children.virtual_paths(), vec!["/app/css/main.css"]);

    assert!(repo.has_children("/app/css")?);
    assert!(!repo.has_children("/app/css/main.css")?);

    cleanup(&base);
    Ok(())
}

/// A deeper mapping overrides the same subtree of a shallower one.
#[test]
fn deeper_mapping_wins_resolution() -> Result<()> {
    let base = temp_base();
    fs::create_dir_all(base.join("fs/app/config"))?;
    fs::create_dir_all(base.join("fs/override"))?;
    fs::write(base.join("fs/app/config/a.yml"), "shallow")?;
    fs::write(base.join("fs/override/a.yml"), "deep")?;

    let mut repo = Repository::transient(&base)?;
    repo.add("/app", Resource::directory(base.join("fs/app")))?;
    repo.add("/app/config", Resource::directory(base.join("fs/override")))?;

    let resource = repo.get("/app/config/a.yml")?;
    assert_eq!(
        resource.fs_path(),
        Some(base.join("fs/override/a.yml").as_path())
    );

    cleanup(&base);
    Ok(())
}

/// Links resolve through a second virtual lookup.
#[test]
fn link_resources_alias_virtual_paths() -> Result<()> {
    let base = temp_base();
    fs::create_dir_all(base.join("fs/css"))?;
    fs::write(base.join("fs/css/main.css"), "body {}")?;

    let mut repo = Repository::transient(&base)?;
    repo.add("/app/css", Resource::directory(base.join("fs/css")))?;
    repo.add("/link/x", Resource::link("/app/css/main.css"))?;

    let resource = repo.get("/link/x")?;
    assert_eq!(resource.fs_path(), Some(base.join("fs/css/main.css").as_path()));

    cleanup(&base);
    Ok(())
}

#[test]
fn recursive_glob_finds_all_matches_sorted() -> Result<()> {
    let base = temp_base();
    fs::create_dir_all(base.join("fs/css/theme"))?;
    fs::write(base.join("fs/css/main.css"), "")?;
    fs::write(base.join("fs/css/theme/dark.css"), "")?;
    fs::write(base.join("fs/css/theme/readme.txt"), "")?;

    let mut repo = Repository::transient(&base)?;
    repo.add("/app/css", Resource::directory(base.join("fs/css")))?;

    let sheets = repo.find("/app/**/*.css", QueryLanguage::Glob)?;
    assert_eq!(
        sheets.virtual_paths(),
        vec!["/app/css/main.css", "/app/css/theme/dark.css"]
    );

    assert!(repo.contains("/app/**/*.css", QueryLanguage::Glob)?);
    assert!(!repo.contains("/app/**/*.js", QueryLanguage::Glob)?);

    cleanup(&base);
    Ok(())
}

/// `find` over `/a/*` agrees with `list_children('/a')`.
#[test]
fn glob_and_listing_agree_on_direct_children() -> Result<()> {
    let base = temp_base();
    fs::create_dir_all(base.join("fs/app/theme"))?;
    fs::write(base.join("fs/app/main.css"), "")?;
    fs::write(base.join("fs/app/app.js"), "")?;

    let mut repo = Repository::transient(&base)?;
    repo.add("/app", Resource::directory(base.join("fs/app")))?;

    let found = repo.find("/app/*", QueryLanguage::Glob)?;
    let listed = repo.list_children("/app")?;
    assert_eq!(found.virtual_paths(), listed.virtual_paths());

    cleanup(&base);
    Ok(())
}

/// Removing inherited (non-mapping) matches is refused and changes nothing.
#[test]
fn remove_refuses_non_mapping_matches() -> Result<()> {
    let base = temp_base();
    fs::create_dir_all(base.join("fs/css"))?;
    fs::write(base.join("fs/css/main.css"), "")?;

    let mut repo = Repository::transient(&base)?;
    repo.add("/app/css", Resource::directory(base.join("fs/css")))?;

    let err = repo.remove("/app/css/main.css").unwrap_err();
    assert!(matches!(err, RepoError::UnsupportedOperation(_)));

    // The store is unchanged; the mapping still resolves.
    assert!(repo.get("/app/css/main.css").is_ok());

    // Removing the mapping itself succeeds.
    assert!(repo.remove("/app/css")? >= 1);
    assert!(repo.get("/app/css/main.css").is_err());

    cleanup(&base);
    Ok(())
}

#[test]
fn remove_reports_plural_offenders() -> Result<()> {
    let base = temp_base();
    fs::create_dir_all(base.join("fs/css"))?;
    fs::write(base.join("fs/css/a.css"), "")?;
    fs::write(base.join("fs/css/b.css"), "")?;

    let mut repo = Repository::transient(&base)?;
    repo.add("/app", Resource::directory(base.join("fs/css")))?;

    let err = repo.remove("/app/*").unwrap_err();
    match err {
        RepoError::UnsupportedOperation(msg) => assert!(msg.contains("2 matched")),
        other => panic!("expected UnsupportedOperation, got {other:?}"),
    }

    cleanup(&base);
    Ok(())
}

/// Most recent `add` wins; removal falls back to inherited resolution.
#[test]
fn target_stacks_are_lifo() -> Result<()> {
    let base = temp_base();
    fs::create_dir_all(base.join("fs/one"))?;
    fs::create_dir_all(base.join("fs/two"))?;

    let mut repo = Repository::transient(&base)?;
    repo.add("/app", Resource::directory(base.join("fs/one")))?;
    repo.add("/app", Resource::directory(base.join("fs/two")))?;

    assert_eq!(repo.get("/app")?.fs_path(), Some(base.join("fs/two").as_path()));

    repo.remove("/app")?;
    assert!(matches!(
        repo.get("/app"),
        Err(RepoError::ResourceNotFound(_))
    ));

    cleanup(&base);
    Ok(())
}

/// Re-adding an identical resource leaves the store unchanged.
#[test]
fn add_is_idempotent() -> Result<()> {
    let base = temp_base();
    fs::create_dir_all(base.join("fs/css"))?;

    let mut repo = Repository::transient(&base)?;
    repo.add("/app", Resource::directory(base.join("fs/css")))?;
    let before: Vec<_> = repo
        .mappings()?
        .into_iter()
        .map(|m| (m.virtual_path, m.targets))
        .collect();

    repo.add("/app", Resource::directory(base.join("fs/css")))?;
    let after: Vec<_> = repo
        .mappings()?
        .into_iter()
        .map(|m| (m.virtual_path, m.targets))
        .collect();

    assert_eq!(before, after);

    cleanup(&base);
    Ok(())
}

#[test]
fn unsupported_language_is_rejected_at_parse() {
    assert!(matches!(
        "sql".parse::<QueryLanguage>(),
        Err(RepoError::UnsupportedLanguage(_))
    ));
}

/// The whole pipeline works identically over the persistent store, and the
/// mappings survive a reopen.
#[test]
fn sqlite_backed_repository_round_trip() -> Result<()> {
    let base = temp_base();
    fs::create_dir_all(base.join("fs/css"))?;
    fs::write(base.join("fs/css/main.css"), "body {}")?;
    let db = base.join("state/mappings.db");

    {
        let store = SqliteStore::open(&db)?;
        let mut repo = Repository::new(&base, Box::new(store))?;
        repo.add("/app/css", Resource::directory(base.join("fs/css")))?;
        assert!(repo.get("/app/css/main.css").is_ok());
    }

    let store = SqliteStore::open(&db)?;
    let repo = Repository::new(&base, Box::new(store))?;
    let resource = repo.get("/app/css/main.css")?;
    assert_eq!(resource.fs_path(), Some(base.join("fs/css/main.css").as_path()));

    cleanup(&base);
    Ok(())
}

/// A file deleted between calls simply stops resolving.
#[test]
fn filesystem_is_probed_per_call() -> Result<()> {
    let base = temp_base();
    fs::create_dir_all(base.join("fs/css"))?;
    fs::write(base.join("fs/css/main.css"), "")?;

    let mut repo = Repository::transient(&base)?;
    repo.add("/app/css", Resource::directory(base.join("fs/css")))?;

    assert!(repo.get("/app/css/main.css").is_ok());
    fs::remove_file(base.join("fs/css/main.css"))?;
    assert!(repo.get("/app/css/main.css").is_err());

    cleanup(&base);
    Ok(())
}
