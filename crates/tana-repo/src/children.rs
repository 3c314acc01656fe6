//! Child enumeration: fusing on-disk listings with virtual mappings.
//!
//! Children of a virtual path come from two places:
//!
//! 1. entries of every on-disk directory the path resolves to, and
//! 2. mapping keys nested under the path.
//!
//! Virtual mappings override on-disk entries at the same virtual path, and a
//! deeper mapping's backing directory overrides a shallower one's. Results
//! are keyed by virtual path in a `BTreeMap`, which is also what gives the
//! deterministic lexicographic emission order; the filesystem iterator
//! itself guarantees none.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::RepoResult;
use crate::paths;
use crate::resolver::resolve;
use crate::store::KeyValueStore;

/// Direct (depth-1) children of `vpath`.
pub(crate) fn direct_children(
    store: &dyn KeyValueStore,
    base_dir: &Path,
    vpath: &str,
) -> RepoResult<BTreeMap<String, Option<PathBuf>>> {
    let mut children = BTreeMap::new();

    // On-disk entries under every resolved directory; the highest-priority
    // directory wins duplicate names.
    for dir in resolve(store, base_dir, vpath, false)?.into_iter().flatten() {
        if !dir.is_dir() {
            continue;
        }
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            children
                .entry(paths::join(vpath, &name))
                .or_insert_with(|| Some(entry.path()));
        }
    }

    // Direct mapping keys override on-disk entries of the same name.
    for key in store.keys()? {
        if let Some(rest) = paths::strip_base(vpath, &key) {
            if !rest.is_empty() && !rest.contains('/') {
                let backing = resolve(store, base_dir, &key, true)?.into_iter().next();
                children.insert(key, backing.flatten());
            }
        }
    }

    Ok(children)
}

/// All descendants of `vpath`, to any depth.
///
/// Descendant mappings are processed in ascending key order so that a deeper
/// mapping (and the walk of its backing directory) overrides whatever a
/// shallower one contributed at the same virtual path.
pub(crate) fn recursive_children(
    store: &dyn KeyValueStore,
    base_dir: &Path,
    vpath: &str,
) -> RepoResult<BTreeMap<String, Option<PathBuf>>> {
    let mut children = BTreeMap::new();

    for dir in resolve(store, base_dir, vpath, false)?.into_iter().flatten() {
        if dir.is_dir() {
            walk(&mut children, vpath, &dir)?;
        }
    }

    let mut keys: Vec<String> = store
        .keys()?
        .into_iter()
        .filter(|key| matches!(paths::strip_base(vpath, key), Some(rest) if !rest.is_empty()))
        .collect();
    keys.sort();

    for key in keys {
        let resolved = resolve(store, base_dir, &key, false)?;

        // Expand the mapping's own backing directories, shadowing anything
        // an ancestor's walk produced beneath this key.
        let mut subtree = BTreeMap::new();
        for dir in resolved.iter().flatten() {
            if dir.is_dir() {
                walk(&mut subtree, &key, dir)?;
            }
        }
        children.extend(subtree);
        children.insert(key, resolved.into_iter().next().flatten());
    }

    Ok(children)
}

/// Short-circuit check used by `has_children`.
pub(crate) fn has_children(
    store: &dyn KeyValueStore,
    base_dir: &Path,
    vpath: &str,
) -> RepoResult<bool> {
    for key in store.keys()? {
        if matches!(paths::strip_base(vpath, &key), Some(rest) if !rest.is_empty()) {
            return Ok(true);
        }
    }

    for dir in resolve(store, base_dir, vpath, false)?.into_iter().flatten() {
        if dir.is_dir() && fs::read_dir(&dir)?.next().is_some() {
            return Ok(true);
        }
    }

    Ok(false)
}

/// Recursively record a directory's entries under a virtual base. Existing
/// map entries win: callers order their walks from highest priority down.
fn walk(
    out: &mut BTreeMap<String, Option<PathBuf>>,
    vbase: &str,
    dir: &Path,
) -> RepoResult<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let vchild = paths::join(vbase, &name);
        let fs_path = entry.path();
        let is_dir = fs_path.is_dir();

        out.entry(vchild.clone()).or_insert_with(|| Some(fs_path.clone()));
        if is_dir {
            walk(out, &vchild, &fs_path)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::target::{Target, push_target};
    use std::env;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_base() -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = env::temp_dir().join(format!("tana-children-{}-{}", std::process::id(), id));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn push(store: &mut MemoryStore, vpath: &str, target: Target) {
        push_target(store, vpath, &target).unwrap();
    }

    #[test]
    fn direct_children_fuse_disk_and_mappings() {
        let base = temp_base();
        fs::create_dir_all(base.join("css")).unwrap();
        fs::write(base.join("css/main.css"), "").unwrap();
        fs::write(base.join("css/extra.css"), "").unwrap();

        let mut store = MemoryStore::new();
        push(&mut store, "/app", Target::FsPath("css".into()));
        push(&mut store, "/app/virtual", Target::FsPath("elsewhere".into()));

        let children = direct_children(&store, &base, "/app").unwrap();
        let names: Vec<&str> = children.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            vec!["/app/extra.css", "/app/main.css", "/app/virtual"]
        );
        assert_eq!(
            children["/app/main.css"],
            Some(base.join("css/main.css"))
        );
        // A mapping's backing is reported even when nothing exists on disk.
        assert_eq!(children["/app/virtual"], Some(base.join("elsewhere")));

        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn direct_mapping_overrides_disk_entry() {
        let base = temp_base();
        fs::create_dir_all(base.join("app")).unwrap();
        fs::write(base.join("app/config"), "on disk").unwrap();
        fs::create_dir_all(base.join("override")).unwrap();

        let mut store = MemoryStore::new();
        push(&mut store, "/app", Target::FsPath("app".into()));
        push(&mut store, "/app/config", Target::FsPath("override".into()));

        let children = direct_children(&store, &base, "/app").unwrap();
        assert_eq!(children["/app/config"], Some(base.join("override")));

        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn recursive_children_walk_full_depth() {
        let base = temp_base();
        fs::create_dir_all(base.join("app/theme")).unwrap();
        fs::write(base.join("app/main.css"), "").unwrap();
        fs::write(base.join("app/theme/dark.css"), "").unwrap();

        let mut store = MemoryStore::new();
        push(&mut store, "/app", Target::FsPath("app".into()));

        let children = recursive_children(&store, &base, "/app").unwrap();
        let names: Vec<&str> = children.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            vec!["/app/main.css", "/app/theme", "/app/theme/dark.css"]
        );

        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn deeper_mapping_shadows_in_recursive_listing() {
        let base = temp_base();
        fs::create_dir_all(base.join("app/config")).unwrap();
        fs::write(base.join("app/config/a.yml"), "old").unwrap();
        fs::create_dir_all(base.join("override")).unwrap();
        fs::write(base.join("override/a.yml"), "new").unwrap();

        let mut store = MemoryStore::new();
        push(&mut store, "/app", Target::FsPath("app".into()));
        push(&mut store, "/app/config", Target::FsPath("override".into()));

        let children = recursive_children(&store, &base, "/app").unwrap();
        assert_eq!(
            children["/app/config/a.yml"],
            Some(base.join("override/a.yml"))
        );
        assert_eq!(children["/app/config"], Some(base.join("override")));

        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn has_children_spots_mappings_and_disk() {
        let base = temp_base();
        fs::create_dir_all(base.join("full")).unwrap();
        fs::write(base.join("full/x"), "").unwrap();
        fs::create_dir_all(base.join("empty")).unwrap();

        let mut store = MemoryStore::new();
        push(&mut store, "/disk", Target::FsPath("full".into()));
        push(&mut store, "/bare", Target::FsPath("empty".into()));
        push(&mut store, "/virtual/child", Target::FsPath("full".into()));

        assert!(has_children(&store, &base, "/disk").unwrap());
        assert!(!has_children(&store, &base, "/bare").unwrap());
        assert!(has_children(&store, &base, "/virtual").unwrap());

        let _ = fs::remove_dir_all(&base);
    }
}
