//! Virtual path resolution.
//!
//! Resolution runs in two stages:
//!
//! 1. **Exact hit**: the path has its own mapping; its target stack maps
//!    directly, most recent first, with no disk probing.
//! 2. **Ancestor walk**: otherwise every mapping that is a proper ancestor
//!    of the path is tried, deepest first, by appending the remaining suffix
//!    under each of its targets and keeping the candidates that exist on
//!    disk.
//!
//! The second stage is what makes a single directory mapping implicitly
//! expose every file beneath it, without pre-enumerating the tree.
//!
//! A `None` entry in the result list means "known virtual path, no backing
//! file": an exact mapping with an empty stack.

use std::path::{Path, PathBuf};

use crate::error::RepoResult;
use crate::paths;
use crate::store::KeyValueStore;
use crate::target::{Target, decode_stack};

/// Upper bound on link indirection. Link targets may form cycles; past this
/// depth the branch yields nothing and lookups surface `ResourceNotFound`.
const MAX_LINK_DEPTH: usize = 32;

/// Resolve a canonical virtual path to its backing filesystem paths.
///
/// With `only_first` the search stops at the highest-priority result, which
/// is what `get` wants; enumeration asks for everything.
pub(crate) fn resolve(
    store: &dyn KeyValueStore,
    base_dir: &Path,
    vpath: &str,
    only_first: bool,
) -> RepoResult<Vec<Option<PathBuf>>> {
    resolve_bounded(store, base_dir, vpath, only_first, 0)
}

fn resolve_bounded(
    store: &dyn KeyValueStore,
    base_dir: &Path,
    vpath: &str,
    only_first: bool,
    depth: usize,
) -> RepoResult<Vec<Option<PathBuf>>> {
    if depth > MAX_LINK_DEPTH {
        tracing::warn!("link depth limit reached while resolving {vpath}");
        return Ok(Vec::new());
    }

    if store.exists(vpath)? {
        return resolve_exact(store, base_dir, vpath, only_first, depth);
    }
    resolve_inherited(store, base_dir, vpath, only_first, depth)
}

/// Stage 1: map the path's own target stack.
fn resolve_exact(
    store: &dyn KeyValueStore,
    base_dir: &Path,
    vpath: &str,
    only_first: bool,
    depth: usize,
) -> RepoResult<Vec<Option<PathBuf>>> {
    let raw = store.get(vpath)?.unwrap_or_default();
    if raw.is_empty() {
        return Ok(vec![None]);
    }

    let mut targets = decode_stack(&raw);
    if only_first {
        targets.truncate(1);
    }

    let mut resolved = Vec::new();
    for target in targets {
        match target {
            Target::FsPath(rel) => resolved.push(Some(base_dir.join(rel))),
            Target::Link(link) => {
                resolved.extend(resolve_bounded(store, base_dir, &link, only_first, depth + 1)?);
            }
        }
    }
    Ok(resolved)
}

/// Stage 2: walk ancestor mappings, deepest first.
///
/// Keys are ordered by descending length with a lexicographic tie-break, so
/// a deeper mapping always shadows a shallower one regardless of the order
/// the store reports its keys in.
fn resolve_inherited(
    store: &dyn KeyValueStore,
    base_dir: &Path,
    vpath: &str,
    only_first: bool,
    depth: usize,
) -> RepoResult<Vec<Option<PathBuf>>> {
    let mut ancestors: Vec<String> = store
        .keys()?
        .into_iter()
        .filter(|key| key != vpath && paths::is_base_path(key, vpath))
        .collect();
    ancestors.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let mut resolved = Vec::new();
    for key in ancestors {
        let suffix = match paths::strip_base(&key, vpath) {
            Some(suffix) => suffix,
            None => continue,
        };
        let raw = store.get(&key)?.unwrap_or_default();
        for target in decode_stack(&raw) {
            match target {
                Target::FsPath(rel) => {
                    let candidate = base_dir.join(&rel).join(suffix);
                    if candidate.exists() {
                        resolved.push(Some(candidate));
                        if only_first {
                            return Ok(resolved);
                        }
                    }
                }
                Target::Link(link) => {
                    // Second hop: re-apply the suffix under the link target.
                    // No disk existence check here; the hop resolves through
                    // whatever mappings it finds.
                    let hop = paths::join(&link, suffix);
                    tracing::debug!("following link {key} -> {hop} while resolving {vpath}");
                    resolved.extend(resolve_bounded(
                        store,
                        base_dir,
                        &hop,
                        only_first,
                        depth + 1,
                    )?);
                    if only_first && !resolved.is_empty() {
                        return Ok(resolved);
                    }
                }
            }
        }
    }
    Ok(resolved)
}
