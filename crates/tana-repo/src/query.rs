//! Query evaluation over the fused namespace.
//!
//! Literal queries (and glob queries without metacharacters) resolve
//! directly. Dynamic globs enumerate the namespace under the pattern's
//! static prefix and keep what matches, so `/app/**/*.css` never walks
//! anything outside `/app`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tana_glob::VirtualGlob;

use crate::children::recursive_children;
use crate::error::{RepoError, RepoResult};
use crate::resolver::resolve;
use crate::store::KeyValueStore;

/// Query languages accepted by `find` and `contains`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryLanguage {
    /// Shell-style globs; the default.
    #[default]
    Glob,
    /// The query is a plain path, metacharacters and all.
    Literal,
}

impl FromStr for QueryLanguage {
    type Err = RepoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "glob" => Ok(QueryLanguage::Glob),
            "literal" => Ok(QueryLanguage::Literal),
            other => Err(RepoError::UnsupportedLanguage(other.to_string())),
        }
    }
}

/// Evaluate a sanitized query, returning matches keyed by virtual path.
pub(crate) fn find_paths(
    store: &dyn KeyValueStore,
    base_dir: &Path,
    query: &str,
    language: QueryLanguage,
) -> RepoResult<BTreeMap<String, Option<PathBuf>>> {
    match language {
        QueryLanguage::Literal => find_static(store, base_dir, query),
        QueryLanguage::Glob if !VirtualGlob::is_dynamic(query) => {
            find_static(store, base_dir, query)
        }
        QueryLanguage::Glob => find_dynamic(store, base_dir, query),
    }
}

/// True iff the query matches anything.
pub(crate) fn contains_path(
    store: &dyn KeyValueStore,
    base_dir: &Path,
    query: &str,
    language: QueryLanguage,
) -> RepoResult<bool> {
    match language {
        QueryLanguage::Literal => Ok(!resolve(store, base_dir, query, true)?.is_empty()),
        QueryLanguage::Glob if !VirtualGlob::is_dynamic(query) => {
            Ok(!resolve(store, base_dir, query, true)?.is_empty())
        }
        QueryLanguage::Glob => {
            let glob = parse(query)?;
            let namespace = recursive_children(store, base_dir, &glob.static_prefix())?;
            Ok(namespace.keys().any(|vpath| glob.matches(vpath)))
        }
    }
}

fn find_static(
    store: &dyn KeyValueStore,
    base_dir: &Path,
    query: &str,
) -> RepoResult<BTreeMap<String, Option<PathBuf>>> {
    let mut matches = BTreeMap::new();
    if let Some(backing) = resolve(store, base_dir, query, true)?.into_iter().next() {
        matches.insert(query.to_string(), backing);
    }
    Ok(matches)
}

fn find_dynamic(
    store: &dyn KeyValueStore,
    base_dir: &Path,
    query: &str,
) -> RepoResult<BTreeMap<String, Option<PathBuf>>> {
    let glob = parse(query)?;
    let namespace = recursive_children(store, base_dir, &glob.static_prefix())?;
    Ok(namespace
        .into_iter()
        .filter(|(vpath, _)| glob.matches(vpath))
        .collect())
}

fn parse(query: &str) -> RepoResult<VirtualGlob> {
    VirtualGlob::new(query).map_err(|e| RepoError::InvalidPath(e.to_string()))
}
