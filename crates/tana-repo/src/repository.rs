//! The repository facade.
//!
//! Binds the store, resolver, enumerator, and query engine into the public
//! operations. A repository owns its store for its lifetime and is fully
//! instance-scoped: no globals, no background work. Reads take `&self`,
//! mutations take `&mut self`, so concurrent writers need external
//! serialization and the borrow checker enforces it in-process.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::children;
use crate::error::{RepoError, RepoResult};
use crate::paths;
use crate::query::{self, QueryLanguage};
use crate::resolver::resolve;
use crate::resource::{Resource, ResourceCollection, ResourceKind, RepositoryId};
use crate::store::{KeyValueStore, MemoryStore};
use crate::target::{Target, decode_stack, push_target};

static NEXT_REPOSITORY_ID: AtomicU64 = AtomicU64::new(1);

/// One explicit entry of the store, as reported by [`Repository::mappings`].
#[derive(Debug, Clone)]
pub struct Mapping {
    /// The mapped virtual path.
    pub virtual_path: String,
    /// Its target stack, most recent first.
    pub targets: Vec<Target>,
}

/// A layered virtual resource repository.
///
/// Virtual paths are mapped onto stacks of targets: filesystem locations
/// relative to `base_dir`, or links to other virtual paths. Resolution
/// fuses those mappings with the on-disk trees beneath them.
pub struct Repository {
    id: RepositoryId,
    base_dir: PathBuf,
    store: Box<dyn KeyValueStore>,
}

impl Repository {
    /// Create a repository over the given store.
    ///
    /// `base_dir` is the absolute filesystem root that relative targets
    /// resolve against. The root mapping `/` is anchored in the store if it
    /// is not already present.
    pub fn new(base_dir: impl Into<PathBuf>, mut store: Box<dyn KeyValueStore>) -> RepoResult<Self> {
        if !store.exists("/")? {
            store.set("/", &[])?;
        }
        Ok(Self {
            id: NEXT_REPOSITORY_ID.fetch_add(1, Ordering::Relaxed),
            base_dir: base_dir.into(),
            store,
        })
    }

    /// Create a repository over a fresh in-memory store.
    pub fn transient(base_dir: impl Into<PathBuf>) -> RepoResult<Self> {
        Self::new(base_dir, Box::new(MemoryStore::new()))
    }

    /// Id used in resource attach-back references.
    pub fn id(&self) -> RepositoryId {
        self.id
    }

    /// The filesystem root relative targets resolve against.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Fetch the resource at a virtual path.
    ///
    /// The highest-priority resolution wins: the most recent target of an
    /// exact mapping, else the deepest ancestor mapping whose backing holds
    /// the path on disk.
    pub fn get(&self, path: &str) -> RepoResult<Resource> {
        let path = paths::sanitize(path)?;
        match resolve(self.store.as_ref(), &self.base_dir, &path, true)?
            .into_iter()
            .next()
        {
            Some(backing) => Ok(Resource::from_backing(backing, &path, self.id)),
            None => Err(RepoError::ResourceNotFound(path)),
        }
    }

    /// Evaluate a query against the fused namespace.
    ///
    /// Results are sorted by virtual path; the collection may be empty.
    pub fn find(&self, query: &str, language: QueryLanguage) -> RepoResult<ResourceCollection> {
        let query = paths::sanitize(query)?;
        let found = query::find_paths(self.store.as_ref(), &self.base_dir, &query, language)?;
        Ok(found
            .into_iter()
            .map(|(vpath, backing)| Resource::from_backing(backing, &vpath, self.id))
            .collect())
    }

    /// True iff the query matches at least one resource.
    pub fn contains(&self, query: &str, language: QueryLanguage) -> RepoResult<bool> {
        let query = paths::sanitize(query)?;
        query::contains_path(self.store.as_ref(), &self.base_dir, &query, language)
    }

    /// List the direct children of a virtual path.
    ///
    /// The path itself must resolve.
    pub fn list_children(&self, path: &str) -> RepoResult<ResourceCollection> {
        let path = self.resolvable(path)?;
        let children = children::direct_children(self.store.as_ref(), &self.base_dir, &path)?;
        Ok(children
            .into_iter()
            .map(|(vpath, backing)| Resource::from_backing(backing, &vpath, self.id))
            .collect())
    }

    /// True iff a virtual path has any children, on disk or mapped.
    ///
    /// The path itself must resolve.
    pub fn has_children(&self, path: &str) -> RepoResult<bool> {
        let path = self.resolvable(path)?;
        children::has_children(self.store.as_ref(), &self.base_dir, &path)
    }

    /// Map a resource at a virtual path.
    ///
    /// Filesystem resources are stored relative to the base directory; link
    /// resources store their virtual target. The new target is pushed onto
    /// the front of the path's stack, so the most recent `add` wins `get`.
    /// Returns the resource, attached to this repository at `path`.
    pub fn add(&mut self, path: &str, mut resource: Resource) -> RepoResult<Resource> {
        let path = paths::sanitize(path)?;

        let target = match resource.kind() {
            ResourceKind::File { fs_path } | ResourceKind::Directory { fs_path } => {
                Target::FsPath(paths::make_relative(fs_path, &self.base_dir))
            }
            ResourceKind::Link { target } => Target::Link(paths::sanitize(target)?),
            ResourceKind::Generic => {
                return Err(RepoError::UnsupportedResource(format!(
                    "cannot map a resource with no backing at {path}"
                )));
            }
        };

        resource.attach(self.id, path.clone());
        push_target(self.store.as_mut(), &path, &target)?;
        tracing::debug!("mapped {path} -> {}", target.encode());
        Ok(resource)
    }

    /// Remove every mapping matched by a glob query.
    ///
    /// Removal is all-or-nothing: if the query matches anything that is not
    /// an explicit mapping (an inherited on-disk descendant, say), the call
    /// fails and the store is left untouched. Otherwise each matched mapping
    /// is deleted together with its descendant mappings, and the number of
    /// deleted store keys is returned.
    pub fn remove(&mut self, query: &str) -> RepoResult<usize> {
        if query.trim_matches('/').is_empty() {
            return Err(RepoError::InvalidPath(
                "cannot remove the repository root".to_string(),
            ));
        }
        let query = paths::sanitize(query)?;

        let matched =
            query::find_paths(self.store.as_ref(), &self.base_dir, &query, QueryLanguage::Glob)?;

        let mut mappings = Vec::new();
        let mut strays = Vec::new();
        for vpath in matched.into_keys() {
            if self.store.exists(&vpath)? {
                mappings.push(vpath);
            } else {
                strays.push(vpath);
            }
        }

        match strays.len() {
            0 => {}
            1 => {
                return Err(RepoError::UnsupportedOperation(format!(
                    "cannot remove {}: it is not a mapping",
                    strays[0]
                )));
            }
            n => {
                return Err(RepoError::UnsupportedOperation(format!(
                    "cannot remove {n} matched resources: they are not mappings"
                )));
            }
        }

        let mut removed = 0;
        for mapping in mappings {
            let descendants: Vec<String> = self
                .store
                .keys()?
                .into_iter()
                .filter(|key| {
                    matches!(paths::strip_base(&mapping, key), Some(rest) if !rest.is_empty())
                })
                .collect();
            for key in descendants {
                if self.store.remove(&key)? {
                    removed += 1;
                }
            }
            if self.store.remove(&mapping)? {
                removed += 1;
            }
        }

        tracing::debug!("removed {removed} mappings for query {query}");
        Ok(removed)
    }

    /// All explicit mappings, in ascending key order.
    pub fn mappings(&self) -> RepoResult<Vec<Mapping>> {
        let mut mappings = Vec::new();
        for key in self.store.keys()? {
            let raw = self.store.get(&key)?.unwrap_or_default();
            mappings.push(Mapping {
                virtual_path: key,
                targets: decode_stack(&raw),
            });
        }
        Ok(mappings)
    }

    /// Sanitize a path and require that it resolves.
    fn resolvable(&self, path: &str) -> RepoResult<String> {
        let path = paths::sanitize(path)?;
        if resolve(self.store.as_ref(), &self.base_dir, &path, true)?.is_empty() {
            return Err(RepoError::ResourceNotFound(path));
        }
        Ok(path)
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("id", &self.id)
            .field("base_dir", &self.base_dir)
            .finish()
    }
}
