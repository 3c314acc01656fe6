//! Resource objects handed out by the repository.
//!
//! The engine treats resources as opaque carriers: a kind, an optional
//! filesystem backing, and a weak association back to the repository that
//! produced them. Attachment records `(repository id, virtual path)` only;
//! a resource never owns or extends the repository's lifetime.

use std::path::{Path, PathBuf};

use crate::paths;

/// Identifies a repository instance for attach-back references.
pub type RepositoryId = u64;

/// What a resource is backed by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceKind {
    /// A regular file on disk.
    File { fs_path: PathBuf },
    /// A directory on disk.
    Directory { fs_path: PathBuf },
    /// An alias for another virtual path.
    Link { target: String },
    /// A known virtual path with no backing file.
    Generic,
}

/// A resource addressed by a virtual path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    kind: ResourceKind,
    virtual_path: Option<String>,
    repository: Option<RepositoryId>,
}

impl Resource {
    /// Create an unattached file resource.
    pub fn file(fs_path: impl Into<PathBuf>) -> Self {
        Self::unattached(ResourceKind::File {
            fs_path: fs_path.into(),
        })
    }

    /// Create an unattached directory resource.
    pub fn directory(fs_path: impl Into<PathBuf>) -> Self {
        Self::unattached(ResourceKind::Directory {
            fs_path: fs_path.into(),
        })
    }

    /// Create an unattached link resource pointing at a virtual path.
    pub fn link(target: impl Into<String>) -> Self {
        Self::unattached(ResourceKind::Link {
            target: target.into(),
        })
    }

    /// Create an unattached generic resource.
    pub fn generic() -> Self {
        Self::unattached(ResourceKind::Generic)
    }

    fn unattached(kind: ResourceKind) -> Self {
        Self {
            kind,
            virtual_path: None,
            repository: None,
        }
    }

    /// Factory used by resolution: a `None` backing produces a generic
    /// resource, otherwise the kind follows the on-disk file type.
    pub(crate) fn from_backing(
        fs_path: Option<PathBuf>,
        vpath: &str,
        repository: RepositoryId,
    ) -> Self {
        let mut resource = match fs_path {
            None => Self::generic(),
            Some(path) => match std::fs::metadata(&path) {
                Ok(meta) if meta.is_dir() => Self::directory(path),
                _ => Self::file(path),
            },
        };
        resource.attach(repository, vpath);
        resource
    }

    /// Record the weak back-reference to the owning repository.
    pub(crate) fn attach(&mut self, repository: RepositoryId, vpath: impl Into<String>) {
        self.repository = Some(repository);
        self.virtual_path = Some(vpath.into());
    }

    pub fn kind(&self) -> &ResourceKind {
        &self.kind
    }

    /// Filesystem backing, if this resource has one.
    pub fn fs_path(&self) -> Option<&Path> {
        match &self.kind {
            ResourceKind::File { fs_path } | ResourceKind::Directory { fs_path } => Some(fs_path),
            _ => None,
        }
    }

    /// Link target, for link resources.
    pub fn link_target(&self) -> Option<&str> {
        match &self.kind {
            ResourceKind::Link { target } => Some(target),
            _ => None,
        }
    }

    /// Virtual path this resource is attached at.
    pub fn virtual_path(&self) -> Option<&str> {
        self.virtual_path.as_deref()
    }

    /// Id of the repository this resource is attached to.
    pub fn repository(&self) -> Option<RepositoryId> {
        self.repository
    }

    /// Final segment of the virtual path.
    pub fn name(&self) -> Option<&str> {
        self.virtual_path.as_deref().and_then(paths::file_name)
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, ResourceKind::File { .. })
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.kind, ResourceKind::Directory { .. })
    }

    pub fn is_link(&self) -> bool {
        matches!(self.kind, ResourceKind::Link { .. })
    }

    pub fn is_generic(&self) -> bool {
        matches!(self.kind, ResourceKind::Generic)
    }
}

/// Ordered set of resources, as returned by `find` and `list_children`.
#[derive(Debug, Clone, Default)]
pub struct ResourceCollection {
    resources: Vec<Resource>,
}

impl ResourceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn first(&self) -> Option<&Resource> {
        self.resources.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Resource> {
        self.resources.iter()
    }

    /// Virtual paths of all members, in collection order.
    pub fn virtual_paths(&self) -> Vec<&str> {
        self.resources
            .iter()
            .filter_map(Resource::virtual_path)
            .collect()
    }
}

impl FromIterator<Resource> for ResourceCollection {
    fn from_iter<I: IntoIterator<Item = Resource>>(iter: I) -> Self {
        Self {
            resources: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ResourceCollection {
    type Item = Resource;
    type IntoIter = std::vec::IntoIter<Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResourceCollection {
    type Item = &'a Resource;
    type IntoIter = std::slice::Iter<'a, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.iter()
    }
}
