//! tana-repo: a layered virtual resource repository.
//!
//! Maps a canonical virtual path namespace (an absolute POSIX-style path
//! tree rooted at `/`) onto a backing store of filesystem locations and
//! virtual links, so an application can address resources by stable logical
//! paths while the physical layout is composed from multiple source
//! directories and aliases.
//!
//! This crate provides:
//!
//! - **Repository**: the facade: `get`, `find`, `contains`,
//!   `list_children`, `has_children`, `add`, `remove`
//! - **Stores**: the `KeyValueStore` trait with in-memory and SQLite
//!   implementations
//! - **Targets**: per-path stacks of filesystem or link targets, most
//!   recent first
//! - **Resources**: the file/directory/link/generic objects handed back to
//!   callers
//! - **Paths**: virtual path sanitation and prefix arithmetic
//!
//! # Example
//!
//! ```no_run
//! use tana_repo::{QueryLanguage, Repository, Resource};
//!
//! # fn main() -> tana_repo::RepoResult<()> {
//! let mut repo = Repository::transient("/srv/site")?;
//!
//! // Expose /srv/site/assets/css as /app/css.
//! repo.add("/app/css", Resource::directory("/srv/site/assets/css"))?;
//!
//! // Every file under the directory is now addressable.
//! let main = repo.get("/app/css/main.css")?;
//!
//! // Queries run against the fused namespace.
//! let sheets = repo.find("/app/**/*.css", QueryLanguage::Glob)?;
//! # let _ = (main, sheets);
//! # Ok(())
//! # }
//! ```
//!
//! The engine is single-threaded and synchronous: every operation probes
//! the filesystem as it runs and completes before the next begins.

mod children;
pub mod error;
pub mod paths;
mod query;
mod repository;
mod resolver;
mod resource;
pub mod store;
mod target;

pub use error::{RepoError, RepoResult};
pub use query::QueryLanguage;
pub use repository::{Mapping, Repository};
pub use resource::{Resource, ResourceCollection, ResourceKind, RepositoryId};
pub use store::{KeyValueStore, MemoryStore, SqliteStore, StoreError, StoreResult};
pub use target::{LINK_PREFIX, Target};
