//! Target stacks: the values stored at each virtual path mapping.
//!
//! A target is one resolution edge. The wire encoding inside the store is a
//! list of strings, most recent first; link entries carry the literal `l:`
//! prefix, anything else is a filesystem path relative to the repository
//! base directory. No other prefixes are defined.

use std::path::PathBuf;

use crate::store::{KeyValueStore, StoreResult};

/// Marker prefix for link entries in the wire encoding.
pub const LINK_PREFIX: &str = "l:";

/// A resolution edge from a virtual path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Filesystem path relative to the repository base directory.
    FsPath(PathBuf),
    /// Absolute virtual path looked up as a second hop.
    Link(String),
}

impl Target {
    /// Decode one stored entry.
    pub fn decode(raw: &str) -> Target {
        match raw.strip_prefix(LINK_PREFIX) {
            Some(vpath) => Target::Link(vpath.to_string()),
            None => Target::FsPath(PathBuf::from(raw)),
        }
    }

    /// Encode to the stored form.
    pub fn encode(&self) -> String {
        match self {
            Target::FsPath(rel) => rel.to_string_lossy().into_owned(),
            Target::Link(vpath) => format!("{LINK_PREFIX}{vpath}"),
        }
    }
}

/// Decode a whole stored stack, preserving order.
pub(crate) fn decode_stack(raw: &[String]) -> Vec<Target> {
    raw.iter().map(|entry| Target::decode(entry)).collect()
}

/// Push a target onto the stack at `vpath`.
///
/// The new entry lands at the front (most recent wins); an entry that is
/// already present, by exact string equality, is left where it is. Existing
/// entries are never removed or reordered.
pub(crate) fn push_target(
    store: &mut dyn KeyValueStore,
    vpath: &str,
    target: &Target,
) -> StoreResult<()> {
    let mut stack = store.get(vpath)?.unwrap_or_default();
    let encoded = target.encode();
    if !stack.contains(&encoded) {
        stack.insert(0, encoded);
    }
    store.set(vpath, &stack)
}
