//! tana-glob: Glob matching for virtual path namespaces.
//!
//! Provides:
//! - **glob_match**: Shell-style glob matching for a single path segment,
//!   with brace expansion
//! - **is_dynamic**: Detect whether a query string is a glob pattern at all
//! - **VirtualGlob**: Path-level glob matching over absolute virtual paths,
//!   with `**` (globstar) spanning multiple segments
//!
//! Virtual paths here are plain strings: absolute, `/`-separated, and
//! case-sensitive. The matcher never touches the filesystem.

pub mod glob;
mod pattern;

pub use glob::{expand_braces, glob_match, is_dynamic};
pub use pattern::{PatternError, Segment, VirtualGlob};
