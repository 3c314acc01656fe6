//! Path-level glob matching with globstar (`**`) support.
//!
//! `VirtualGlob` evaluates a pattern against whole virtual paths:
//!
//! - `/app/*.css` matches `/app/main.css` but not `/app/theme/dark.css`
//! - `/app/**/*.css` matches both, at any depth
//! - `/app/**` matches `/app` and everything under it
//!
//! Patterns and inputs are absolute `/`-separated strings; matching is done
//! segment by segment, delegating single-segment wildcards to `glob.rs`.

use thiserror::Error;

use crate::glob::glob_match;

/// Errors when parsing a path pattern.
#[derive(Debug, Clone, Error)]
pub enum PatternError {
    #[error("empty pattern")]
    Empty,
    #[error("pattern is not absolute: {0}")]
    NotAbsolute(String),
}

/// One segment of a parsed pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Plain segment name: `app`, `main.css`.
    Literal(String),
    /// Segment with wildcards: `*.css`, `v?`, `[ab]*`.
    Wildcard(String),
    /// `**`: matches zero or more whole segments.
    Globstar,
}

/// A glob pattern over the virtual path namespace.
///
/// # Examples
/// ```
/// use tana_glob::VirtualGlob;
///
/// let glob = VirtualGlob::new("/app/**/*.css").unwrap();
/// assert!(glob.matches("/app/main.css"));
/// assert!(glob.matches("/app/theme/dark.css"));
/// assert!(!glob.matches("/app/main.js"));
/// assert_eq!(glob.static_prefix(), "/app");
/// ```
#[derive(Debug, Clone)]
pub struct VirtualGlob {
    raw: String,
    segments: Vec<Segment>,
}

impl VirtualGlob {
    /// Parse a pattern. Must be non-empty and absolute.
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::Empty);
        }
        if !pattern.starts_with('/') {
            return Err(PatternError::NotAbsolute(pattern.to_string()));
        }

        let mut segments = Vec::new();
        for part in pattern.split('/') {
            if part.is_empty() {
                continue;
            }
            if part == "**" {
                // Runs of globstars collapse to one.
                if segments.last() != Some(&Segment::Globstar) {
                    segments.push(Segment::Globstar);
                }
            } else if crate::glob::is_dynamic(part) {
                segments.push(Segment::Wildcard(part.to_string()));
            } else {
                segments.push(Segment::Literal(part.to_string()));
            }
        }

        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    /// True iff the query contains glob metacharacters (`*`, `?`, `[`, `{`).
    ///
    /// Queries without metacharacters are plain paths; callers resolve them
    /// directly instead of parsing a pattern.
    pub fn is_dynamic(query: &str) -> bool {
        crate::glob::is_dynamic(query)
    }

    /// The pattern as given.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The longest literal virtual path leading the pattern, cut back to the
    /// last `/`. `/` when the pattern is dynamic from its first segment.
    ///
    /// Queries are evaluated by enumerating under this prefix instead of the
    /// whole namespace.
    pub fn static_prefix(&self) -> String {
        let mut prefix = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(name) => {
                    prefix.push('/');
                    prefix.push_str(name);
                }
                _ => break,
            }
        }
        if prefix.is_empty() {
            prefix.push('/');
        }
        prefix
    }

    /// Check a virtual path against the pattern.
    pub fn matches(&self, vpath: &str) -> bool {
        let components: Vec<&str> = vpath.split('/').filter(|s| !s.is_empty()).collect();
        self.match_segments(0, &components, 0)
    }

    /// Segment matcher with backtracking for globstar.
    fn match_segments(&self, seg_idx: usize, components: &[&str], comp_idx: usize) -> bool {
        if seg_idx >= self.segments.len() {
            return comp_idx >= components.len();
        }

        match &self.segments[seg_idx] {
            Segment::Globstar => {
                // Try consuming 0, 1, 2, ... components.
                (0..=components.len() - comp_idx)
                    .any(|skip| self.match_segments(seg_idx + 1, components, comp_idx + skip))
            }
            Segment::Literal(name) => {
                comp_idx < components.len()
                    && components[comp_idx] == name.as_str()
                    && self.match_segments(seg_idx + 1, components, comp_idx + 1)
            }
            Segment::Wildcard(pattern) => {
                comp_idx < components.len()
                    && glob_match(pattern, components[comp_idx])
                    && self.match_segments(seg_idx + 1, components, comp_idx + 1)
            }
        }
    }
}
