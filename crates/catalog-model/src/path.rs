//! Program paths
//!
//! Provides [`ProgramPath`], the dot-separated ancestry string that positions a
//! program in the enterprise hierarchy (`"1"`, `"1.2"`, `"1.2.3"`).
//!
//! Comparison is purely lexical on segments: `"1.10"` is a child of `"1"` and
//! is never reordered against `"1.9"` numerically.

use crate::error::PathError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Segment separator used by program paths
pub const SEPARATOR: char = '.';

/// Position of a program in the hierarchy
///
/// The number of segments is the program's depth. The parent of a path is the
/// same path with its final segment removed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProgramPath(Vec<String>);

impl ProgramPath {
    /// Split a stored path without validating its segments
    ///
    /// Used when reading rows written by external ingestion: a malformed path
    /// still has a depth and a parent, it just never matches a real node.
    #[must_use]
    pub fn lexical(raw: &str) -> Self {
        Self(raw.split(SEPARATOR).map(str::to_string).collect())
    }

    /// Create path from segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Path segments, root first
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Depth in the hierarchy (segment count)
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Parent path, or `None` for a single-segment path
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.len() <= 1 {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Append a segment, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(segment.into());
        new
    }

    /// Last segment
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Check if this path is a strict ancestor of another
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.0.len() < other.0.len() && self.0 == other.0[..self.0.len()]
    }
}

impl Display for ProgramPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl FromStr for ProgramPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PathError::Empty);
        }

        let segments: Vec<String> = s
            .split(SEPARATOR)
            .map(|seg| {
                if seg.is_empty() {
                    Err(PathError::EmptySegment(s.to_string()))
                } else if seg.chars().any(char::is_whitespace) {
                    Err(PathError::InvalidSegment(seg.to_string()))
                } else {
                    Ok(seg.to_string())
                }
            })
            .collect::<Result<_, _>>()?;

        Ok(Self(segments))
    }
}

impl TryFrom<String> for ProgramPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProgramPath> for String {
    fn from(path: ProgramPath) -> Self {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_counts_segments() {
        let path: ProgramPath = "1.2.3".parse().unwrap();
        assert_eq!(path.depth(), 3);
        assert_eq!(path.segments(), &["1", "2", "3"]);
    }

    #[test]
    fn parent_drops_last_segment() {
        let path: ProgramPath = "1.2.3".parse().unwrap();
        assert_eq!(path.parent().unwrap().to_string(), "1.2");
    }

    #[test]
    fn single_segment_has_no_parent() {
        let path: ProgramPath = "1".parse().unwrap();
        assert!(path.parent().is_none());
    }

    #[test]
    fn segments_are_compared_lexically() {
        let parent: ProgramPath = "1".parse().unwrap();
        let ten: ProgramPath = "1.10".parse().unwrap();
        let one_hundred: ProgramPath = "10.0".parse().unwrap();

        assert!(parent.is_ancestor_of(&ten));
        assert!(!parent.is_ancestor_of(&one_hundred));
        assert!(!parent.is_ancestor_of(&parent));
    }

    #[test]
    fn child_appends_segment() {
        let path: ProgramPath = "1.2".parse().unwrap();
        assert_eq!(path.child("7").to_string(), "1.2.7");
        assert_eq!(path.child("7").last(), Some("7"));
    }

    #[test]
    fn parse_rejects_empty_input_and_segments() {
        assert!(matches!("".parse::<ProgramPath>(), Err(PathError::Empty)));
        assert!(matches!(
            "1..2".parse::<ProgramPath>(),
            Err(PathError::EmptySegment(_))
        ));
        assert!(matches!(
            "1.2 .3".parse::<ProgramPath>(),
            Err(PathError::InvalidSegment(_))
        ));
    }

    #[test]
    fn lexical_never_fails() {
        let path = ProgramPath::lexical("1..2");
        assert_eq!(path.depth(), 3);
        assert_eq!(path.parent().unwrap().to_string(), "1.");
    }

    #[test]
    fn serializes_as_string() {
        let path: ProgramPath = "4.5".parse().unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"4.5\"");

        let back: ProgramPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
        assert!(serde_json::from_str::<ProgramPath>("\"4..5\"").is_err());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn segments() -> impl Strategy<Value = Vec<String>> {
            proptest::collection::vec("[0-9A-Za-z_-]{1,4}", 1..8)
        }

        proptest! {
            #[test]
            fn parse_display_round_trips(segs in segments()) {
                let raw = segs.join(".");
                let path: ProgramPath = raw.parse().unwrap();
                prop_assert_eq!(path.depth(), segs.len());
                prop_assert_eq!(path.to_string(), raw);
            }

            #[test]
            fn parent_is_ancestor_one_level_up(segs in segments()) {
                let path = ProgramPath::new(segs.clone());
                match path.parent() {
                    Some(parent) => {
                        prop_assert_eq!(parent.depth() + 1, path.depth());
                        prop_assert!(parent.is_ancestor_of(&path));
                        prop_assert_eq!(parent.child(path.last().unwrap()), path);
                    }
                    None => prop_assert_eq!(segs.len(), 1),
                }
            }

            #[test]
            fn lexical_agrees_with_parse_on_valid_input(segs in segments()) {
                let raw = segs.join(".");
                prop_assert_eq!(ProgramPath::lexical(&raw), raw.parse::<ProgramPath>().unwrap());
            }
        }
    }
}
