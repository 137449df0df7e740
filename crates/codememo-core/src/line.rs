//! Line ranges.
//!
//! A `LineRange` is either absolute (line numbers of the source file a
//! snippet was taken from) or relative (line numbers counted from the first
//! line of a snippet, starting at 1). The two only differ in what the
//! numbers mean, so they share one type.

use crate::error::ReferenceError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A start line with an optional inclusive stop line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineRange {
    pub start: u32,
    pub stop: Option<u32>,
}

impl LineRange {
    /// Creates a range covering a single line.
    pub fn single(start: u32) -> Self {
        Self { start, stop: None }
    }

    /// Creates a range from `start` to `stop`, both inclusive.
    pub fn new(start: u32, stop: Option<u32>) -> Self {
        Self { start, stop }
    }

    /// Returns true if line `v` falls in this range.
    ///
    /// Without a stop line only `start` itself matches.
    pub fn in_range(&self, v: u32) -> bool {
        match self.stop {
            None => v == self.start,
            Some(stop) => self.start <= v && v <= stop,
        }
    }

    /// The last line covered by this range.
    pub fn last(&self) -> u32 {
        self.stop.unwrap_or(self.start)
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stop {
            Some(stop) => write!(f, "L{}-{}", self.start, stop),
            None => write!(f, "L{}", self.start),
        }
    }
}

/// The lines of a root's snippet that a leaf refers to.
///
/// Always relative to the referenced (root) snippet. One exists for every
/// root of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceInfo {
    pub ref_start: u32,
    pub ref_stop: Option<u32>,
}

impl ReferenceInfo {
    pub fn new(ref_start: u32, ref_stop: Option<u32>) -> Self {
        Self {
            ref_start,
            ref_stop,
        }
    }

    /// Builds a reference after checking it fits a snippet of `n_lines` lines.
    pub fn checked(
        ref_start: u32,
        ref_stop: Option<u32>,
        n_lines: u32,
    ) -> Result<Self, ReferenceError> {
        let start_ok = (1..=n_lines).contains(&ref_start);
        let stop_ok = ref_stop.map_or(true, |stop| (1..=n_lines).contains(&stop));
        if start_ok && stop_ok {
            Ok(Self::new(ref_start, ref_stop))
        } else {
            Err(ReferenceError::OutOfRange {
                ref_start,
                ref_stop,
                n_lines,
            })
        }
    }

    /// The referenced lines as a relative range.
    pub fn range(&self) -> LineRange {
        LineRange::new(self.ref_start, self.ref_stop)
    }

    pub fn in_range(&self, v: u32) -> bool {
        self.range().in_range(v)
    }
}

impl Default for ReferenceInfo {
    fn default() -> Self {
        Self::new(1, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_range_single_line() {
        let range = LineRange::single(3);
        assert!(range.in_range(3));
        assert!(!range.in_range(2));
        assert!(!range.in_range(4));
    }

    #[test]
    fn test_in_range_inclusive_bounds() {
        let range = LineRange::new(2, Some(5));
        assert!(!range.in_range(1));
        assert!(range.in_range(2));
        assert!(range.in_range(5));
        assert!(!range.in_range(6));
        assert_eq!(range.last(), 5);
    }

    #[test]
    fn test_checked_reference() {
        assert!(ReferenceInfo::checked(1, None, 2).is_ok());
        assert!(ReferenceInfo::checked(2, Some(2), 2).is_ok());
        assert!(ReferenceInfo::checked(0, None, 2).is_err());
        assert!(ReferenceInfo::checked(3, None, 2).is_err());
        assert!(ReferenceInfo::checked(1, Some(3), 2).is_err());
    }

    #[test]
    fn test_reference_serialization_shape() {
        let info = ReferenceInfo::new(2, None);
        let value = serde_json::to_value(info).unwrap();
        assert_eq!(value, serde_json::json!({"ref_start": 2, "ref_stop": null}));
    }
}
