//! Plane and frame window selection.
//!
//! Callers select a window of planes or frames with an [`IndexSelection`],
//! which is normalized against the extent declared by the header into an
//! inclusive [`IndexRange`]. Upper bounds past the extent are clamped, and
//! the clamping is reported as a [`RangeWarning`] rather than an error.
//!
//! [`IndexSelection`]: ./enum.IndexSelection.html
//! [`IndexRange`]: ./struct.IndexRange.html
//! [`RangeWarning`]: ./struct.RangeWarning.html

use crate::error::{Result, ScanError};
use std::fmt;
use std::ops::RangeInclusive;

/// A requested window of indices, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexSelection {
    /// The full extent.
    All,
    /// A single index `n`, equivalent to `[n, n]`.
    Single(usize),
    /// Explicit bounds. Exactly one or two bounds are accepted.
    Bounds(Vec<usize>),
}

impl Default for IndexSelection {
    fn default() -> Self {
        IndexSelection::All
    }
}

impl From<usize> for IndexSelection {
    fn from(n: usize) -> Self {
        IndexSelection::Single(n)
    }
}

impl From<(usize, usize)> for IndexSelection {
    fn from((a, b): (usize, usize)) -> Self {
        IndexSelection::Bounds(vec![a, b])
    }
}

impl From<[usize; 2]> for IndexSelection {
    fn from(b: [usize; 2]) -> Self {
        IndexSelection::Bounds(b.to_vec())
    }
}

impl From<Vec<usize>> for IndexSelection {
    fn from(b: Vec<usize>) -> Self {
        IndexSelection::Bounds(b)
    }
}

impl<'a> From<&'a [usize]> for IndexSelection {
    fn from(b: &'a [usize]) -> Self {
        IndexSelection::Bounds(b.to_vec())
    }
}

impl From<RangeInclusive<usize>> for IndexSelection {
    fn from(r: RangeInclusive<usize>) -> Self {
        IndexSelection::Bounds(vec![*r.start(), *r.end()])
    }
}

impl<T: Into<IndexSelection>> From<Option<T>> for IndexSelection {
    fn from(o: Option<T>) -> Self {
        o.map(Into::into).unwrap_or(IndexSelection::All)
    }
}

/// A validated, inclusive window of indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexRange {
    first: usize,
    last: usize,
}

impl IndexRange {
    /// Create a range, `first` must not exceed `last`.
    pub fn new(first: usize, last: usize) -> Result<Self> {
        if first > last {
            return Err(ScanError::MalformedRange(vec![first, last]));
        }
        Ok(IndexRange { first, last })
    }

    /// The first index.
    pub fn first(&self) -> usize {
        self.first
    }

    /// The last index, inclusive.
    pub fn last(&self) -> usize {
        self.last
    }

    /// Number of indices in the window.
    pub fn len(&self) -> usize {
        self.last - self.first + 1
    }

    /// Always false, a range holds at least one index.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether the window spans more than one index.
    pub fn is_multi(&self) -> bool {
        self.last > self.first
    }

    /// Whether `n` lies inside the window.
    pub fn contains(&self, n: usize) -> bool {
        n >= self.first && n <= self.last
    }

    /// Iterate over the indices of the window.
    pub fn iter(&self) -> RangeInclusive<usize> {
        self.first..=self.last
    }

    /// The bounds as `[first, last]`.
    pub fn bounds(&self) -> [usize; 2] {
        [self.first, self.last]
    }
}

impl fmt::Display for IndexRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}, {}]", self.first, self.last)
    }
}

/// A requested range which had to be clamped to the file's extent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeWarning {
    /// `"plane"` or `"frame"`.
    pub what: &'static str,
    /// The requested upper bound.
    pub requested: usize,
    /// The range actually used.
    pub used: IndexRange,
}

impl fmt::Display for RangeWarning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Input {} range exceeds the number of {}s in the data file (upper bound {}); using {}s {}",
            self.what, self.what, self.requested, self.what, self.used
        )
    }
}

impl IndexSelection {
    /// Normalize the selection against an extent of `len` indices.
    ///
    /// # Errors
    ///
    /// - `ScanError::MalformedRange` for zero or more than two bounds, or
    ///   decreasing bounds.
    /// - `ScanError::RangeOutOfBounds` if the first index is past the
    ///   extent.
    pub fn normalize(
        &self,
        what: &'static str,
        len: usize,
    ) -> Result<(IndexRange, Option<RangeWarning>)> {
        let (first, last) = match self {
            IndexSelection::All => return Ok((IndexRange::new(0, len.saturating_sub(1))?, None)),
            IndexSelection::Single(n) => (*n, *n),
            IndexSelection::Bounds(b) => match b.as_slice() {
                [n] => (*n, *n),
                [a, b] => (*a, *b),
                _ => return Err(ScanError::MalformedRange(b.clone())),
            },
        };
        if first > last {
            return Err(ScanError::MalformedRange(vec![first, last]));
        }
        if first >= len {
            return Err(ScanError::RangeOutOfBounds(what, first, len));
        }
        if last >= len {
            let used = IndexRange::new(first, len - 1)?;
            let warning = RangeWarning {
                what,
                requested: last,
                used,
            };
            log::warn!("{}", warning);
            return Ok((used, Some(warning)));
        }
        Ok((IndexRange::new(first, last)?, None))
    }
}
