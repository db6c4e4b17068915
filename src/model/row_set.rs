//! Row keys, key ranges and the row sets a scan covers.

use std::fmt;
use std::ops::Bound;

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Opaque row identifier in the backing store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowKey(pub String);

impl RowKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RowKey {
    fn from(s: &str) -> Self {
        RowKey(s.to_string())
    }
}

impl From<String> for RowKey {
    fn from(s: String) -> Self {
        RowKey(s)
    }
}

impl std::borrow::Borrow<str> for RowKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Half-open key interval `[start, end)`. `end: None` runs to the end of
/// the table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowRange {
    pub start: RowKey,
    pub end: Option<RowKey>,
}

impl RowRange {
    pub fn new(start: impl Into<RowKey>, end: impl Into<RowKey>) -> Self {
        Self { start: start.into(), end: Some(end.into()) }
    }

    /// Every key at or after `start`.
    pub fn from_start(start: impl Into<RowKey>) -> Self {
        Self { start: start.into(), end: None }
    }

    /// Every key beginning with `prefix`.
    pub fn prefix(prefix: &str) -> Self {
        Self { start: RowKey::from(prefix), end: prefix_successor(prefix).map(RowKey) }
    }

    pub fn contains(&self, key: &RowKey) -> bool {
        key >= &self.start && self.end.as_ref().is_none_or(|end| key < end)
    }

    /// True when no key can fall inside the range.
    pub fn is_empty(&self) -> bool {
        self.end.as_ref().is_some_and(|end| end <= &self.start)
    }

    /// Bounds usable with `BTreeMap::range`.
    pub fn bounds(&self) -> (Bound<&RowKey>, Bound<&RowKey>) {
        let upper = match &self.end {
            Some(end) => Bound::Excluded(end),
            None => Bound::Unbounded,
        };
        (Bound::Included(&self.start), upper)
    }
}

/// Smallest string greater than every string starting with `prefix`.
/// `None` when no such bound exists (empty prefix, or all chars at `char::MAX`).
fn prefix_successor(prefix: &str) -> Option<String> {
    let mut chars: Vec<char> = prefix.chars().collect();
    while let Some(last) = chars.pop() {
        let mut next = last as u32 + 1;
        // skip the surrogate gap
        if (0xD800..=0xDFFF).contains(&next) {
            next = 0xE000;
        }
        if let Some(c) = char::from_u32(next) {
            chars.push(c);
            return Some(chars.into_iter().collect());
        }
    }
    None
}

/// The full collection of keys or ranges one scan must cover.
///
/// Homogeneous by construction: a set is either an explicit key list or a
/// range list, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowSet {
    Keys(Vec<RowKey>),
    Ranges(Vec<RowRange>),
}

impl RowSet {
    pub fn keys<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<RowKey>,
    {
        RowSet::Keys(keys.into_iter().map(Into::into).collect())
    }

    pub fn ranges(ranges: impl IntoIterator<Item = RowRange>) -> Self {
        RowSet::Ranges(ranges.into_iter().collect())
    }

    /// Build a set from separately gathered keys and ranges.
    ///
    /// Fails when both are non-empty. Two empty inputs give an empty key list.
    pub fn from_parts(keys: Vec<RowKey>, ranges: Vec<RowRange>) -> Result<Self> {
        match (keys.is_empty(), ranges.is_empty()) {
            (false, false) => Err(Error::UnsupportedRowSet(format!(
                "row set mixes {} keys with {} ranges",
                keys.len(),
                ranges.len()
            ))),
            (true, false) => Ok(RowSet::Ranges(ranges)),
            _ => Ok(RowSet::Keys(keys)),
        }
    }

    /// Number of keys or ranges (not rows: a range may match many).
    pub fn len(&self) -> usize {
        match self {
            RowSet::Keys(keys) => keys.len(),
            RowSet::Ranges(ranges) => ranges.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RowSet::Keys(_) => "keys",
            RowSet::Ranges(_) => "ranges",
        }
    }

    /// Drop repeated keys, keeping each at its first position. Range lists
    /// are returned unchanged.
    pub fn dedup_keys(self) -> Self {
        match self {
            RowSet::Keys(mut keys) => {
                let mut seen: HashSet<RowKey> = HashSet::with_capacity(keys.len());
                keys.retain(|k| seen.insert(k.clone()));
                RowSet::Keys(keys)
            }
            ranges => ranges,
        }
    }
}

/// One entry of a loosely built request, before it is checked into a [`RowSet`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowSpec {
    Key(RowKey),
    Range(RowRange),
}

impl TryFrom<Vec<RowSpec>> for RowSet {
    type Error = Error;

    fn try_from(specs: Vec<RowSpec>) -> Result<Self> {
        let mut keys = Vec::new();
        let mut ranges = Vec::new();
        for spec in specs {
            match spec {
                RowSpec::Key(k) => keys.push(k),
                RowSpec::Range(r) => ranges.push(r),
            }
        }
        RowSet::from_parts(keys, ranges)
    }
}
