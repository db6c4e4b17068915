//! Row: one record returned by the wide-column store.

use std::collections::BTreeMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RowKey;

/// A single versioned value in a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub value: Bytes,
    pub timestamp: DateTime<Utc>,
}

impl Cell {
    pub fn new(value: impl Into<Bytes>, timestamp: DateTime<Utc>) -> Self {
        Self { value: value.into(), timestamp }
    }
}

/// A row: its key plus `family:qualifier` columns, each holding cells
/// newest first. The scan engine never looks inside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub key: RowKey,
    pub columns: BTreeMap<String, Vec<Cell>>,
}

impl Row {
    pub fn new(key: impl Into<RowKey>) -> Self {
        Self { key: key.into(), columns: BTreeMap::new() }
    }

    /// Column key as stored: `family:qualifier`.
    pub fn column_key(family: &str, qualifier: &str) -> String {
        format!("{family}:{qualifier}")
    }

    /// Add a cell, keeping the column ordered newest first.
    pub fn with_cell(
        mut self,
        family: &str,
        qualifier: &str,
        value: impl Into<Bytes>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        self.push_cell(family, qualifier, Cell::new(value, timestamp));
        self
    }

    pub fn push_cell(&mut self, family: &str, qualifier: &str, cell: Cell) {
        let cells = self.columns.entry(Self::column_key(family, qualifier)).or_default();
        let at = cells.partition_point(|c| c.timestamp > cell.timestamp);
        cells.insert(at, cell);
    }

    /// Newest cell of a column, if the column exists.
    pub fn latest(&self, family: &str, qualifier: &str) -> Option<&Cell> {
        self.columns
            .get(&Self::column_key(family, qualifier))
            .and_then(|cells| cells.first())
    }

    /// All columns belonging to `family`, as `(qualifier, cells)`.
    pub fn family<'a>(&'a self, family: &'a str) -> impl Iterator<Item = (&'a str, &'a [Cell])> + 'a {
        self.columns.iter().filter_map(move |(col, cells)| {
            col.strip_prefix(family)
                .and_then(|rest| rest.strip_prefix(':'))
                .map(|qualifier| (qualifier, cells.as_slice()))
        })
    }
}
