//! In-memory row store.
//!
//! This is the reference implementation of `RowStore`.
//! It keeps rows in a `BTreeMap` ordered by key, protected by a RwLock.
//!
//! ## Limitations
//!
//! - **No cell expiry**: every cell version ever written is kept.
//! - **No request ceiling**: `capabilities()` reports no limit unless one
//!   is set with [`MemoryRowStore::with_max_request_len`], in which case
//!   oversized requests are rejected the way a real store would.
//!
//! Use this store for:
//! - Testing the scan engine without a network
//! - Embedding the read path over a preloaded snapshot

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use hashbrown::HashSet;
use parking_lot::RwLock;

use crate::model::{Row, RowKey, RowSet};
use crate::scan::CancelSignal;
use crate::{Error, Result};
use super::{RowStore, StoreCapabilities};

// ============================================================================
// MemoryRowStore
// ============================================================================

/// Ordered in-memory table. Clones share the same rows.
#[derive(Clone, Default)]
pub struct MemoryRowStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    rows: RwLock<BTreeMap<RowKey, Row>>,
    /// `read_rows` calls served so far
    requests: AtomicU64,
    max_request_len: Option<usize>,
}

impl MemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that refuses requests larger than `max`.
    pub fn with_max_request_len(max: usize) -> Self {
        Self {
            inner: Arc::new(MemoryInner { max_request_len: Some(max), ..Default::default() }),
        }
    }

    /// Insert or replace a row.
    pub fn insert(&self, row: Row) {
        self.inner.rows.write().insert(row.key.clone(), row);
    }

    pub fn extend(&self, rows: impl IntoIterator<Item = Row>) {
        let mut table = self.inner.rows.write();
        for row in rows {
            table.insert(row.key.clone(), row);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.rows.read().is_empty()
    }

    /// Number of `read_rows` requests issued against this store.
    pub fn request_count(&self) -> u64 {
        self.inner.requests.load(Ordering::Relaxed)
    }
}

// ============================================================================
// RowStore impl
// ============================================================================

#[async_trait]
impl RowStore for MemoryRowStore {
    async fn read_rows(&self, rows: &RowSet, cancel: &CancelSignal) -> Result<Vec<Row>> {
        self.inner.requests.fetch_add(1, Ordering::Relaxed);
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if let Some(max) = self.inner.max_request_len {
            if rows.len() > max {
                return Err(Error::StorageError(format!(
                    "request of {} {} exceeds limit of {max}",
                    rows.len(),
                    rows.kind()
                )));
            }
        }

        // A request's row set is a set: each row comes back at most once.
        let table = self.inner.rows.read();
        let mut emitted: HashSet<&RowKey> = HashSet::new();
        let out = match rows {
            RowSet::Keys(keys) => keys
                .iter()
                .filter(|k| emitted.insert(*k))
                .filter_map(|k| table.get(k).cloned())
                .collect(),
            RowSet::Ranges(ranges) => {
                let mut out = Vec::new();
                for range in ranges.iter().filter(|r| !r.is_empty()) {
                    out.extend(
                        table
                            .range::<RowKey, _>(range.bounds())
                            .filter(|(key, _)| emitted.insert(*key))
                            .map(|(_, row)| row.clone()),
                    );
                }
                out
            }
        };
        Ok(out)
    }

    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities { max_request_len: self.inner.max_request_len }
    }
}

// ============================================================================
// Tests
// ============================================================================
