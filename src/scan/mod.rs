//! # Batched Parallel Scan
//!
//! Reads a possibly very large [`RowSet`] without exceeding the store's
//! per-request ceiling, overlapping the latency of the individual requests.
//!
//! ```text
//! RowSet ──partition──▶ [batch 0] [batch 1] … [batch N-1]
//!                           │         │            │        one task each
//!                           ▼         ▼            ▼
//!                      read_rows  read_rows   read_rows     (shared CancelSignal)
//!                           └────────┬┴────────────┘
//!                                    ▼
//!                        completion queue (capacity N)
//!                                    │  drained after every task returned
//!                                    ▼
//!                            visitor(row), one at a time
//! ```
//!
//! ## Ordering
//!
//! Rows reach the visitor batch by batch, in the order batches *completed*.
//! Within a batch the store's order is kept. Nothing else is promised.
//!
//! ## Resource use
//!
//! By default one request per batch is in flight at once, with no upper
//! bound: a row set of a million keys opens a thousand concurrent requests.
//! Set [`ScanConfig::max_in_flight`] to cap that.

pub mod cancel;

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, warn};

use crate::model::{Row, RowSet};
use crate::storage::RowStore;
use crate::{Error, Result};

pub use cancel::CancelSignal;

/// Rows per request when nothing else is configured.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

// ============================================================================
// Configuration
// ============================================================================

/// Scan engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Largest number of keys or ranges sent in one request.
    pub batch_size: usize,
    /// Cap on concurrently issued requests. `None` issues every batch at once.
    pub max_in_flight: Option<usize>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self { batch_size: DEFAULT_BATCH_SIZE, max_in_flight: None }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("scan.batch_size must be at least 1".into()));
        }
        if self.max_in_flight == Some(0) {
            return Err(Error::InvalidConfig("scan.max_in_flight must be at least 1".into()));
        }
        Ok(())
    }
}

// ============================================================================
// Partitioning
// ============================================================================

/// Split `rows` into contiguous batches of at most `batch_size` entries,
/// each keeping the variant of the input. An empty set gives no batches.
pub fn partition(rows: &RowSet, batch_size: usize) -> Result<Vec<RowSet>> {
    if batch_size == 0 {
        return Err(Error::InvalidConfig("batch size must be at least 1".into()));
    }
    Ok(match rows {
        RowSet::Keys(keys) => keys.chunks(batch_size).map(|c| RowSet::Keys(c.to_vec())).collect(),
        RowSet::Ranges(ranges) => {
            ranges.chunks(batch_size).map(|c| RowSet::Ranges(c.to_vec())).collect()
        }
    })
}

// ============================================================================
// ParallelScanner
// ============================================================================

/// Fans a row set out over concurrent batch requests and fans the rows back
/// in to a single visitor.
pub struct ParallelScanner<S: RowStore> {
    store: Arc<S>,
    config: ScanConfig,
}

impl<S: RowStore> ParallelScanner<S> {
    /// Create a scanner. The batch size is lowered to the store's request
    /// ceiling when the store reports one.
    pub fn new(store: Arc<S>, mut config: ScanConfig) -> Result<Self> {
        config.validate()?;
        if let Some(max) = store.capabilities().max_request_len {
            if max == 0 {
                return Err(Error::InvalidConfig("store reports a request ceiling of 0".into()));
            }
            if config.batch_size > max {
                debug!(configured = config.batch_size, ceiling = max, "clamping batch size to store ceiling");
                config.batch_size = max;
            }
        }
        Ok(Self { store, config })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Read every row of `rows` and hand each to `visitor`.
    ///
    /// One task per batch is spawned on the current Tokio runtime. The first
    /// failing batch cancels the rest; its error is returned once every task
    /// has finished, and no row is visited. If all batches succeed the
    /// queued rows are drained into `visitor`; the first visitor error stops
    /// the drain and is returned. Cancelling `ctx` aborts the scan with
    /// [`Error::Cancelled`].
    ///
    /// Repeated keys are requested and visited once. Ranges are sent as
    /// given: overlapping ranges that land in different batches each return
    /// their rows, so keeping ranges disjoint is up to the caller.
    pub async fn read_rows_parallel<F>(&self, rows: RowSet, ctx: &CancelSignal, mut visitor: F) -> Result<()>
    where
        F: FnMut(Row) -> Result<()>,
    {
        let rows = rows.dedup_keys();
        let batches = partition(&rows, self.config.batch_size)?;
        if batches.is_empty() {
            return Ok(());
        }
        let batch_count = batches.len();
        debug!(kind = rows.kind(), len = rows.len(), batches = batch_count, "starting parallel scan");

        let group = CancelSignal::new();
        let _abandon = group.drop_guard();
        let first_error: Arc<Mutex<Option<Error>>> = Arc::new(Mutex::new(None));
        let limiter = self.config.max_in_flight.map(|n| Arc::new(Semaphore::new(n)));
        // Sized to the batch count so no task ever waits on a full queue.
        let (tx, mut rx) = mpsc::channel::<Vec<Row>>(batch_count);

        let mut handles = Vec::with_capacity(batch_count);
        for (index, batch) in batches.into_iter().enumerate() {
            let store = Arc::clone(&self.store);
            let tx = tx.clone();
            let group = group.clone();
            let ctx = ctx.clone();
            let first_error = Arc::clone(&first_error);
            let limiter = limiter.clone();

            handles.push(tokio::spawn(async move {
                match fetch_batch(store.as_ref(), &batch, &group, &ctx, limiter.as_deref()).await {
                    Ok(batch_rows) => {
                        if tx.send(batch_rows).await.is_err() {
                            debug!(batch = index, "completion queue closed before publish");
                        }
                    }
                    Err(err) => {
                        record_first(&first_error, index, err);
                        group.cancel();
                    }
                }
            }));
        }
        drop(tx);

        for (index, handle) in handles.into_iter().enumerate() {
            if let Err(join_err) = handle.await {
                record_first(&first_error, index, Error::TaskFailed(join_err.to_string()));
                group.cancel();
            }
        }

        if let Some(err) = first_error.lock().take() {
            return Err(err);
        }

        let mut visited = 0usize;
        while let Some(batch_rows) = rx.recv().await {
            for row in batch_rows {
                visitor(row)?;
                visited += 1;
            }
        }
        debug!(rows = visited, batches = batch_count, "parallel scan complete");
        Ok(())
    }

    /// Convenience over [`Self::read_rows_parallel`] collecting every row.
    pub async fn collect_rows(&self, rows: RowSet, ctx: &CancelSignal) -> Result<Vec<Row>> {
        let mut out = Vec::new();
        self.read_rows_parallel(rows, ctx, |row| {
            out.push(row);
            Ok(())
        })
        .await?;
        Ok(out)
    }
}

/// Issue one batch request unless the group or the caller gave up first.
async fn fetch_batch<S: RowStore + ?Sized>(
    store: &S,
    batch: &RowSet,
    group: &CancelSignal,
    ctx: &CancelSignal,
    limiter: Option<&Semaphore>,
) -> Result<Vec<Row>> {
    let _permit = match limiter {
        Some(sem) => tokio::select! {
            biased;
            _ = group.cancelled() => return Err(Error::Cancelled),
            _ = ctx.cancelled() => return Err(Error::Cancelled),
            permit = sem.acquire() => Some(permit.map_err(|_| Error::Cancelled)?),
        },
        None => None,
    };
    if group.is_cancelled() || ctx.is_cancelled() {
        return Err(Error::Cancelled);
    }
    tokio::select! {
        biased;
        _ = group.cancelled() => Err(Error::Cancelled),
        _ = ctx.cancelled() => Err(Error::Cancelled),
        result = store.read_rows(batch, group) => result,
    }
}

/// Keep only the first error any task reports.
fn record_first(slot: &Mutex<Option<Error>>, batch: usize, err: Error) {
    let mut slot = slot.lock();
    if slot.is_none() {
        warn!(batch, error = %err, "batch failed, cancelling scan");
        *slot = Some(err);
    } else {
        debug!(batch, error = %err, "batch failed after scan was cancelled");
    }
}

// ============================================================================
// Tests
// ============================================================================
