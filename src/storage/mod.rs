//! # Row Store Trait
//!
//! This is THE contract between the read path and the backing wide-column
//! store. The scan engine only ever asks one thing of it: read the rows of
//! one bounded [`RowSet`], possibly many times concurrently.
//!
//! ## Implementations
//!
//! | Store | Module | Description |
//! |-------|--------|-------------|
//! | `MemoryRowStore` | `memory` | Ordered in-memory table for testing/embedding |

pub mod memory;

use async_trait::async_trait;

use crate::Result;
use crate::model::{Row, RowSet};
use crate::scan::CancelSignal;

pub use memory::MemoryRowStore;

// ============================================================================
// Store capabilities
// ============================================================================

/// What a store can take in one request. The scan engine uses this to
/// shrink its batches below the store's own ceiling.
///
/// All fields default to "no constraint".
#[derive(Debug, Clone, Default)]
pub struct StoreCapabilities {
    /// Largest key/range count accepted by a single `read_rows` call.
    pub max_request_len: Option<usize>,
}

// ============================================================================
// RowStore Trait
// ============================================================================

/// The backing-store contract.
///
/// Implementations must tolerate many `read_rows` calls in flight at once;
/// the scan engine issues one per batch without serializing them.
#[async_trait]
pub trait RowStore: Send + Sync + 'static {
    /// Read every row selected by `rows`.
    ///
    /// For a key list, rows come back in list order and missing keys are
    /// skipped. For a range list, rows come back in key order per range.
    /// Either way a row comes back at most once per request, at its first
    /// key or range.
    /// Long-running requests should watch `cancel` and return
    /// `Error::Cancelled` once it fires; the engine also stops awaiting a
    /// request as soon as its group is cancelled.
    async fn read_rows(&self, rows: &RowSet, cancel: &CancelSignal) -> Result<Vec<Row>>;

    /// Release connections or other resources.
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    /// Report request limits.
    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities::default()
    }
}
