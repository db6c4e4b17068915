//! # kg-store: Knowledge-Graph Store Read Path
//!
//! The two pieces of the query service's read path that do real work:
//!
//! 1. **Batched parallel scans** over a sharded wide-column store: a row set
//!    of any size is cut into batches under the store's request ceiling and
//!    fetched concurrently, with the first failure cancelling the rest.
//! 2. **Type containment closure**: `City ⊂ County ⊂ State` is expanded once
//!    at startup into a table answering "is X inside Y, and through what?"
//!    with a single lookup.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `RowStore` is the contract between the scan engine and storage
//! 2. **Explicit config**: no process-wide constants; `StoreConfig` is passed in
//! 3. **Build once, share freely**: the closure table is immutable after construction
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kg_store::{CancelSignal, ContainmentFact, Row, RowSet, Store, StoreConfig};
//!
//! # async fn example() -> kg_store::Result<()> {
//! let facts = vec![
//!     ContainmentFact::new("containedInPlace", "City", "County"),
//!     ContainmentFact::new("containedInPlace", "County", "State"),
//! ];
//! let store = Store::open_memory(StoreConfig::default(), &facts)?;
//! store.backend().insert(Row::new("d/3/geoId/06"));
//!
//! store
//!     .read_rows_parallel(RowSet::keys(["d/3/geoId/06"]), &CancelSignal::new(), |row| {
//!         println!("{}", row.key);
//!         Ok(())
//!     })
//!     .await?;
//!
//! assert_eq!(store.contained_in_path("City", "State"), Some(&["County".to_string()][..]));
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod config;
pub mod containment;
pub mod model;
pub mod scan;
pub mod storage;

use std::sync::Arc;

use tracing::info;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    Cell, ContainmentEdge, Row, RowKey, RowRange, RowSet, RowSpec, TypeName, TypePair,
};

// ============================================================================
// Re-exports: Storage, scan, containment, config
// ============================================================================

pub use config::{KeyPrefixes, StoreConfig};
pub use containment::{
    ContainmentClosure, ContainmentConfig, ContainmentFact, load_facts, parse_facts,
};
pub use scan::{CancelSignal, ParallelScanner, ScanConfig, partition};
pub use storage::{MemoryRowStore, RowStore, StoreCapabilities};

// ============================================================================
// Top-level Store handle
// ============================================================================

/// The primary entry point. A `Store` wraps a backing row store together
/// with the containment table built for it at construction.
pub struct Store<S: RowStore> {
    scanner: ParallelScanner<S>,
    config: StoreConfig,
    containment: Arc<ContainmentClosure>,
}

impl<S: RowStore> Store<S> {
    /// Validate `config`, build the containment closure from `facts` and
    /// wrap `backend`.
    pub fn new(backend: S, config: StoreConfig, facts: &[ContainmentFact]) -> Result<Self> {
        config.validate()?;
        let containment = ContainmentClosure::from_facts(facts, &config.containment.predicate);
        let scanner = ParallelScanner::new(Arc::new(backend), config.scan.clone())?;
        info!(
            batch_size = scanner.config().batch_size,
            containment_pairs = containment.len(),
            "store ready"
        );
        Ok(Self { scanner, config, containment: Arc::new(containment) })
    }

    /// Read the rows of `rows` in parallel batches; see
    /// [`ParallelScanner::read_rows_parallel`].
    pub async fn read_rows_parallel<F>(&self, rows: RowSet, ctx: &CancelSignal, visitor: F) -> Result<()>
    where
        F: FnMut(Row) -> Result<()>,
    {
        self.scanner.read_rows_parallel(rows, ctx, visitor).await
    }

    pub async fn collect_rows(&self, rows: RowSet, ctx: &CancelSignal) -> Result<Vec<Row>> {
        self.scanner.collect_rows(rows, ctx).await
    }

    /// The shared, read-only containment table.
    pub fn containment(&self) -> Arc<ContainmentClosure> {
        Arc::clone(&self.containment)
    }

    /// Types strictly between `child` and `ancestor`, or `None` when `child`
    /// is not known to be contained in `ancestor`.
    pub fn contained_in_path(&self, child: &str, ancestor: &str) -> Option<&[TypeName]> {
        self.containment.path(child, ancestor)
    }

    pub fn key_prefixes(&self) -> &KeyPrefixes {
        &self.config.keys
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Access the underlying store (for advanced use).
    pub fn backend(&self) -> &S {
        self.scanner.store()
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.scanner.store().shutdown().await
    }
}

/// In-memory store for testing and embedding.
impl Store<MemoryRowStore> {
    pub fn open_memory(config: StoreConfig, facts: &[ContainmentFact]) -> Result<Self> {
        Self::new(MemoryRowStore::new(), config, facts)
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unsupported row set: {0}")]
    UnsupportedRowSet(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Scan cancelled")]
    Cancelled,

    #[error("Visitor error: {0}")]
    VisitorError(String),

    #[error("Scan task failed: {0}")]
    TaskFailed(String),

    #[error("Malformed containment facts: {0}")]
    MalformedFacts(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
