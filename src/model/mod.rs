//! # Read-Path Model
//!
//! Plain DTOs shared by the scan engine, the storage contract and the
//! containment table. Rows are what the wide-column store hands back;
//! type pairs are what the containment closure is keyed by.
//!
//! Design rule: this module is pure data: no I/O, no state, no async.

pub mod row;
pub mod row_set;
pub mod type_pair;

pub use row::{Cell, Row};
pub use row_set::{RowKey, RowRange, RowSet, RowSpec};
pub use type_pair::{ContainmentEdge, TypeName, TypePair};
