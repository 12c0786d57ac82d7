//! Table metadata as handed to the planner by the catalog.
//!
//! The planner only reads these types. A [TableSchema] maps column names to
//! [ColId]s and carries an opaque [StorageHandle] that is passed through,
//! untouched, into the physical table scan.
//!
//! [ColId]: basalt_primitives::ColId

pub mod schema;
pub mod storage;

pub use schema::{ColumnSchema, TableSchema};
pub use storage::StorageHandle;
