use std::sync::Arc;

use basalt_primitives::{ColId, TableId};
use basalt_schema::{StorageHandle, TableSchema};

use crate::plan::{PhysicalPlan, TableScan};

/// A table with the given columns and a detached storage handle
pub fn table(id: u32, name: &str, columns: &[&str]) -> Arc<TableSchema> {
    let table_id = TableId(id);
    Arc::new(TableSchema::new(
        table_id,
        name,
        columns.iter().copied(),
        StorageHandle::detached(table_id),
    ))
}

/// A scan of `table` materializing the columns at `cols`
pub fn scan(table: &Arc<TableSchema>, cols: &[u32]) -> PhysicalPlan {
    PhysicalPlan::TableScan(TableScan {
        table: table.clone(),
        storage: table.storage().clone(),
        columns: cols.iter().copied().map(ColId).collect(),
    })
}
