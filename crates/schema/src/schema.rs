use std::collections::HashMap;

use basalt_primitives::{ColId, TableId};

use crate::StorageHandle;

/// A struct representing the schema of a database column.
#[derive(Debug, Clone, PartialEq, Eq, Ord, PartialOrd)]
pub struct ColumnSchema {
    pub table_id: TableId,
    /// Position of the column within the table.
    pub col_pos: ColId,
    pub col_name: Box<str>,
}

/// The schema of a database table.
///
/// Besides its columns, a table schema holds the name-to-column-id map
/// used to resolve bound column names, and the handle to the table's storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub table_id: TableId,
    pub table_name: Box<str>,
    columns: Vec<ColumnSchema>,
    name_map: HashMap<Box<str>, ColId>,
    storage: StorageHandle,
}

impl TableSchema {
    /// Construct a new [TableSchema] from its column names.
    ///
    /// Columns are numbered in the order they are given.
    /// If a name is repeated, the map resolves it to its last position.
    pub fn new<I, S>(table_id: TableId, table_name: impl Into<Box<str>>, columns: I, storage: StorageHandle) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Box<str>>,
    {
        let columns: Vec<_> = columns
            .into_iter()
            .enumerate()
            .map(|(pos, name)| ColumnSchema {
                table_id,
                col_pos: pos.into(),
                col_name: name.into(),
            })
            .collect();
        let name_map = columns
            .iter()
            .map(|col| (col.col_name.clone(), col.col_pos))
            .collect();
        Self {
            table_id,
            table_name: table_name.into(),
            columns,
            name_map,
            storage,
        }
    }

    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    pub fn get_column(&self, pos: usize) -> Option<&ColumnSchema> {
        self.columns.get(pos)
    }

    pub fn get_column_by_name(&self, col_name: &str) -> Option<&ColumnSchema> {
        self.col_id(col_name).and_then(|id| self.get_column(id.idx()))
    }

    /// Translate a column name into its [ColId]
    pub fn col_id(&self, col_name: &str) -> Option<ColId> {
        self.name_map.get(col_name).copied()
    }

    /// The handle to this table's physical storage
    pub fn storage(&self) -> &StorageHandle {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn schema() -> TableSchema {
        TableSchema::new(TableId(4), "t", ["a", "b", "c"], StorageHandle::detached(TableId(4)))
    }

    #[test]
    fn name_map_follows_column_order() {
        let t = schema();
        assert_eq!(t.col_id("a"), Some(ColId(0)));
        assert_eq!(t.col_id("c"), Some(ColId(2)));
        assert_eq!(t.col_id("d"), None);
        assert_eq!(t.columns().len(), 3);
    }

    #[test]
    fn lookup_column_by_name() {
        let t = schema();
        let col = t.get_column_by_name("b").map(|col| (col.col_pos, &*col.col_name));
        assert_eq!(col, Some((ColId(1), "b")));
        assert_eq!(t.get_column_by_name("z"), None);
    }
}
