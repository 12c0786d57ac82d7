use std::sync::Arc;

use basalt_expr::{CopyDirection, CopyOptions};
use basalt_schema::TableSchema;

use crate::plan::PhysicalExpr;

/// A plan for inserting rows into a table
#[derive(Debug, Clone, PartialEq)]
pub struct InsertPlan {
    pub table: Arc<TableSchema>,
    pub rows: Vec<Vec<PhysicalExpr>>,
}

/// A plan for copying a table from or to a delimited file
#[derive(Debug, Clone, PartialEq)]
pub struct CopyPlan {
    pub table: Arc<TableSchema>,
    pub file_path: String,
    pub direction: CopyDirection,
    pub options: CopyOptions,
}
