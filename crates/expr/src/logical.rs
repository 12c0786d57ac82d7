use std::sync::Arc;

use basalt_schema::TableSchema;
use derive_more::Display;

use crate::expr::{Expr, OrderBy};

/// A node of a logical plan.
///
/// Every node exclusively owns its children.
/// Most operators have a single child, but the tree does not enforce arity;
/// positional constraints are checked when the plan is lowered.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalOperator {
    pub op: LogicalOp,
    pub children: Vec<LogicalOperator>,
}

/// The closed set of logical operators
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalOp {
    /// A table scan
    Get(LogicalGet),
    Filter(LogicalFilter),
    Projection(LogicalProjection),
    Aggregate(LogicalAggregate),
    Order(LogicalOrder),
    Limit(LogicalLimit),
    Insert(LogicalInsert),
    Copy(LogicalCopy),
    Distinct,
}

impl LogicalOp {
    /// The name of the operator
    pub fn name(&self) -> &'static str {
        match self {
            Self::Get(_) => "Get",
            Self::Filter(_) => "Filter",
            Self::Projection(_) => "Projection",
            Self::Aggregate(_) => "Aggregate",
            Self::Order(_) => "Order",
            Self::Limit(_) => "Limit",
            Self::Insert(_) => "Insert",
            Self::Copy(_) => "Copy",
            Self::Distinct => "Distinct",
        }
    }
}

macro_rules! logical_op_from {
    ($($variant:ident($ty:ident)),* $(,)?) => {
        $(
            impl From<$ty> for LogicalOp {
                fn from(op: $ty) -> Self {
                    Self::$variant(op)
                }
            }
        )*
    };
}

logical_op_from!(
    Get(LogicalGet),
    Filter(LogicalFilter),
    Projection(LogicalProjection),
    Aggregate(LogicalAggregate),
    Order(LogicalOrder),
    Limit(LogicalLimit),
    Insert(LogicalInsert),
    Copy(LogicalCopy),
);

/// A scan of the table bound to `alias`.
/// A get without a table stands in for an empty FROM clause.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalGet {
    pub table: Option<Arc<TableSchema>>,
    pub alias: Box<str>,
}

/// A conjunction of predicates
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalFilter {
    pub expressions: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalProjection {
    pub select_list: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalAggregate {
    pub select_list: Vec<Expr>,
    pub groups: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalOrder {
    pub description: Vec<OrderBy>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalLimit {
    pub limit: u64,
    pub offset: u64,
}

/// Rows of values to insert into `table`
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalInsert {
    pub table: Arc<TableSchema>,
    pub value_list: Vec<Vec<Expr>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum CopyDirection {
    /// `COPY table FROM file`
    #[display(fmt = "From")]
    From,
    /// `COPY table TO file`
    #[display(fmt = "To")]
    To,
}

/// The CSV dialect of a COPY
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyOptions {
    pub delimiter: char,
    pub quote: char,
    pub escape: char,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote: '"',
            escape: '"',
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalCopy {
    pub table: Arc<TableSchema>,
    pub file_path: String,
    pub direction: CopyDirection,
    pub options: CopyOptions,
}

impl LogicalOperator {
    pub fn new(op: impl Into<LogicalOp>, children: Vec<LogicalOperator>) -> Self {
        Self {
            op: op.into(),
            children,
        }
    }

    /// An operator without children
    pub fn leaf(op: impl Into<LogicalOp>) -> Self {
        Self::new(op, vec![])
    }

    pub fn get(table: Arc<TableSchema>, alias: &str) -> Self {
        Self::leaf(LogicalGet {
            table: Some(table),
            alias: alias.into(),
        })
    }

    /// A get that is not backed by a table, e.g. for `SELECT 1`
    pub fn dummy_get() -> Self {
        Self::leaf(LogicalGet {
            table: None,
            alias: "".into(),
        })
    }

    pub fn insert(table: Arc<TableSchema>, value_list: Vec<Vec<Expr>>) -> Self {
        Self::leaf(LogicalInsert { table, value_list })
    }

    pub fn copy(table: Arc<TableSchema>, file_path: &str, direction: CopyDirection, options: CopyOptions) -> Self {
        Self::leaf(LogicalCopy {
            table,
            file_path: file_path.to_owned(),
            direction,
            options,
        })
    }

    /// Wrap this plan in a filter
    pub fn filter(self, expressions: Vec<Expr>) -> Self {
        Self::new(LogicalFilter { expressions }, vec![self])
    }

    /// Wrap this plan in a projection
    pub fn project(self, select_list: Vec<Expr>) -> Self {
        Self::new(LogicalProjection { select_list }, vec![self])
    }

    /// Wrap this plan in an aggregate
    pub fn aggregate(self, select_list: Vec<Expr>, groups: Vec<Expr>) -> Self {
        Self::new(LogicalAggregate { select_list, groups }, vec![self])
    }

    /// Wrap this plan in a sort
    pub fn order_by(self, description: Vec<OrderBy>) -> Self {
        Self::new(LogicalOrder { description }, vec![self])
    }

    /// Wrap this plan in a limit
    pub fn limit(self, limit: u64, offset: u64) -> Self {
        Self::new(LogicalLimit { limit, offset }, vec![self])
    }

    /// Wrap this plan in a distinct
    pub fn distinct(self) -> Self {
        Self {
            op: LogicalOp::Distinct,
            children: vec![self],
        }
    }

    /// Walks the plan tree, parents before children, and calls `f` on every op
    pub fn visit(&self, f: &mut impl FnMut(&Self)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basalt_primitives::TableId;
    use basalt_schema::StorageHandle;
    use pretty_assertions::assert_eq;

    fn table() -> Arc<TableSchema> {
        Arc::new(TableSchema::new(
            TableId(0),
            "t",
            ["a", "b"],
            StorageHandle::detached(TableId(0)),
        ))
    }

    #[test]
    fn builders_nest_children() {
        let plan = LogicalOperator::get(table(), "t")
            .filter(vec![Expr::field("t", "a")])
            .project(vec![Expr::field("t", "b")])
            .limit(10, 0);

        let mut names = vec![];
        plan.visit(&mut |op| names.push(op.op.name()));
        assert_eq!(names, ["Limit", "Projection", "Filter", "Get"]);
    }

    #[test]
    fn copy_defaults_to_csv() {
        let options = CopyOptions::default();
        assert_eq!((options.delimiter, options.quote, options.escape), (',', '"', '"'));
    }
}
