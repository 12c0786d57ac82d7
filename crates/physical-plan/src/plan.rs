use std::fmt;
use std::sync::Arc;

use basalt_expr::{AggFunc, BinOp, FieldRef, LogOp, OrderType, SubqueryType, Value};
use basalt_primitives::ColId;
use basalt_schema::{StorageHandle, TableSchema};

use crate::dml::{CopyPlan, InsertPlan};

/// A physical plan represents a concrete evaluation strategy.
///
/// The number of inputs of each operator is fixed by its variant:
/// scans, inserts and copies are leaves,
/// filters, sorts and limits always have an input,
/// projections and aggregates may or may not have one.
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicalPlan {
    /// Scan a table row by row, materializing only the bound columns
    TableScan(TableScan),
    /// A tuple-at-a-time filter over a conjunction of predicates
    Filter(Box<PhysicalPlan>, Vec<PhysicalExpr>),
    /// A projection, possibly without input as in `SELECT 1`
    Project(Option<Box<PhysicalPlan>>, Vec<PhysicalExpr>),
    /// A hash aggregate, possibly without input or group keys
    HashAgg(HashAgg),
    /// A full sort of the input
    Order(Box<PhysicalPlan>, Vec<SortKey>),
    Limit(Box<PhysicalPlan>, Limit),
    /// Always the root of a plan
    Insert(InsertPlan),
    /// Always the root of a plan
    Copy(CopyPlan),
}

/// The kind of a physical operator, independent of its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicalOperatorType {
    TableScan,
    Filter,
    Projection,
    HashAggregate,
    Order,
    Limit,
    Insert,
    Copy,
}

impl fmt::Display for PhysicalOperatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TableScan => "SEQ_SCAN",
            Self::Filter => "FILTER",
            Self::Projection => "PROJECTION",
            Self::HashAggregate => "HASH_GROUP_BY",
            Self::Order => "ORDER_BY",
            Self::Limit => "LIMIT",
            Self::Insert => "INSERT",
            Self::Copy => "COPY",
        };
        f.write_str(name)
    }
}

impl PhysicalPlan {
    pub fn op_type(&self) -> PhysicalOperatorType {
        match self {
            Self::TableScan(_) => PhysicalOperatorType::TableScan,
            Self::Filter(..) => PhysicalOperatorType::Filter,
            Self::Project(..) => PhysicalOperatorType::Projection,
            Self::HashAgg(_) => PhysicalOperatorType::HashAggregate,
            Self::Order(..) => PhysicalOperatorType::Order,
            Self::Limit(..) => PhysicalOperatorType::Limit,
            Self::Insert(_) => PhysicalOperatorType::Insert,
            Self::Copy(_) => PhysicalOperatorType::Copy,
        }
    }

    /// The input of this operator, if it has one
    pub fn input(&self) -> Option<&PhysicalPlan> {
        match self {
            Self::Filter(input, _) | Self::Order(input, _) | Self::Limit(input, _) => Some(input.as_ref()),
            Self::Project(input, _) | Self::HashAgg(HashAgg { input, .. }) => input.as_deref(),
            Self::TableScan(_) | Self::Insert(_) | Self::Copy(_) => None,
        }
    }

    /// The children of this operator, in order
    pub fn children(&self) -> impl Iterator<Item = &PhysicalPlan> + '_ {
        self.input().into_iter()
    }

    pub fn is_leaf(&self) -> bool {
        self.input().is_none()
    }

    /// Walks the plan tree and calls `f` on every op.
    /// Does not descend into subquery plans.
    pub fn visit(&self, f: &mut impl FnMut(&Self)) {
        f(self);
        for child in self.children() {
            child.visit(f);
        }
    }

    /// Is there any subplan where `f` returns true?
    pub fn any(&self, f: &impl Fn(&Self) -> bool) -> bool {
        let mut ok = false;
        self.visit(&mut |plan| {
            ok = ok || f(plan);
        });
        ok
    }

    /// The number of operators in this plan
    pub fn size(&self) -> usize {
        let mut n = 0;
        self.visit(&mut |_| n += 1);
        n
    }

    /// The scalar expressions owned by this operator
    pub fn expressions(&self) -> Vec<&PhysicalExpr> {
        match self {
            Self::Filter(_, exprs) | Self::Project(_, exprs) => exprs.iter().collect(),
            Self::HashAgg(HashAgg { select_list, groups, .. }) => select_list.iter().chain(groups).collect(),
            Self::Order(_, keys) => keys.iter().map(|key| &key.expr).collect(),
            Self::Insert(InsertPlan { rows, .. }) => rows.iter().flatten().collect(),
            Self::TableScan(_) | Self::Limit(..) | Self::Copy(_) => vec![],
        }
    }

    /// The plans of the subqueries directly referenced by this operator's expressions
    pub fn subqueries(&self) -> Vec<&SubqueryPlan> {
        let mut subqueries = vec![];
        for expr in self.expressions() {
            expr.visit(&mut |expr| {
                if let PhysicalExpr::Subquery(subquery) = expr {
                    subqueries.push(subquery);
                }
            });
        }
        subqueries
    }
}

/// A sequential scan of a table.
///
/// `columns` are the ids of the columns to materialize,
/// in the order they were bound by the query.
#[derive(Debug, Clone, PartialEq)]
pub struct TableScan {
    pub table: Arc<TableSchema>,
    pub storage: StorageHandle,
    pub columns: Vec<ColId>,
}

impl TableScan {
    /// The names of the scanned columns
    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns
            .iter()
            .filter_map(|id| self.table.get_column(id.idx()))
            .map(|col| col.col_name.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HashAgg {
    pub input: Option<Box<PhysicalPlan>>,
    pub select_list: Vec<PhysicalExpr>,
    /// When empty, the whole input forms a single group
    pub groups: Vec<PhysicalExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub expr: PhysicalExpr,
    pub ty: OrderType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    pub limit: u64,
    pub offset: u64,
}

/// A scalar expression evaluated by a physical operator
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicalExpr {
    Value(Value),
    Field(FieldRef),
    BinOp(BinOp, Box<PhysicalExpr>, Box<PhysicalExpr>),
    LogOp(LogOp, Box<PhysicalExpr>, Box<PhysicalExpr>),
    Not(Box<PhysicalExpr>),
    Agg(AggFunc, Option<Box<PhysicalExpr>>),
    Alias(Box<PhysicalExpr>, Box<str>),
    /// A nested query, already planned
    Subquery(SubqueryPlan),
}

impl PhysicalExpr {
    /// Walk the expression tree and call `f` on each node.
    /// Does not descend into subquery plans.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Self)) {
        f(self);
        match self {
            Self::BinOp(_, a, b) | Self::LogOp(_, a, b) => {
                a.visit(f);
                b.visit(f);
            }
            Self::Not(a) | Self::Alias(a, _) | Self::Agg(_, Some(a)) => a.visit(f),
            Self::Subquery(SubqueryPlan { lhs: Some(lhs), .. }) => lhs.visit(f),
            Self::Value(_) | Self::Field(_) | Self::Agg(_, None) | Self::Subquery(_) => {}
        }
    }
}

/// The physical plan of a nested query
#[derive(Debug, Clone, PartialEq)]
pub struct SubqueryPlan {
    pub ty: SubqueryType,
    /// The left operand of an `IN`
    pub lhs: Option<Box<PhysicalExpr>>,
    pub plan: Box<PhysicalPlan>,
}
