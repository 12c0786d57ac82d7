//! The logical input of the physical planner.
//!
//! A [LogicalOperator] tree is produced by the binder together with a
//! [BindContext] recording, per table alias, the columns that the rest of the
//! query references. Both are assumed to be validated already.

pub mod bind;
pub mod expr;
pub mod logical;
pub mod value;

pub use bind::BindContext;
pub use expr::{AggFunc, BinOp, Expr, FieldRef, LogOp, OrderBy, OrderType, Subquery, SubqueryType};
pub use logical::{
    CopyDirection, CopyOptions, LogicalAggregate, LogicalCopy, LogicalFilter, LogicalGet, LogicalInsert, LogicalLimit,
    LogicalOp, LogicalOperator, LogicalOrder, LogicalProjection,
};
pub use value::Value;
