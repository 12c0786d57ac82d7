use derive_more::Display;

use crate::bind::BindContext;
use crate::logical::LogicalOperator;
use crate::value::Value;

/// Binary comparison and arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BinOp {
    #[display(fmt = "=")]
    Eq,
    #[display(fmt = "<>")]
    Ne,
    #[display(fmt = "<")]
    Lt,
    #[display(fmt = ">")]
    Gt,
    #[display(fmt = "<=")]
    Lte,
    #[display(fmt = ">=")]
    Gte,
    #[display(fmt = "+")]
    Add,
    #[display(fmt = "-")]
    Sub,
    #[display(fmt = "*")]
    Mul,
    #[display(fmt = "/")]
    Div,
}

/// Binary logical operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum LogOp {
    #[display(fmt = "AND")]
    And,
    #[display(fmt = "OR")]
    Or,
}

/// Aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum AggFunc {
    #[display(fmt = "count")]
    Count,
    #[display(fmt = "count_star")]
    CountStar,
    #[display(fmt = "sum")]
    Sum,
    #[display(fmt = "min")]
    Min,
    #[display(fmt = "max")]
    Max,
    #[display(fmt = "avg")]
    Avg,
}

/// A qualified column reference, `table.column`
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display(fmt = "{}.{}", table, column)]
pub struct FieldRef {
    /// The table alias
    pub table: Box<str>,
    pub column: Box<str>,
}

/// A bound scalar expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal value
    Value(Value),
    /// A column reference
    Field(FieldRef),
    /// A binary comparison or arithmetic expression
    BinOp(BinOp, Box<Expr>, Box<Expr>),
    /// A binary logic expression
    LogOp(LogOp, Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    /// An aggregate call, with no argument for `count(*)`
    Agg(AggFunc, Option<Box<Expr>>),
    /// `expr AS name`
    Alias(Box<Expr>, Box<str>),
    /// A nested query
    Subquery(Box<Subquery>),
}

impl Expr {
    pub fn lit(v: impl Into<Value>) -> Self {
        Self::Value(v.into())
    }

    pub fn field(table: &str, column: &str) -> Self {
        Self::Field(FieldRef {
            table: table.into(),
            column: column.into(),
        })
    }

    pub fn bin(op: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Self::BinOp(op, Box::new(lhs), Box::new(rhs))
    }

    pub fn and(lhs: Expr, rhs: Expr) -> Self {
        Self::LogOp(LogOp::And, Box::new(lhs), Box::new(rhs))
    }

    pub fn agg(func: AggFunc, arg: Expr) -> Self {
        Self::Agg(func, Some(Box::new(arg)))
    }

    pub fn count_star() -> Self {
        Self::Agg(AggFunc::CountStar, None)
    }

    pub fn alias(self, name: &str) -> Self {
        Self::Alias(Box::new(self), name.into())
    }

    pub fn subquery(ty: SubqueryType, op: LogicalOperator, ctx: BindContext) -> Self {
        Self::Subquery(Box::new(Subquery { ty, lhs: None, op, ctx }))
    }

    /// `lhs IN (subquery)`
    pub fn in_subquery(lhs: Expr, op: LogicalOperator, ctx: BindContext) -> Self {
        Self::Subquery(Box::new(Subquery {
            ty: SubqueryType::In,
            lhs: Some(Box::new(lhs)),
            op,
            ctx,
        }))
    }

    /// Walk the expression tree and call `f` on each node.
    /// Does not descend into the logical plans of subqueries.
    pub fn visit(&self, f: &mut impl FnMut(&Self)) {
        f(self);
        match self {
            Self::BinOp(_, a, b) | Self::LogOp(_, a, b) => {
                a.visit(f);
                b.visit(f);
            }
            Self::Not(a) | Self::Alias(a, _) | Self::Agg(_, Some(a)) => a.visit(f),
            Self::Subquery(subquery) => {
                if let Some(lhs) = &subquery.lhs {
                    lhs.visit(f);
                }
            }
            Self::Value(_) | Self::Field(_) | Self::Agg(_, None) => {}
        }
    }

    /// Does this expression contain a nested query?
    pub fn has_subquery(&self) -> bool {
        let mut ok = false;
        self.visit(&mut |expr| ok = ok || matches!(expr, Self::Subquery(_)));
        ok
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SubqueryType {
    #[display(fmt = "SCALAR")]
    Scalar,
    #[display(fmt = "EXISTS")]
    Exists,
    #[display(fmt = "IN")]
    In,
}

/// A query nested inside an expression.
///
/// It carries its own logical plan and its own bind context,
/// which are planned independently of the enclosing query.
#[derive(Debug, Clone, PartialEq)]
pub struct Subquery {
    pub ty: SubqueryType,
    /// The left operand of an `IN`
    pub lhs: Option<Box<Expr>>,
    pub op: LogicalOperator,
    pub ctx: BindContext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum OrderType {
    #[default]
    #[display(fmt = "ASC")]
    Asc,
    #[display(fmt = "DESC")]
    Desc,
}

/// One sort key of an ORDER BY
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub expr: Expr,
    pub ty: OrderType,
}

impl OrderBy {
    pub fn asc(expr: Expr) -> Self {
        Self { expr, ty: OrderType::Asc }
    }

    pub fn desc(expr: Expr) -> Self {
        Self {
            expr,
            ty: OrderType::Desc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visit_reaches_nested_subquery() {
        let inner = LogicalOperator::dummy_get().project(vec![Expr::lit(1)]);
        let expr = Expr::and(
            Expr::bin(BinOp::Gt, Expr::field("t", "a"), Expr::lit(0)),
            Expr::Not(Box::new(Expr::subquery(SubqueryType::Exists, inner, BindContext::new()))),
        );
        assert!(expr.has_subquery());
        assert!(!Expr::agg(AggFunc::Sum, Expr::field("t", "x")).has_subquery());
    }

    #[test]
    fn visit_counts_every_node() {
        let expr = Expr::bin(BinOp::Add, Expr::field("t", "a"), Expr::lit(2)).alias("b");
        let mut n = 0;
        expr.visit(&mut |_| n += 1);
        assert_eq!(n, 4);
    }

    #[test]
    fn operators_display_as_sql() {
        assert_eq!(BinOp::Lte.to_string(), "<=");
        assert_eq!(LogOp::Or.to_string(), "OR");
        assert_eq!(AggFunc::Sum.to_string(), "sum");
        assert_eq!(OrderType::Desc.to_string(), "DESC");
        assert_eq!(
            FieldRef {
                table: "t".into(),
                column: "a".into()
            }
            .to_string(),
            "t.a"
        );
    }
}
