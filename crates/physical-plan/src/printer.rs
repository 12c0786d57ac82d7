use std::fmt;

use basalt_expr::{AggFunc, CopyDirection, SubqueryType};
use itertools::Itertools;

use crate::plan::{HashAgg, Limit, PhysicalExpr, PhysicalPlan, SubqueryPlan};
use crate::PhysicalCtx;

/// The options for the printer
///
/// By default:
///
/// * `show_exprs: false`
/// * `show_timings: false`
#[derive(Debug, Copy, Clone)]
pub struct ExplainOptions {
    pub show_exprs: bool,
    pub show_timings: bool,
}

impl ExplainOptions {
    pub fn new() -> Self {
        Self {
            show_exprs: false,
            show_timings: false,
        }
    }

    /// Print the output expressions of projections and aggregates
    pub fn with_exprs(mut self) -> Self {
        self.show_exprs = true;
        self
    }

    pub fn with_timings(mut self) -> Self {
        self.show_timings = true;
        self
    }
}

impl Default for ExplainOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// A formated line of output
enum Line<'a> {
    TableScan {
        table: &'a str,
        columns: Vec<&'a str>,
        ident: u16,
    },
    Filter {
        expr: String,
        ident: u16,
    },
    Projection {
        ident: u16,
    },
    HashAgg {
        ident: u16,
    },
    GroupKey {
        keys: String,
        ident: u16,
    },
    Output {
        exprs: String,
        ident: u16,
    },
    Sort {
        keys: String,
        ident: u16,
    },
    Limit {
        limit: &'a Limit,
        ident: u16,
    },
    Insert {
        table: &'a str,
        rows: usize,
        ident: u16,
    },
    Copy {
        table: &'a str,
        direction: CopyDirection,
        file_path: &'a str,
        ident: u16,
    },
    SubPlan {
        id: usize,
    },
}

impl Line<'_> {
    fn ident(&self) -> usize {
        let ident = match self {
            Line::TableScan { ident, .. } => *ident,
            Line::Filter { ident, .. } => *ident,
            Line::Projection { ident } => *ident,
            Line::HashAgg { ident } => *ident,
            Line::GroupKey { ident, .. } => *ident,
            Line::Output { ident, .. } => *ident,
            Line::Sort { ident, .. } => *ident,
            Line::Limit { ident, .. } => *ident,
            Line::Insert { ident, .. } => *ident,
            Line::Copy { ident, .. } => *ident,
            Line::SubPlan { .. } => 0,
        };
        ident as usize
    }

    /// Is this the header of an operator, as opposed to one of its properties?
    fn is_node(&self) -> bool {
        !matches!(self, Line::GroupKey { .. } | Line::Output { .. } | Line::SubPlan { .. })
    }
}

/// A list of lines to print,
/// plus the subquery plans referenced by them, numbered in order of appearance
struct Lines<'a> {
    lines: Vec<Line<'a>>,
    subplans: Vec<&'a SubqueryPlan>,
    show_exprs: bool,
}

impl<'a> Lines<'a> {
    fn new(options: ExplainOptions) -> Self {
        Self {
            lines: Vec::new(),
            subplans: Vec::new(),
            show_exprs: options.show_exprs,
        }
    }

    fn add(&mut self, line: Line<'a>) {
        self.lines.push(line);
    }

    /// Register a subquery plan and return its number
    fn add_subplan(&mut self, subplan: &'a SubqueryPlan) -> usize {
        self.subplans.push(subplan);
        self.subplans.len()
    }

    fn exprs(&mut self, exprs: impl IntoIterator<Item = &'a PhysicalExpr>, sep: &str) -> String {
        exprs.into_iter().map(|expr| self.expr(expr)).join(sep)
    }

    /// Render an expression that is an operand of another one
    fn operand(&mut self, expr: &'a PhysicalExpr) -> String {
        match expr {
            PhysicalExpr::BinOp(..) | PhysicalExpr::LogOp(..) => format!("({})", self.expr(expr)),
            _ => self.expr(expr),
        }
    }

    fn expr(&mut self, expr: &'a PhysicalExpr) -> String {
        match expr {
            PhysicalExpr::Value(val) => val.to_string(),
            PhysicalExpr::Field(field) => field.to_string(),
            PhysicalExpr::BinOp(op, lhs, rhs) => {
                let lhs = self.operand(lhs);
                let rhs = self.operand(rhs);
                format!("{lhs} {op} {rhs}")
            }
            PhysicalExpr::LogOp(op, lhs, rhs) => {
                let lhs = self.operand(lhs);
                let rhs = self.operand(rhs);
                format!("{lhs} {op} {rhs}")
            }
            PhysicalExpr::Not(expr) => format!("NOT {}", self.operand(expr)),
            PhysicalExpr::Agg(AggFunc::CountStar, _) => "count(*)".to_owned(),
            PhysicalExpr::Agg(func, arg) => {
                let arg = arg.as_deref().map(|arg| self.expr(arg)).unwrap_or_default();
                format!("{func}({arg})")
            }
            PhysicalExpr::Alias(expr, name) => format!("{} AS {name}", self.expr(expr)),
            PhysicalExpr::Subquery(subquery) => {
                let lhs = subquery.lhs.as_deref().map(|lhs| self.operand(lhs));
                let id = self.add_subplan(subquery);
                match (subquery.ty, lhs) {
                    (SubqueryType::In, Some(lhs)) => format!("{lhs} IN (SubPlan {id})"),
                    (SubqueryType::Exists, _) => format!("EXISTS (SubPlan {id})"),
                    _ => format!("(SubPlan {id})"),
                }
            }
        }
    }

    fn output(&mut self, exprs: &'a [PhysicalExpr], ident: u16) {
        if self.show_exprs {
            let exprs = self.exprs(exprs, ", ");
            self.add(Line::Output { exprs, ident });
        }
    }
}

fn eval_plan<'a>(lines: &mut Lines<'a>, plan: &'a PhysicalPlan, ident: u16) {
    match plan {
        PhysicalPlan::TableScan(scan) => {
            lines.add(Line::TableScan {
                table: &scan.table.table_name,
                columns: scan.column_names().collect(),
                ident,
            });
        }
        PhysicalPlan::Filter(input, exprs) => {
            let expr = lines.exprs(exprs, " AND ");
            lines.add(Line::Filter { expr, ident });
            eval_plan(lines, input, ident + 2);
        }
        PhysicalPlan::Project(input, exprs) => {
            lines.add(Line::Projection { ident });
            lines.output(exprs, ident + 2);
            if let Some(input) = input {
                eval_plan(lines, input, ident + 2);
            }
        }
        PhysicalPlan::HashAgg(HashAgg {
            input,
            select_list,
            groups,
        }) => {
            lines.add(Line::HashAgg { ident });
            if !groups.is_empty() {
                let keys = lines.exprs(groups, ", ");
                lines.add(Line::GroupKey { keys, ident: ident + 2 });
            }
            lines.output(select_list, ident + 2);
            if let Some(input) = input {
                eval_plan(lines, input, ident + 2);
            }
        }
        PhysicalPlan::Order(input, keys) => {
            let keys = keys
                .iter()
                .map(|key| format!("{} {}", lines.expr(&key.expr), key.ty))
                .join(", ");
            lines.add(Line::Sort { keys, ident });
            eval_plan(lines, input, ident + 2);
        }
        PhysicalPlan::Limit(input, limit) => {
            lines.add(Line::Limit { limit, ident });
            eval_plan(lines, input, ident + 2);
        }
        PhysicalPlan::Insert(insert) => {
            // Values are not printed, but may still reference subplans
            for expr in insert.rows.iter().flatten() {
                lines.expr(expr);
            }
            lines.add(Line::Insert {
                table: &insert.table.table_name,
                rows: insert.rows.len(),
                ident,
            });
        }
        PhysicalPlan::Copy(copy) => {
            lines.add(Line::Copy {
                table: &copy.table.table_name,
                direction: copy.direction,
                file_path: &copy.file_path,
                ident,
            });
        }
    }
}

/// A pretty printer for physical plans
///
/// The printer will format the plan in a human-readable format, suitable for the `EXPLAIN` command.
/// Subquery plans are printed after the main plan, numbered in the order they are referenced.
///
/// It also supports:
///
/// - Showing the output expressions of each operator
/// - Showing the planning time
pub struct Explain<'a> {
    ctx: &'a PhysicalCtx,
    lines: Vec<Line<'a>>,
    options: ExplainOptions,
}

impl<'a> Explain<'a> {
    pub fn new(ctx: &'a PhysicalCtx) -> Self {
        Self {
            ctx,
            lines: Vec::new(),
            options: ExplainOptions::new(),
        }
    }

    /// Set the options for the printer
    pub fn with_options(mut self, options: ExplainOptions) -> Self {
        self.options = options;
        self
    }

    /// Evaluate the plan and build the lines to print
    fn lines(&self) -> Lines<'a> {
        let mut lines = Lines::new(self.options);
        eval_plan(&mut lines, &self.ctx.plan, 0);

        // Subplans may reference further subplans, which are appended as they are found
        let mut next = 0;
        while let Some(subplan) = lines.subplans.get(next).copied() {
            next += 1;
            lines.add(Line::SubPlan { id: next });
            eval_plan(&mut lines, &subplan.plan, 2);
        }
        lines
    }

    /// Build the `Explain` output
    pub fn build(self) -> Self {
        let lines = self.lines();
        Self {
            lines: lines.lines,
            ..self
        }
    }
}

impl fmt::Display for Line<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ident = self.ident();
        let arrow = if ident > 0 && self.is_node() { "-> " } else { "" };
        write!(f, "{:ident$}{arrow}", "")?;

        match self {
            Line::TableScan { table, columns, .. } => {
                write!(f, "Seq Scan on {table} ({})", columns.iter().join(", "))
            }
            Line::Filter { expr, .. } => write!(f, "Filter: ({expr})"),
            Line::Projection { .. } => write!(f, "Projection"),
            Line::HashAgg { .. } => write!(f, "Hash Aggregate"),
            Line::GroupKey { keys, .. } => write!(f, "Group Key: ({keys})"),
            Line::Output { exprs, .. } => write!(f, "Output: {exprs}"),
            Line::Sort { keys, .. } => write!(f, "Sort: {keys}"),
            Line::Limit { limit, .. } => {
                write!(f, "Limit: {}", limit.limit)?;
                if limit.offset > 0 {
                    write!(f, " Offset: {}", limit.offset)?;
                }
                Ok(())
            }
            Line::Insert { table, rows, .. } => {
                let plural = if *rows == 1 { "" } else { "s" };
                write!(f, "Insert on {table} ({rows} row{plural})")
            }
            Line::Copy {
                table,
                direction,
                file_path,
                ..
            } => write!(f, "Copy {table} {direction} '{file_path}'"),
            Line::SubPlan { id } => write!(f, "SubPlan {id}"),
        }
    }
}

impl fmt::Display for Explain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lines.iter().join("\n"))?;

        if self.options.show_timings {
            if let Some(planning_time) = self.ctx.planning_time {
                write!(f, "\nPlanning Time: {planning_time:?}")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::create_plan;
    use crate::test_utils::table;
    use basalt_expr::{BinOp, BindContext, CopyOptions, Expr, LogicalOperator, OrderBy};
    use expect_test::{expect, Expect};
    use std::time::Duration;

    fn ctx<const N: usize>(bindings: [(&'static str, Vec<&'static str>); N]) -> BindContext {
        BindContext::from_iter(bindings)
    }

    fn check(logical: LogicalOperator, ctx: BindContext, options: ExplainOptions, expect: Expect) {
        let plan = match create_plan(logical, ctx) {
            Ok(plan) => plan,
            Err(err) => panic!("failed to plan: {err}"),
        };
        let explain = Explain::new(&plan).with_options(options).build();
        expect.assert_eq(&explain.to_string());
    }

    #[test]
    fn scan_with_filter_sort_and_limit() {
        let t = table(0, "t", &["a", "b", "c"]);
        let logical = LogicalOperator::get(t, "t")
            .filter(vec![
                Expr::bin(BinOp::Gt, Expr::field("t", "a"), Expr::lit(1)),
                Expr::bin(BinOp::Eq, Expr::field("t", "c"), Expr::lit("x")),
            ])
            .order_by(vec![OrderBy::desc(Expr::field("t", "a")), OrderBy::asc(Expr::field("t", "c"))])
            .limit(10, 5);

        check(
            logical,
            ctx([("t", vec!["a", "c"])]),
            ExplainOptions::default(),
            expect![[r#"
                Limit: 10 Offset: 5
                  -> Sort: t.a DESC, t.c ASC
                    -> Filter: (t.a > 1 AND t.c = 'x')
                      -> Seq Scan on t (a, c)"#]],
        );
    }

    #[test]
    fn aggregate_with_groups() {
        let t = table(0, "t", &["g", "x"]);
        let logical = LogicalOperator::get(t, "t")
            .aggregate(
                vec![
                    Expr::field("t", "g"),
                    Expr::agg(basalt_expr::AggFunc::Sum, Expr::field("t", "x")).alias("total"),
                ],
                vec![Expr::field("t", "g")],
            )
            .project(vec![Expr::field("t", "g"), Expr::field("t", "total")]);

        check(
            logical,
            ctx([("t", vec!["g", "x"])]),
            ExplainOptions::new().with_exprs(),
            expect![[r#"
                Projection
                  Output: t.g, t.total
                  -> Hash Aggregate
                    Group Key: (t.g)
                    Output: t.g, sum(t.x) AS total
                    -> Seq Scan on t (g, x)"#]],
        );
    }

    #[test]
    fn aggregate_without_input() {
        check(
            LogicalOperator::dummy_get().aggregate(vec![Expr::count_star()], vec![]),
            BindContext::new(),
            ExplainOptions::new().with_exprs(),
            expect![[r#"
                Hash Aggregate
                  Output: count(*)"#]],
        );
    }

    #[test]
    fn insert_and_copy() {
        let t = table(0, "t", &["a", "b"]);
        check(
            LogicalOperator::insert(t.clone(), vec![vec![Expr::lit(1), Expr::lit("x")]; 2]),
            BindContext::new(),
            ExplainOptions::default(),
            expect!["Insert on t (2 rows)"],
        );
        check(
            LogicalOperator::copy(t, "f.csv", CopyDirection::From, CopyOptions::default()),
            BindContext::new(),
            ExplainOptions::default(),
            expect!["Copy t From 'f.csv'"],
        );
    }

    #[test]
    fn subplans_are_numbered_in_order() {
        let t = table(0, "t", &["a", "b"]);
        let s = table(1, "s", &["x", "y"]);

        let in_list = LogicalOperator::get(s.clone(), "s").project(vec![Expr::field("s", "x")]);
        let exists = LogicalOperator::get(s, "s").filter(vec![Expr::bin(
            BinOp::Lt,
            Expr::field("s", "y"),
            Expr::lit(0),
        )]);
        let logical = LogicalOperator::get(t, "t").filter(vec![Expr::and(
            Expr::in_subquery(Expr::field("t", "a"), in_list, ctx([("s", vec!["x"])])),
            Expr::subquery(basalt_expr::SubqueryType::Exists, exists, ctx([("s", vec!["y"])])),
        )]);

        check(
            logical,
            ctx([("t", vec!["a", "b"])]),
            ExplainOptions::default(),
            expect![[r#"
                Filter: (t.a IN (SubPlan 1) AND EXISTS (SubPlan 2))
                  -> Seq Scan on t (a, b)
                SubPlan 1
                  -> Projection
                    -> Seq Scan on s (x)
                SubPlan 2
                  -> Filter: (s.y < 0)
                    -> Seq Scan on s (y)"#]],
        );
    }

    #[test]
    fn planning_time_is_appended() {
        let t = table(0, "t", &["a"]);
        let plan = PhysicalCtx {
            planning_time: Some(Duration::from_millis(3)),
            ..create_plan(LogicalOperator::get(t, "t"), ctx([("t", vec!["a"])])).unwrap()
        };

        let explain = Explain::new(&plan)
            .with_options(ExplainOptions::new().with_timings())
            .build();
        expect![[r#"
            Seq Scan on t (a)
            Planning Time: 3ms"#]]
        .assert_eq(&explain.to_string());

        let explain = Explain::new(&plan).build();
        expect!["Seq Scan on t (a)"].assert_eq(&explain.to_string());
    }
}
