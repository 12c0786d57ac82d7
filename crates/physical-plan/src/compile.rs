//! Lowering from the logical plan to the physical plan.
//!
//! The logical tree is walked depth first.
//! Each supported operator lowers its children before itself,
//! threading the physical plan built so far through the walk,
//! and then either wraps that plan, replaces it, or rejects the shape of the tree.

use std::time::Instant;

use anyhow::{anyhow, Result};
use basalt_expr::{
    BindContext, Expr, LogicalAggregate, LogicalCopy, LogicalFilter, LogicalGet, LogicalInsert, LogicalLimit,
    LogicalOp, LogicalOperator, LogicalOrder, LogicalProjection, OrderBy, Subquery,
};
use basalt_primitives::ColId;
use basalt_schema::TableSchema;
use tracing::{debug, trace};

use crate::dml::{CopyPlan, InsertPlan};
use crate::errors::{InvalidPlan, NotImplemented, PlanError, PlanningFailed};
use crate::plan::{HashAgg, Limit, PhysicalExpr, PhysicalPlan, SortKey, SubqueryPlan, TableScan};
use crate::PhysicalCtx;

/// The maximum number of nested operators, counting the operators of subqueries.
/// Deeper plans are rejected rather than risking a stack overflow.
pub const MAX_PLAN_DEPTH: usize = 256;

/// Lower a bound logical plan into a physical plan.
///
/// Takes ownership of both the plan and its bind context.
/// On failure no plan is returned, only a message:
/// structural errors keep their message,
/// any other error is reported as [PlanningFailed::INTERNAL].
pub fn create_plan(logical: LogicalOperator, ctx: BindContext) -> Result<PhysicalCtx, PlanningFailed> {
    let start = Instant::now();
    match generate(logical, ctx, 0) {
        Ok(plan) => {
            let planning_time = start.elapsed();
            debug!(root = %plan.op_type(), ops = plan.size(), ?planning_time, "created physical plan");
            Ok(PhysicalCtx {
                plan,
                planning_time: Some(planning_time),
            })
        }
        Err(err) => {
            debug!(error = %err, "physical plan generation failed");
            Err(err.into())
        }
    }
}

/// Plan a complete logical tree against its own bind context.
/// This is also where subqueries re-enter the planner.
fn generate(logical: LogicalOperator, ctx: BindContext, depth: usize) -> Result<PhysicalPlan> {
    PlanGenerator { ctx }
        .plan_node(logical, None, depth)?
        .ok_or_else(|| fail(InvalidPlan::NoPlan))
}

fn fail(err: impl Into<PlanError>) -> anyhow::Error {
    anyhow::Error::from(err.into())
}

/// The state of a single (sub)query being planned.
///
/// Nested queries get their own generator,
/// so the outer bind context and the outer plan are never touched by them.
struct PlanGenerator {
    ctx: BindContext,
}

impl PlanGenerator {
    fn plan_node(&self, node: LogicalOperator, plan: Option<PhysicalPlan>, depth: usize) -> Result<Option<PhysicalPlan>> {
        let depth = depth + 1;
        if depth > MAX_PLAN_DEPTH {
            return Err(fail(InvalidPlan::TooDeep(MAX_PLAN_DEPTH)));
        }

        let LogicalOperator { op, children } = node;
        trace!(op = op.name(), children = children.len(), depth, "lowering logical operator");

        // Children are lowered by each supported operator, left to right
        let input = |plan: Option<PhysicalPlan>| {
            children
                .into_iter()
                .try_fold(plan, |plan, child| self.plan_node(child, plan, depth))
        };

        match op {
            LogicalOp::Get(get) => self.plan_get(get, input(plan)?),
            LogicalOp::Filter(filter) => self.plan_filter(filter, input(plan)?, depth).map(Some),
            LogicalOp::Projection(proj) => self.plan_projection(proj, input(plan)?, depth).map(Some),
            LogicalOp::Aggregate(agg) => self.plan_aggregate(agg, input(plan)?, depth).map(Some),
            LogicalOp::Order(order) => self.plan_order(order, input(plan)?, depth).map(Some),
            LogicalOp::Limit(limit) => plan_limit(limit, input(plan)?).map(Some),
            LogicalOp::Insert(insert) => self.plan_insert(insert, input(plan)?, depth).map(Some),
            LogicalOp::Copy(copy) => plan_copy(copy, input(plan)?).map(Some),
            // Rejected whatever its input would have been
            LogicalOp::Distinct => Err(fail(NotImplemented("distinct clause"))),
        }
    }

    fn plan_get(&self, get: LogicalGet, plan: Option<PhysicalPlan>) -> Result<Option<PhysicalPlan>> {
        let LogicalGet { table, alias } = get;
        let Some(table) = table else {
            // A get without a table produces no rows to scan
            return Ok(plan);
        };
        if plan.is_some() {
            return Err(fail(InvalidPlan::ScanNotFirst));
        }
        let columns = self.bound_column_ids(&table, &alias)?;
        Ok(Some(PhysicalPlan::TableScan(TableScan {
            storage: table.storage().clone(),
            table,
            columns,
        })))
    }

    /// Resolve the columns of `alias` that the query references into column ids of `table`
    fn bound_column_ids(&self, table: &TableSchema, alias: &str) -> Result<Vec<ColId>> {
        let columns = self
            .ctx
            .bound_columns(alias)
            .ok_or_else(|| anyhow!("No columns are bound for table alias `{alias}`"))?;
        columns
            .map(|name| {
                table
                    .col_id(name)
                    .ok_or_else(|| anyhow!("`{}` does not have a column `{name}`", table.table_name))
            })
            .collect()
    }

    fn plan_filter(&self, filter: LogicalFilter, plan: Option<PhysicalPlan>, depth: usize) -> Result<PhysicalPlan> {
        let Some(input) = plan else {
            return Err(fail(InvalidPlan::FilterFirst));
        };
        let exprs = self.compile_exprs(filter.expressions, depth)?;
        Ok(PhysicalPlan::Filter(Box::new(input), exprs))
    }

    fn plan_projection(
        &self,
        proj: LogicalProjection,
        plan: Option<PhysicalPlan>,
        depth: usize,
    ) -> Result<PhysicalPlan> {
        let exprs = self.compile_exprs(proj.select_list, depth)?;
        Ok(PhysicalPlan::Project(plan.map(Box::new), exprs))
    }

    fn plan_aggregate(&self, agg: LogicalAggregate, plan: Option<PhysicalPlan>, depth: usize) -> Result<PhysicalPlan> {
        let LogicalAggregate { select_list, groups } = agg;
        let input = match plan {
            // Without a FROM clause a plain aggregate is computed over a single empty row.
            // With one, but without groups, the whole input forms a single group.
            None if groups.is_empty() => None,
            None => return Err(fail(InvalidPlan::GroupByWithoutFrom)),
            Some(input) => Some(Box::new(input)),
        };
        Ok(PhysicalPlan::HashAgg(HashAgg {
            input,
            select_list: self.compile_exprs(select_list, depth)?,
            groups: self.compile_exprs(groups, depth)?,
        }))
    }

    fn plan_order(&self, order: LogicalOrder, plan: Option<PhysicalPlan>, depth: usize) -> Result<PhysicalPlan> {
        let Some(input) = plan else {
            return Err(fail(InvalidPlan::OrderFirst));
        };
        let keys = order
            .description
            .into_iter()
            .map(|OrderBy { expr, ty }| {
                self.compile_expr(expr, depth)
                    .map(|expr| SortKey { expr, ty })
            })
            .collect::<Result<_>>()?;
        Ok(PhysicalPlan::Order(Box::new(input), keys))
    }

    fn plan_insert(&self, insert: LogicalInsert, plan: Option<PhysicalPlan>, depth: usize) -> Result<PhysicalPlan> {
        if plan.is_some() {
            return Err(fail(InvalidPlan::InsertNotRoot));
        }
        let LogicalInsert { table, value_list } = insert;
        let rows = value_list
            .into_iter()
            .map(|row| self.compile_exprs(row, depth))
            .collect::<Result<_>>()?;
        Ok(PhysicalPlan::Insert(InsertPlan { table, rows }))
    }

    fn compile_exprs(&self, exprs: Vec<Expr>, depth: usize) -> Result<Vec<PhysicalExpr>> {
        exprs
            .into_iter()
            .map(|expr| self.compile_expr(expr, depth))
            .collect()
    }

    fn compile_expr(&self, expr: Expr, depth: usize) -> Result<PhysicalExpr> {
        let compile_box = |expr: Box<Expr>| self.compile_expr(*expr, depth).map(Box::new);
        Ok(match expr {
            Expr::Value(v) => PhysicalExpr::Value(v),
            Expr::Field(field) => PhysicalExpr::Field(field),
            Expr::BinOp(op, lhs, rhs) => PhysicalExpr::BinOp(op, compile_box(lhs)?, compile_box(rhs)?),
            Expr::LogOp(op, lhs, rhs) => PhysicalExpr::LogOp(op, compile_box(lhs)?, compile_box(rhs)?),
            Expr::Not(expr) => PhysicalExpr::Not(compile_box(expr)?),
            Expr::Agg(func, arg) => PhysicalExpr::Agg(func, arg.map(compile_box).transpose()?),
            Expr::Alias(expr, name) => PhysicalExpr::Alias(compile_box(expr)?, name),
            Expr::Subquery(subquery) => PhysicalExpr::Subquery(self.plan_subquery(*subquery, depth)?),
        })
    }

    fn plan_subquery(&self, subquery: Subquery, depth: usize) -> Result<SubqueryPlan> {
        let Subquery { ty, lhs, op, ctx } = subquery;
        let lhs = lhs
            .map(|lhs| self.compile_expr(*lhs, depth).map(Box::new))
            .transpose()?;
        debug!(%ty, depth, "planning subquery");
        // Planned from scratch against its own context,
        // so a failure here aborts the enclosing plan as well.
        let plan = generate(op, ctx, depth)?;
        Ok(SubqueryPlan {
            ty,
            lhs,
            plan: Box::new(plan),
        })
    }
}

fn plan_limit(limit: LogicalLimit, plan: Option<PhysicalPlan>) -> Result<PhysicalPlan> {
    let Some(input) = plan else {
        return Err(fail(InvalidPlan::LimitFirst));
    };
    let LogicalLimit { limit, offset } = limit;
    Ok(PhysicalPlan::Limit(Box::new(input), Limit { limit, offset }))
}

fn plan_copy(copy: LogicalCopy, plan: Option<PhysicalPlan>) -> Result<PhysicalPlan> {
    if plan.is_some() {
        return Err(fail(InvalidPlan::CopyNotRoot));
    }
    let LogicalCopy {
        table,
        file_path,
        direction,
        options,
    } = copy;
    Ok(PhysicalPlan::Copy(CopyPlan {
        table,
        file_path,
        direction,
        options,
    }))
}

/// A stateful front end to [create_plan].
///
/// Keeps the outcome of the last call:
/// either a plan or the message explaining why there is none.
#[derive(Debug, Default)]
pub struct PhysicalPlanGenerator {
    plan: Option<PhysicalCtx>,
    message: String,
}

impl PhysicalPlanGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan `logical`, returning whether a plan was produced.
    /// A previous plan or message is discarded.
    pub fn create_plan(&mut self, logical: LogicalOperator, ctx: BindContext) -> bool {
        match create_plan(logical, ctx) {
            Ok(plan) => {
                self.plan = Some(plan);
                self.message.clear();
                true
            }
            Err(err) => {
                self.plan = None;
                self.message = err.into_message();
                false
            }
        }
    }

    pub fn success(&self) -> bool {
        self.plan.is_some()
    }

    pub fn plan(&self) -> Option<&PhysicalCtx> {
        self.plan.as_ref()
    }

    pub fn take_plan(&mut self) -> Option<PhysicalCtx> {
        self.plan.take()
    }

    /// Why the last call failed, or the empty string if it succeeded
    pub fn message(&self) -> &str {
        &self.message
    }
}
