use crate::plan::PhysicalPlan;
use std::time::Duration;

pub mod compile;
pub mod dml;
pub mod errors;
pub mod plan;
pub mod printer;

#[cfg(test)]
pub(crate) mod test_utils;

/// A physical context for the result of a query compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalCtx {
    pub plan: PhysicalPlan,
    pub planning_time: Option<Duration>,
}

impl From<PhysicalPlan> for PhysicalCtx {
    fn from(plan: PhysicalPlan) -> Self {
        Self {
            plan,
            planning_time: None,
        }
    }
}
