use thiserror::Error;

/// An operator appears in a position that the physical plan does not allow
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidPlan {
    #[error("Scan has to be the first node of a plan!")]
    ScanNotFirst,
    #[error("Filter cannot be the first node of a plan!")]
    FilterFirst,
    #[error("Order cannot be the first node of a plan!")]
    OrderFirst,
    #[error("Limit cannot be the first node of a plan!")]
    LimitFirst,
    #[error("Insert should be root node")]
    InsertNotRoot,
    #[error("Copy should be root node")]
    CopyNotRoot,
    #[error("Cannot have GROUP BY without FROM clause!")]
    GroupByWithoutFrom,
    #[error("Unknown error in physical plan generation")]
    NoPlan,
    #[error("Plan exceeds the maximum nesting depth of {0}")]
    TooDeep(usize),
}

/// A recognized construct that cannot be planned yet
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Not implemented: {0}")]
pub struct NotImplemented(pub &'static str);

/// The errors whose messages are reported to the caller as is
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error(transparent)]
    Invalid(#[from] InvalidPlan),
    #[error(transparent)]
    NotImplemented(#[from] NotImplemented),
}

/// The only error returned by [crate::compile::create_plan].
///
/// Errors raised while lowering are collapsed into a message:
/// a [PlanError] keeps its own message,
/// anything else is reported as [PlanningFailed::INTERNAL].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct PlanningFailed {
    message: String,
}

impl PlanningFailed {
    pub const INTERNAL: &'static str = "UNHANDLED EXCEPTION TYPE THROWN IN PLANNER!";

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn into_message(self) -> String {
        self.message
    }

    /// Is this a failure that the planner did not anticipate?
    pub fn is_internal(&self) -> bool {
        self.message == Self::INTERNAL
    }
}

impl From<anyhow::Error> for PlanningFailed {
    fn from(err: anyhow::Error) -> Self {
        let message = match err.downcast_ref::<PlanError>() {
            Some(err) => err.to_string(),
            None => Self::INTERNAL.to_owned(),
        };
        Self { message }
    }
}
