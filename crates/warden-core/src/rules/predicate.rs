//! Rule predicates: the conditions a rule guards on.

use serde::{Deserialize, Serialize};

use crate::context::EvaluationContext;
use crate::domain::BranchStatus;

/// A condition over the evaluation context.
///
/// Composable via `All` / `Any` / `Not`; evaluation is total and
/// side-effect-free.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RulePredicate {
    Always,
    CommitEverSucceeded,
    CommitNeverSucceeded,
    FailuresForCommitEquals { count: usize },
    FailuresForCommitAtLeast { count: usize },
    ConsecutiveFailuresAtLeast { count: usize },
    BranchStatusIs { status: BranchStatus },
    All { of: Vec<RulePredicate> },
    Any { of: Vec<RulePredicate> },
    Not { inner: Box<RulePredicate> },
}

impl Default for RulePredicate {
    fn default() -> Self {
        RulePredicate::Always
    }
}

impl RulePredicate {
    pub fn matches(&self, context: &EvaluationContext) -> bool {
        match self {
            RulePredicate::Always => true,
            RulePredicate::CommitEverSucceeded => context.commit_has_ever_succeeded,
            RulePredicate::CommitNeverSucceeded => !context.commit_has_ever_succeeded,
            RulePredicate::FailuresForCommitEquals { count } => {
                context.failures_for_commit_on_branch == *count
            }
            RulePredicate::FailuresForCommitAtLeast { count } => {
                context.failures_for_commit_on_branch >= *count
            }
            RulePredicate::ConsecutiveFailuresAtLeast { count } => {
                context.consecutive_failures_on_branch >= *count
            }
            RulePredicate::BranchStatusIs { status } => context.current_branch_status == *status,
            RulePredicate::All { of } => of.iter().all(|p| p.matches(context)),
            RulePredicate::Any { of } => of.iter().any(|p| p.matches(context)),
            RulePredicate::Not { inner } => !inner.matches(context),
        }
    }

    /// `All` of the given predicates (constructor shorthand).
    pub fn all(of: Vec<RulePredicate>) -> Self {
        RulePredicate::All { of }
    }
}
