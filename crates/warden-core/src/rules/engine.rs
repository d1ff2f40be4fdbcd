//! Rule evaluation: context in, analysis plus perform-partition out.

use tracing::debug;
use warden_state::{ActionSet, BuildStatus, Disposition, ProposedAction};

use crate::context::EvaluationContext;
use crate::domain::{Analysis, TriggerType};
use crate::rules::table::RuleTable;

/// Output of one evaluation.
///
/// The analysis carries the suggest partition (inside the action set);
/// perform-disposition actions are returned separately for the caller to
/// execute synchronously. The engine itself is pure.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub analysis: Analysis,
    pub perform: Vec<ProposedAction>,
}

/// Evaluates contexts against a rule table.
pub struct RuleEngine {
    table: RuleTable,
    default_channel: String,
}

impl RuleEngine {
    pub fn new(table: RuleTable, default_channel: impl Into<String>) -> Self {
        Self {
            table,
            default_channel: default_channel.into(),
        }
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    /// Evaluate one context.
    ///
    /// Matching rules run in declaration order; produced actions keep rule
    /// order and within-rule order. An action set is allocated only when at
    /// least one suggest-disposition action was produced.
    pub fn evaluate(&self, context: &EvaluationContext) -> Evaluation {
        let description = context.describe();
        let mut produced: Vec<ProposedAction> = Vec::new();

        for trigger in applicable_triggers(context) {
            for rule in self.table.rules_for(trigger) {
                if !rule.predicate.matches(context) {
                    continue;
                }
                debug!(rule = %rule.name, trigger = ?trigger, "Rule matched");
                for template in &rule.actions {
                    if let Some(action) = template.expand(context, &self.default_channel) {
                        produced.push(action);
                    }
                }
            }
        }

        let (perform, suggest): (Vec<_>, Vec<_>) = produced
            .into_iter()
            .partition(|action| action.disposition == Disposition::Perform);

        let action_set = if suggest.is_empty() {
            None
        } else {
            let mut set = ActionSet::new(&description, &self.default_channel);
            set.actions = suggest;
            Some(set)
        };

        Evaluation {
            analysis: Analysis {
                description,
                action_set,
            },
            perform,
        }
    }
}

/// Map a context onto the trigger categories whose rules apply.
///
/// A failed build activates `BuildFailed`, and additionally
/// `BranchStartsFailing` when the previous report on the branch was passing
/// or absent; symmetric for passing builds. Other triggers map one-to-one.
fn applicable_triggers(context: &EvaluationContext) -> Vec<TriggerType> {
    let mut triggers = vec![context.trigger];
    match context.trigger {
        TriggerType::BuildFailed => {
            if context.previous_report_status != Some(BuildStatus::Failed) {
                triggers.push(TriggerType::BranchStartsFailing);
            }
        }
        TriggerType::BuildPassed => {
            if context.previous_report_status != Some(BuildStatus::Passed) {
                triggers.push(TriggerType::BranchStartsPassing);
            }
        }
        _ => {}
    }
    triggers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BranchStatus, Event};
    use crate::rules::predicate::RulePredicate;
    use crate::rules::table::Rule;
    use crate::rules::template::ActionTemplate;
    use chrono::Utc;
    use warden_state::{ActionKind, BuildReport};

    fn failed_build_context(
        previous: Option<BuildStatus>,
        ever_succeeded: bool,
        failures_for_commit: usize,
    ) -> EvaluationContext {
        let report = BuildReport {
            job_name: "example".to_string(),
            branch: "main".to_string(),
            commit: "0123456789abcdef".to_string(),
            build_number: 9,
            status: BuildStatus::Failed,
            build_url: "https://ci.example.com/job/example/9".to_string(),
            received_at: Utc::now(),
        };
        EvaluationContext {
            trigger: TriggerType::BuildFailed,
            event: Some(Event::BuildReport(report)),
            branch: "main".to_string(),
            commit: Some("0123456789abcdef".to_string()),
            commit_has_ever_succeeded: ever_succeeded,
            consecutive_failures_on_branch: failures_for_commit,
            failures_for_commit_on_branch: failures_for_commit,
            current_branch_status: BranchStatus::Failed,
            last_passing_commit_for_branch: None,
            previous_report_status: previous,
        }
    }

    #[test]
    fn starts_failing_fires_when_previous_passed_or_absent() {
        let ctx = failed_build_context(Some(BuildStatus::Passed), false, 1);
        assert_eq!(
            applicable_triggers(&ctx),
            vec![TriggerType::BuildFailed, TriggerType::BranchStartsFailing]
        );

        let ctx = failed_build_context(None, false, 1);
        assert_eq!(
            applicable_triggers(&ctx),
            vec![TriggerType::BuildFailed, TriggerType::BranchStartsFailing]
        );

        let ctx = failed_build_context(Some(BuildStatus::Failed), false, 2);
        assert_eq!(applicable_triggers(&ctx), vec![TriggerType::BuildFailed]);
    }

    #[test]
    fn description_is_rendered_even_when_no_rule_fires() {
        let engine = RuleEngine::new(RuleTable::default(), "general");
        let ctx = failed_build_context(Some(BuildStatus::Failed), false, 1);
        let evaluation = engine.evaluate(&ctx);

        assert!(evaluation.analysis.description.contains("Build #9"));
        assert!(evaluation.analysis.action_set.is_none());
        assert!(evaluation.perform.is_empty());
    }

    #[test]
    fn actions_preserve_rule_and_within_rule_order() {
        let table = RuleTable {
            build_failed: vec![
                Rule {
                    name: "first".to_string(),
                    predicate: RulePredicate::Always,
                    actions: vec![
                        ActionTemplate::LockBranch {
                            disposition: Disposition::Suggest,
                        },
                        ActionTemplate::RebuildBranch {
                            disposition: Disposition::Suggest,
                        },
                    ],
                },
                Rule {
                    name: "second".to_string(),
                    predicate: RulePredicate::Always,
                    actions: vec![ActionTemplate::RevertCommit {
                        disposition: Disposition::Suggest,
                    }],
                },
            ],
            ..RuleTable::default()
        };
        let engine = RuleEngine::new(table, "general");
        let ctx = failed_build_context(Some(BuildStatus::Failed), false, 1);
        let evaluation = engine.evaluate(&ctx);

        let kinds: Vec<ActionKind> = evaluation
            .analysis
            .action_set
            .unwrap()
            .actions
            .iter()
            .map(|a| a.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                ActionKind::LockBranch,
                ActionKind::RebuildBranch,
                ActionKind::RevertCommit
            ]
        );
    }

    #[test]
    fn perform_and_suggest_are_partitioned() {
        let engine = RuleEngine::new(RuleTable::standard(), "general");

        // First failure of a previously passing commit: automatic rebuild,
        // plus the branch-starts-failing announcement.
        let ctx = failed_build_context(Some(BuildStatus::Passed), true, 1);
        let evaluation = engine.evaluate(&ctx);

        let perform_kinds: Vec<ActionKind> =
            evaluation.perform.iter().map(|a| a.kind).collect();
        assert!(perform_kinds.contains(&ActionKind::RebuildBranch));
        assert!(perform_kinds.contains(&ActionKind::PostMessage));
        assert!(evaluation.analysis.action_set.is_none());
    }

    #[test]
    fn suggested_set_allocates_distinct_ids() {
        let engine = RuleEngine::new(RuleTable::standard(), "general");
        let ctx = failed_build_context(Some(BuildStatus::Failed), false, 1);

        let first = engine.evaluate(&ctx).analysis.action_set.unwrap();
        let second = engine.evaluate(&ctx).analysis.action_set.unwrap();
        assert_ne!(first.set_id, second.set_id);
    }
}
