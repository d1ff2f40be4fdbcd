//! The rule table: ordered rules per trigger type, loaded from TOML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{BranchStatus, Result, TriggerType, WardenError};
use crate::rules::predicate::RulePredicate;
use crate::rules::template::ActionTemplate;
use warden_state::Disposition;

/// One declared rule: a guard plus the actions it produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    /// Defaults to `Always` when omitted in the rule file.
    #[serde(default)]
    pub predicate: RulePredicate,
    pub actions: Vec<ActionTemplate>,
}

/// Ordered rules per trigger type.
///
/// Trigger types are fixed and finite, so the table is a plain struct with
/// one ordered list per trigger rather than an open map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleTable {
    #[serde(default)]
    pub build_failed: Vec<Rule>,
    #[serde(default)]
    pub build_passed: Vec<Rule>,
    #[serde(default)]
    pub branch_starts_failing: Vec<Rule>,
    #[serde(default)]
    pub branch_starts_passing: Vec<Rule>,
    #[serde(default)]
    pub pull_request_merged: Vec<Rule>,
    #[serde(default)]
    pub pull_request_modified: Vec<Rule>,
    #[serde(default)]
    pub repository: Vec<Rule>,
}

#[derive(Debug, Deserialize)]
struct RulesFile {
    #[serde(default)]
    rules: RuleTable,
}

impl RuleTable {
    /// Rules declared for one trigger type, in declaration order.
    pub fn rules_for(&self, trigger: TriggerType) -> &[Rule] {
        match trigger {
            TriggerType::BuildFailed => &self.build_failed,
            TriggerType::BuildPassed => &self.build_passed,
            TriggerType::BranchStartsFailing => &self.branch_starts_failing,
            TriggerType::BranchStartsPassing => &self.branch_starts_passing,
            TriggerType::PullRequestMerged => &self.pull_request_merged,
            TriggerType::PullRequestModified => &self.pull_request_modified,
            TriggerType::RepositoryPeriodic => &self.repository,
        }
    }

    /// Total number of declared rules.
    pub fn len(&self) -> usize {
        [
            &self.build_failed,
            &self.build_passed,
            &self.branch_starts_failing,
            &self.branch_starts_passing,
            &self.pull_request_merged,
            &self.pull_request_modified,
            &self.repository,
        ]
        .iter()
        .map(|rules| rules.len())
        .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parse a rule table from a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let file: RulesFile =
            toml::from_str(input).map_err(|e| WardenError::RuleConfig(e.to_string()))?;
        Ok(file.rules)
    }

    /// Load a rule table from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|e| {
            WardenError::RuleConfig(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&input)
    }

    /// The built-in rule set.
    ///
    /// Failed builds of a commit that has succeeded before escalate from an
    /// automatic rebuild through a suggested rebuild to a suggested branch
    /// lock; a commit that never passed anywhere gets a suggested revert.
    pub fn standard() -> Self {
        RuleTable {
            build_failed: vec![
                Rule {
                    name: "revert-never-succeeded".to_string(),
                    predicate: RulePredicate::CommitNeverSucceeded,
                    actions: vec![ActionTemplate::RevertCommit {
                        disposition: Disposition::Suggest,
                    }],
                },
                Rule {
                    name: "rebuild-first-failure".to_string(),
                    predicate: RulePredicate::all(vec![
                        RulePredicate::CommitEverSucceeded,
                        RulePredicate::FailuresForCommitEquals { count: 1 },
                    ]),
                    actions: vec![ActionTemplate::RebuildBranch {
                        disposition: Disposition::Perform,
                    }],
                },
                Rule {
                    name: "rebuild-second-failure".to_string(),
                    predicate: RulePredicate::all(vec![
                        RulePredicate::CommitEverSucceeded,
                        RulePredicate::FailuresForCommitEquals { count: 2 },
                    ]),
                    actions: vec![ActionTemplate::RebuildBranch {
                        disposition: Disposition::Suggest,
                    }],
                },
                Rule {
                    name: "lock-repeated-failure".to_string(),
                    predicate: RulePredicate::all(vec![
                        RulePredicate::CommitEverSucceeded,
                        RulePredicate::FailuresForCommitAtLeast { count: 3 },
                    ]),
                    actions: vec![ActionTemplate::LockBranch {
                        disposition: Disposition::Suggest,
                    }],
                },
            ],
            build_passed: vec![Rule {
                name: "announce-pass".to_string(),
                predicate: RulePredicate::Always,
                actions: vec![ActionTemplate::PostMessage {
                    channel: None,
                    message: "{job_name} build passed on branch `{branch}`: {build_url}"
                        .to_string(),
                    color: Some("green".to_string()),
                }],
            }],
            branch_starts_failing: vec![Rule {
                name: "announce-branch-failing".to_string(),
                predicate: RulePredicate::Always,
                actions: vec![ActionTemplate::PostMessage {
                    channel: None,
                    message: "{job_name} branch `{branch}` is now failing: {build_url}"
                        .to_string(),
                    color: Some("red".to_string()),
                }],
            }],
            branch_starts_passing: vec![Rule {
                name: "announce-branch-healthy".to_string(),
                predicate: RulePredicate::Always,
                actions: vec![ActionTemplate::PostMessage {
                    channel: None,
                    message: "{job_name} branch `{branch}` is healthy again! {build_url}"
                        .to_string(),
                    color: Some("green".to_string()),
                }],
            }],
            pull_request_merged: vec![Rule {
                name: "revert-merge-into-failing-branch".to_string(),
                predicate: RulePredicate::BranchStatusIs {
                    status: BranchStatus::Failed,
                },
                actions: vec![ActionTemplate::RevertCommit {
                    disposition: Disposition::Suggest,
                }],
            }],
            pull_request_modified: Vec::new(),
            repository: vec![
                Rule {
                    name: "reset-instructions".to_string(),
                    predicate: RulePredicate::Always,
                    actions: vec![ActionTemplate::ShowText {
                        title: "Show instructions".to_string(),
                        description: "hard reset branch {branch} to last passing commit"
                            .to_string(),
                        body: "Hard reset branch with command: ```git checkout {branch} && \
                               git reset {last_passing_commit} --hard```"
                            .to_string(),
                        disposition: Disposition::Suggest,
                    }],
                },
                Rule {
                    name: "lock-consecutively-failing-branch".to_string(),
                    predicate: RulePredicate::ConsecutiveFailuresAtLeast { count: 2 },
                    actions: vec![ActionTemplate::LockBranch {
                        disposition: Disposition::Suggest,
                    }],
                },
            ],
        }
    }
}
