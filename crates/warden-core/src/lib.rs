//! Buildwarden Core Library
//!
//! The event-evaluation and remediation workflow: context assembly from
//! events plus build/PR history, the data-driven rule engine, the
//! pending-action confirmation state machine, and the glue that applies or
//! suggests remediation through the SCM backend and notification gateway.

pub mod config;
pub mod confirm;
pub mod context;
pub mod domain;
pub mod remediation;
pub mod render;
pub mod rules;
pub mod scm;
pub mod telemetry;
pub mod workflow;

pub use config::{
    ChatConfig, CiTriggerConfig, EventFilterConfig, RepositoryConfig, ScmHostConfig, WardenConfig,
};
pub use confirm::{ActionCallback, CallbackOutcome, ConfirmationWorkflow};
pub use context::{ContextBuilder, EvaluationContext};
pub use domain::{
    Analysis, BranchStatus, Event, PullRequestCreatedOrUpdatedEvent, Result, TriggerType,
    WardenError,
};
pub use remediation::{execute_action, execute_perform, ActionOutcome};
pub use rules::{ActionTemplate, Evaluation, Rule, RuleEngine, RulePredicate, RuleTable};
pub use scm::{DryRunBackend, RemediationBackend, RevertOutcome, ScmError};
pub use telemetry::init_tracing;
pub use workflow::EventWorkflow;

pub use warden_state::{
    short_commit, ActionKind, ActionSet, BuildReport, BuildStatus, Disposition, HistoryStore,
    PendingActionStore, ProposedAction, PullRequestMergedEvent,
};

/// Buildwarden version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
