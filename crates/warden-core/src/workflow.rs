//! Event workflow: the orchestration from inbound event to rendered
//! analysis.
//!
//! Filter → record → context → evaluate → execute perform partition →
//! persist suggestions → notify. Context or store failures abort the whole
//! evaluation (no partial analysis); remediation failures are scoped to
//! their action and reported in the rendered message.

use std::sync::Arc;

use tracing::{debug, info};
use warden_notify::NotificationGateway;
use warden_state::{BuildReport, HistoryStore, PendingActionStore, PullRequestMergedEvent};

use crate::config::EventFilterConfig;
use crate::context::ContextBuilder;
use crate::domain::{Analysis, Event, PullRequestCreatedOrUpdatedEvent, Result};
use crate::remediation::execute_perform;
use crate::render;
use crate::rules::RuleEngine;
use crate::scm::RemediationBackend;

/// Owns the evaluation pipeline for one configured repository.
pub struct EventWorkflow {
    history: Arc<dyn HistoryStore>,
    pending: Arc<dyn PendingActionStore>,
    backend: Arc<dyn RemediationBackend>,
    gateway: Arc<dyn NotificationGateway>,
    contexts: ContextBuilder,
    engine: RuleEngine,
    filters: EventFilterConfig,
    default_channel: String,
}

impl EventWorkflow {
    pub fn new(
        history: Arc<dyn HistoryStore>,
        pending: Arc<dyn PendingActionStore>,
        backend: Arc<dyn RemediationBackend>,
        gateway: Arc<dyn NotificationGateway>,
        engine: RuleEngine,
        filters: EventFilterConfig,
        default_channel: impl Into<String>,
    ) -> Self {
        Self {
            contexts: ContextBuilder::new(Arc::clone(&history)),
            history,
            pending,
            backend,
            gateway,
            engine,
            filters,
            default_channel: default_channel.into(),
        }
    }

    /// Handle a build status report.
    ///
    /// Returns `None` when the event was filtered out. The report is
    /// recorded before context assembly, so the context's branch scan
    /// includes it.
    pub async fn handle_build_report(&self, report: BuildReport) -> Result<Option<Analysis>> {
        if !self.filters.allows(Some(&report.job_name), &report.branch) {
            debug!(job = %report.job_name, branch = %report.branch, "Build report filtered out");
            return Ok(None);
        }
        info!(
            job = %report.job_name,
            branch = %report.branch,
            build = report.build_number,
            status = ?report.status,
            "Processing build report"
        );

        self.history.record_build(&report).await?;
        let context = self.contexts.build(&Event::BuildReport(report)).await?;
        self.evaluate_and_dispatch(&context).await.map(Some)
    }

    /// Handle a merged pull request.
    pub async fn handle_pull_request_merged(
        &self,
        event: PullRequestMergedEvent,
    ) -> Result<Option<Analysis>> {
        if !self.filters.allows(None, &event.target_branch) {
            debug!(pr = event.id, branch = %event.target_branch, "Merged PR filtered out");
            return Ok(None);
        }
        info!(pr = event.id, branch = %event.target_branch, "Processing merged PR");

        self.history.record_merge(&event).await?;
        let context = self
            .contexts
            .build(&Event::PullRequestMerged(event))
            .await?;
        self.evaluate_and_dispatch(&context).await.map(Some)
    }

    /// Handle a created/updated pull request (not recorded to history).
    pub async fn handle_pull_request_updated(
        &self,
        event: PullRequestCreatedOrUpdatedEvent,
    ) -> Result<Option<Analysis>> {
        if !self.filters.allows(None, &event.target_branch) {
            debug!(pr = event.id, branch = %event.target_branch, "Updated PR filtered out");
            return Ok(None);
        }
        info!(pr = event.id, branch = %event.target_branch, "Processing updated PR");

        let context = self
            .contexts
            .build(&Event::PullRequestCreatedOrUpdated(event))
            .await?;
        self.evaluate_and_dispatch(&context).await.map(Some)
    }

    /// Run the periodic (eventless) rules for a branch. Invoked on an
    /// external schedule.
    pub async fn run_periodic(&self, branch: &str) -> Result<Analysis> {
        info!(branch, "Running periodic evaluation");
        let context = self.contexts.build_periodic(branch).await?;
        self.evaluate_and_dispatch(&context).await
    }

    async fn evaluate_and_dispatch(
        &self,
        context: &crate::context::EvaluationContext,
    ) -> Result<Analysis> {
        let evaluation = self.engine.evaluate(context);

        // Perform partition: synchronous, in order, best-effort.
        let outcomes = execute_perform(
            self.backend.as_ref(),
            self.gateway.as_ref(),
            &evaluation.perform,
        )
        .await;

        // Persist before rendering: a callback must never race a save.
        if let Some(set) = &evaluation.analysis.action_set {
            self.pending.save(set).await?;
            info!(
                set_id = %set.set_id,
                actions = set.actions.len(),
                "Persisted pending action set"
            );
        }

        let message = render::analysis_message(
            &evaluation.analysis,
            &outcomes,
            &self.default_channel,
        );
        self.gateway.post(message).await?;

        Ok(evaluation.analysis)
    }
}
