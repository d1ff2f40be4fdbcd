//! Confirmation workflow: at-most-once execution and resolution paths.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use warden_core::{
    ActionCallback, CallbackOutcome, ConfirmationWorkflow, RemediationBackend, RevertOutcome,
    ScmError,
};
use warden_notify::{MessageRef, TracingGateway};
use warden_state::fakes::MemoryPendingActionStore;
use warden_state::{ActionKind, ActionSet, Disposition, PendingActionStore, ProposedAction};

/// Backend that counts executions; optionally failing.
#[derive(Default)]
struct CountingBackend {
    executions: AtomicUsize,
    fail: bool,
}

impl CountingBackend {
    fn failing() -> Self {
        Self {
            executions: AtomicUsize::new(0),
            fail: true,
        }
    }
}

#[async_trait]
impl RemediationBackend for CountingBackend {
    async fn revert_commit(
        &self,
        commit: &str,
        _branch: &str,
    ) -> Result<RevertOutcome, ScmError> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ScmError::Transport("remote hung up".to_string()));
        }
        Ok(RevertOutcome {
            new_commit: format!("revert-of-{commit}"),
            pushed: true,
        })
    }

    async fn lock_branch(&self, _branch: &str) -> Result<(), ScmError> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rebuild_branch(&self, _branch: &str) -> Result<String, ScmError> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        Ok("55".to_string())
    }
}

fn revert_set() -> ActionSet {
    let mut set = ActionSet::new("Build #9 of example failed on main", "general");
    set.actions.push(
        ProposedAction::new(ActionKind::RevertCommit, Disposition::Suggest)
            .with_param("commit", "0123456789abcdef")
            .with_param("branch", "main"),
    );
    set
}

fn callback(set_id: &str, token: &str, confirmed: bool) -> ActionCallback {
    ActionCallback {
        action_set_id: set_id.to_string(),
        action_token: token.to_string(),
        confirmed,
        channel: "general".to_string(),
        message_ref: Some(MessageRef("msg-1".to_string())),
    }
}

fn harness(backend: CountingBackend) -> (Arc<MemoryPendingActionStore>, Arc<CountingBackend>, ConfirmationWorkflow) {
    let pending = Arc::new(MemoryPendingActionStore::new());
    let backend = Arc::new(backend);
    let workflow = ConfirmationWorkflow::new(
        Arc::clone(&pending) as Arc<dyn PendingActionStore>,
        Arc::clone(&backend) as Arc<dyn RemediationBackend>,
        Arc::new(TracingGateway::new()),
    );
    (pending, backend, workflow)
}

#[tokio::test]
async fn confirmed_action_executes_and_resolves_the_set() {
    let (pending, backend, workflow) = harness(CountingBackend::default());
    let set = revert_set();
    pending.save(&set).await.unwrap();

    let outcome = workflow
        .handle(callback(&set.set_id, "revert_commit", true))
        .await
        .unwrap();

    assert!(matches!(outcome, CallbackOutcome::Performed { .. }));
    assert_eq!(backend.executions.load(Ordering::SeqCst), 1);
    assert!(pending.is_empty(), "resolved set must be deleted");
}

#[tokio::test]
async fn two_concurrent_confirms_execute_exactly_once() {
    let (pending, backend, workflow) = harness(CountingBackend::default());
    let workflow = Arc::new(workflow);
    let set = revert_set();
    pending.save(&set).await.unwrap();

    let (a, b) = {
        let w1 = Arc::clone(&workflow);
        let w2 = Arc::clone(&workflow);
        let cb1 = callback(&set.set_id, "revert_commit", true);
        let cb2 = callback(&set.set_id, "revert_commit", true);
        tokio::join!(
            tokio::spawn(async move { w1.handle(cb1).await.unwrap() }),
            tokio::spawn(async move { w2.handle(cb2).await.unwrap() }),
        )
    };
    let (a, b) = (a.unwrap(), b.unwrap());

    let performed = [&a, &b]
        .iter()
        .filter(|o| matches!(o, CallbackOutcome::Performed { .. }))
        .count();
    let stale = [&a, &b]
        .iter()
        .filter(|o| matches!(o, CallbackOutcome::AlreadyHandled))
        .count();

    assert_eq!(performed, 1, "exactly one callback may execute");
    assert_eq!(stale, 1, "the loser sees an already-handled set");
    assert_eq!(backend.executions.load(Ordering::SeqCst), 1);
    assert!(pending.is_empty());
}

#[tokio::test]
async fn decline_deletes_without_executing() {
    let (pending, backend, workflow) = harness(CountingBackend::default());
    let set = revert_set();
    pending.save(&set).await.unwrap();

    let outcome = workflow
        .handle(callback(&set.set_id, "no", false))
        .await
        .unwrap();

    assert_eq!(outcome, CallbackOutcome::Declined);
    assert_eq!(backend.executions.load(Ordering::SeqCst), 0);
    assert!(pending.is_empty());
}

#[tokio::test]
async fn unknown_token_is_treated_as_declined() {
    let (pending, backend, workflow) = harness(CountingBackend::default());
    let set = revert_set();
    pending.save(&set).await.unwrap();

    let outcome = workflow
        .handle(callback(&set.set_id, "lock_branch", true))
        .await
        .unwrap();

    assert_eq!(outcome, CallbackOutcome::Declined);
    assert_eq!(backend.executions.load(Ordering::SeqCst), 0);
    assert!(pending.is_empty(), "the set is resolved regardless");
}

#[tokio::test]
async fn stale_callback_reports_already_handled() {
    let (_pending, backend, workflow) = harness(CountingBackend::default());

    let outcome = workflow
        .handle(callback("never-saved", "revert_commit", true))
        .await
        .unwrap();

    assert_eq!(outcome, CallbackOutcome::AlreadyHandled);
    assert_eq!(backend.executions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn executor_failure_still_resolves_the_set() {
    let (pending, backend, workflow) = harness(CountingBackend::failing());
    let set = revert_set();
    pending.save(&set).await.unwrap();

    let outcome = workflow
        .handle(callback(&set.set_id, "revert_commit", true))
        .await
        .unwrap();

    match outcome {
        CallbackOutcome::Failed { error } => {
            assert!(error.contains("revert commit 01234567 on branch main"));
            assert!(error.contains("remote hung up"));
        }
        other => panic!("expected Failed, got {other:?}"),
    }
    assert_eq!(backend.executions.load(Ordering::SeqCst), 1);
    assert!(
        pending.is_empty(),
        "a failed execution must not leave the set re-triggerable"
    );

    // A retry click after the failure is answered as already handled.
    let retry = workflow
        .handle(callback(&set.set_id, "revert_commit", true))
        .await
        .unwrap();
    assert_eq!(retry, CallbackOutcome::AlreadyHandled);
    assert_eq!(backend.executions.load(Ordering::SeqCst), 1);
}
