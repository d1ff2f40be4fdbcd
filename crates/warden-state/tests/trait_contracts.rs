//! Behavioral contract tests for `HistoryStore` and `PendingActionStore`.
//!
//! Run against the in-memory fakes and the SurrealDB backend (in-memory
//! engine); any conforming implementation must pass these.

use chrono::{Duration, Utc};
use warden_state::fakes::{MemoryHistoryStore, MemoryPendingActionStore};
use warden_state::{
    ActionKind, ActionSet, BuildReport, BuildStatus, Disposition, HistoryStore,
    PendingActionStore, ProposedAction, PullRequestMergedEvent, SurrealStore,
};

fn report(branch: &str, commit: &str, number: u32, status: BuildStatus) -> BuildReport {
    BuildReport {
        job_name: "example".to_string(),
        branch: branch.to_string(),
        commit: commit.to_string(),
        build_number: number,
        status,
        build_url: format!("https://ci.example.com/job/example/{number}"),
        // Spread timestamps so received_at ordering matches insertion order.
        received_at: Utc::now() + Duration::milliseconds(number as i64),
    }
}

fn merge(id: i64, target: &str, commit: &str) -> PullRequestMergedEvent {
    PullRequestMergedEvent {
        id,
        title: format!("PR {id}"),
        author: "jsmith".to_string(),
        source_branch: format!("feature/{id}"),
        target_branch: target.to_string(),
        merge_commit: commit.to_string(),
        received_at: Utc::now() + Duration::milliseconds(id),
    }
}

fn sample_set() -> ActionSet {
    let mut set = ActionSet::new("build 7 of example failed on main", "general");
    set.actions.push(
        ProposedAction::new(ActionKind::RevertCommit, Disposition::Suggest)
            .with_param("commit", "c0ffee00deadbeef")
            .with_param("branch", "main"),
    );
    set
}

// ===========================================================================
// HistoryStore contract
// ===========================================================================

async fn history_orders_most_recent_first(store: &dyn HistoryStore) {
    store
        .record_build(&report("main", "aaa", 1, BuildStatus::Passed))
        .await
        .unwrap();
    store
        .record_build(&report("main", "bbb", 2, BuildStatus::Failed))
        .await
        .unwrap();
    store
        .record_build(&report("other", "ccc", 3, BuildStatus::Passed))
        .await
        .unwrap();

    let builds = store.builds_for_branch("main").await.unwrap();
    assert_eq!(builds.len(), 2);
    assert_eq!(builds[0].build_number, 2);
    assert_eq!(builds[1].build_number, 1);

    let last = store.last_build("main").await.unwrap().unwrap();
    assert_eq!(last.build_number, 2);
    assert!(store.last_build("missing").await.unwrap().is_none());
}

async fn history_commit_queries(store: &dyn HistoryStore) {
    store
        .record_build(&report("main", "aaa", 1, BuildStatus::Failed))
        .await
        .unwrap();
    store
        .record_build(&report("main", "aaa", 2, BuildStatus::Failed))
        .await
        .unwrap();
    store
        .record_build(&report("release", "aaa", 3, BuildStatus::Passed))
        .await
        .unwrap();

    assert!(store.has_ever_succeeded("aaa").await.unwrap());
    assert!(!store.has_ever_succeeded("bbb").await.unwrap());

    let failures = store
        .count_status_for_commit_on_branch("aaa", "main", BuildStatus::Failed)
        .await
        .unwrap();
    assert_eq!(failures, 2);

    let passing = store.last_passing_build("release").await.unwrap().unwrap();
    assert_eq!(passing.build_number, 3);
    assert!(store.last_passing_build("main").await.unwrap().is_none());
}

async fn history_merge_queries(store: &dyn HistoryStore) {
    store.record_merge(&merge(1, "main", "m1")).await.unwrap();
    store.record_merge(&merge(2, "main", "m2")).await.unwrap();
    store
        .record_merge(&merge(3, "release", "m3"))
        .await
        .unwrap();

    let last = store.last_merge(None).await.unwrap().unwrap();
    assert_eq!(last.id, 3);

    let last_main = store.last_merge(Some("main")).await.unwrap().unwrap();
    assert_eq!(last_main.id, 2);

    let by_commit = store.find_merge_by_commit("m1").await.unwrap().unwrap();
    assert_eq!(by_commit.id, 1);
    assert!(store.find_merge_by_commit("zzz").await.unwrap().is_none());
}

#[tokio::test]
async fn memory_history_orders_most_recent_first() {
    history_orders_most_recent_first(&MemoryHistoryStore::new()).await;
}

#[tokio::test]
async fn memory_history_commit_queries() {
    history_commit_queries(&MemoryHistoryStore::new()).await;
}

#[tokio::test]
async fn memory_history_merge_queries() {
    history_merge_queries(&MemoryHistoryStore::new()).await;
}

#[tokio::test]
async fn surreal_history_orders_most_recent_first() {
    let store = SurrealStore::in_memory().await.unwrap();
    history_orders_most_recent_first(&store).await;
}

#[tokio::test]
async fn surreal_history_commit_queries() {
    let store = SurrealStore::in_memory().await.unwrap();
    history_commit_queries(&store).await;
}

#[tokio::test]
async fn surreal_history_merge_queries() {
    let store = SurrealStore::in_memory().await.unwrap();
    history_merge_queries(&store).await;
}

// ===========================================================================
// PendingActionStore contract
// ===========================================================================

async fn pending_round_trip(store: &dyn PendingActionStore) {
    let set = sample_set();
    store.save(&set).await.unwrap();

    let loaded = store.load(&set.set_id).await.unwrap().unwrap();
    assert_eq!(loaded, set);

    store.delete(&set.set_id).await.unwrap();
    assert!(store.load(&set.set_id).await.unwrap().is_none());

    // Deleting an absent set is a no-op.
    store.delete(&set.set_id).await.unwrap();
}

async fn pending_take_removes(store: &dyn PendingActionStore) {
    let set = sample_set();
    store.save(&set).await.unwrap();

    let taken = store.take(&set.set_id).await.unwrap().unwrap();
    assert_eq!(taken.set_id, set.set_id);

    // The set is gone: a second take and a load both observe nothing.
    assert!(store.take(&set.set_id).await.unwrap().is_none());
    assert!(store.load(&set.set_id).await.unwrap().is_none());
}

#[tokio::test]
async fn memory_pending_round_trip() {
    pending_round_trip(&MemoryPendingActionStore::new()).await;
}

#[tokio::test]
async fn memory_pending_take_removes() {
    pending_take_removes(&MemoryPendingActionStore::new()).await;
}

#[tokio::test]
async fn surreal_pending_round_trip() {
    let store = SurrealStore::in_memory().await.unwrap();
    pending_round_trip(&store).await;
}

#[tokio::test]
async fn surreal_pending_take_removes() {
    let store = SurrealStore::in_memory().await.unwrap();
    pending_take_removes(&store).await;
}
