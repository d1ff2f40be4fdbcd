//! Atomicity of `PendingActionStore::take` under concurrent callbacks.
//!
//! Two near-simultaneous confirmations for the same action set must resolve
//! to exactly one winner; the loser observes an absent set.

use std::sync::Arc;

use warden_state::fakes::MemoryPendingActionStore;
use warden_state::{ActionKind, ActionSet, Disposition, PendingActionStore, ProposedAction};

fn one_action_set() -> ActionSet {
    let mut set = ActionSet::new("branch main is failing", "general");
    set.actions.push(
        ProposedAction::new(ActionKind::LockBranch, Disposition::Suggest)
            .with_param("branch", "main"),
    );
    set
}

#[tokio::test]
async fn concurrent_takes_have_exactly_one_winner() {
    let store = Arc::new(MemoryPendingActionStore::new());
    let set = one_action_set();
    store.save(&set).await.unwrap();

    let (a, b) = {
        let store_a = Arc::clone(&store);
        let store_b = Arc::clone(&store);
        let id_a = set.set_id.clone();
        let id_b = set.set_id.clone();
        tokio::join!(
            tokio::spawn(async move { store_a.take(&id_a).await.unwrap() }),
            tokio::spawn(async move { store_b.take(&id_b).await.unwrap() }),
        )
    };
    let (a, b) = (a.unwrap(), b.unwrap());

    assert!(
        a.is_some() ^ b.is_some(),
        "exactly one take must win, got {:?} and {:?}",
        a.is_some(),
        b.is_some()
    );
    assert!(store.is_empty());
}

#[tokio::test]
async fn take_after_delete_observes_nothing() {
    let store = MemoryPendingActionStore::new();
    let set = one_action_set();
    store.save(&set).await.unwrap();

    store.delete(&set.set_id).await.unwrap();
    assert!(store.take(&set.set_id).await.unwrap().is_none());
}
