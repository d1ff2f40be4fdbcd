//! In-memory implementations of the storage traits.
//!
//! `MemoryHistoryStore` and `MemoryPendingActionStore` satisfy the trait
//! contracts without external dependencies. They back the test suites and
//! are also a valid single-process deployment choice (state is lost on
//! restart).

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::records::{ActionSet, BuildReport, BuildStatus, PullRequestMergedEvent};
use crate::storage_traits::{HistoryStore, PendingActionStore};

/// In-memory build/merge history, append-ordered.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    builds: Mutex<Vec<BuildReport>>,
    merges: Mutex<Vec<PullRequestMergedEvent>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn record_build(&self, report: &BuildReport) -> StoreResult<()> {
        self.builds.lock().unwrap().push(report.clone());
        Ok(())
    }

    async fn record_merge(&self, event: &PullRequestMergedEvent) -> StoreResult<()> {
        self.merges.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn last_build(&self, branch: &str) -> StoreResult<Option<BuildReport>> {
        let builds = self.builds.lock().unwrap();
        Ok(builds.iter().rev().find(|b| b.branch == branch).cloned())
    }

    async fn builds_for_branch(&self, branch: &str) -> StoreResult<Vec<BuildReport>> {
        let builds = self.builds.lock().unwrap();
        Ok(builds
            .iter()
            .rev()
            .filter(|b| b.branch == branch)
            .cloned()
            .collect())
    }

    async fn has_ever_succeeded(&self, commit: &str) -> StoreResult<bool> {
        let builds = self.builds.lock().unwrap();
        Ok(builds
            .iter()
            .any(|b| b.commit == commit && b.status == BuildStatus::Passed))
    }

    async fn last_passing_build(&self, branch: &str) -> StoreResult<Option<BuildReport>> {
        let builds = self.builds.lock().unwrap();
        Ok(builds
            .iter()
            .rev()
            .find(|b| b.branch == branch && b.status == BuildStatus::Passed)
            .cloned())
    }

    async fn count_status_for_commit_on_branch(
        &self,
        commit: &str,
        branch: &str,
        status: BuildStatus,
    ) -> StoreResult<usize> {
        let builds = self.builds.lock().unwrap();
        Ok(builds
            .iter()
            .filter(|b| b.commit == commit && b.branch == branch && b.status == status)
            .count())
    }

    async fn last_merge(
        &self,
        branch: Option<&str>,
    ) -> StoreResult<Option<PullRequestMergedEvent>> {
        let merges = self.merges.lock().unwrap();
        Ok(merges
            .iter()
            .rev()
            .find(|m| branch.map_or(true, |b| m.target_branch == b))
            .cloned())
    }

    async fn find_merge_by_commit(
        &self,
        commit: &str,
    ) -> StoreResult<Option<PullRequestMergedEvent>> {
        let merges = self.merges.lock().unwrap();
        Ok(merges.iter().rev().find(|m| m.merge_commit == commit).cloned())
    }
}

/// In-memory pending action store backed by a single mutex.
///
/// `take` removes under the same lock as `load`, which makes it the atomic
/// load-and-delete the confirmation workflow relies on.
#[derive(Debug, Default)]
pub struct MemoryPendingActionStore {
    sets: Mutex<HashMap<String, ActionSet>>,
}

impl MemoryPendingActionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of unresolved sets (test helper).
    pub fn len(&self) -> usize {
        self.sets.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PendingActionStore for MemoryPendingActionStore {
    async fn save(&self, action_set: &ActionSet) -> StoreResult<()> {
        self.sets
            .lock()
            .unwrap()
            .insert(action_set.set_id.clone(), action_set.clone());
        Ok(())
    }

    async fn load(&self, set_id: &str) -> StoreResult<Option<ActionSet>> {
        Ok(self.sets.lock().unwrap().get(set_id).cloned())
    }

    async fn delete(&self, set_id: &str) -> StoreResult<()> {
        self.sets.lock().unwrap().remove(set_id);
        Ok(())
    }

    async fn take(&self, set_id: &str) -> StoreResult<Option<ActionSet>> {
        Ok(self.sets.lock().unwrap().remove(set_id))
    }
}
