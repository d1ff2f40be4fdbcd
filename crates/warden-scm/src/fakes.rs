//! In-memory host/CI fakes for tests and offline use.

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use warden_core::ScmError;

use crate::host::{BranchRestriction, BuildTriggerApi, ScmHostApi};

/// SCM host that keeps restrictions in memory and counts API calls.
#[derive(Debug, Default)]
pub struct RecordingScmHost {
    restrictions: Mutex<Vec<BranchRestriction>>,
    next_id: AtomicI64,
    pub creates: AtomicUsize,
    pub updates: AtomicUsize,
}

impl RecordingScmHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restrictions(&self) -> Vec<BranchRestriction> {
        self.restrictions.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScmHostApi for RecordingScmHost {
    async fn list_branch_restrictions(&self) -> Result<Vec<BranchRestriction>, ScmError> {
        Ok(self.restrictions())
    }

    async fn create_branch_restriction(
        &self,
        restriction: &BranchRestriction,
    ) -> Result<(), ScmError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let mut stored = restriction.clone();
        stored.id = Some(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.restrictions.lock().unwrap().push(stored);
        Ok(())
    }

    async fn update_branch_restriction(
        &self,
        id: i64,
        restriction: &BranchRestriction,
    ) -> Result<(), ScmError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        let mut restrictions = self.restrictions.lock().unwrap();
        let existing = restrictions
            .iter_mut()
            .find(|r| r.id == Some(id))
            .ok_or_else(|| ScmError::Restriction {
                status: 404,
                body: format!("no restriction with id {id}"),
            })?;
        existing.kind = restriction.kind;
        existing.pattern = restriction.pattern.clone();
        Ok(())
    }
}

/// CI trigger that records requested branches.
#[derive(Debug, Default)]
pub struct RecordingBuildTrigger {
    pub triggered: Mutex<Vec<String>>,
}

impl RecordingBuildTrigger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BuildTriggerApi for RecordingBuildTrigger {
    async fn trigger(&self, branch: &str) -> Result<String, ScmError> {
        let mut triggered = self.triggered.lock().unwrap();
        triggered.push(branch.to_string());
        Ok(format!("{}", 100 + triggered.len()))
    }
}
