//! The remediation backend implementation.
//!
//! One service instance owns the local mirror; clone, fetch, checkout and
//! push never interleave across concurrent remediation requests because
//! every mirror operation runs under one async mutex. Acquisition is
//! bounded: waiting longer than the configured lock timeout fails with
//! `ScmError::Busy` and the caller may retry later. Operations are not
//! cancellable mid-flight.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};
use warden_core::{RemediationBackend, RepositoryConfig, RevertOutcome, ScmError};

use crate::host::{BranchRestriction, BuildTriggerApi, RestrictionKind, ScmHostApi};
use crate::mirror;

/// Git-backed remediation executor.
pub struct GitRemediationService {
    config: RepositoryConfig,
    host: Option<Arc<dyn ScmHostApi>>,
    ci: Option<Arc<dyn BuildTriggerApi>>,
    mirror_lock: Mutex<()>,
}

impl GitRemediationService {
    pub fn new(
        config: RepositoryConfig,
        host: Option<Arc<dyn ScmHostApi>>,
        ci: Option<Arc<dyn BuildTriggerApi>>,
    ) -> Self {
        Self {
            config,
            host,
            ci,
            mirror_lock: Mutex::new(()),
        }
    }

    /// Acquire the mirror lock within the configured bound.
    async fn acquire_mirror_lock(&self) -> Result<MutexGuard<'_, ()>, ScmError> {
        tokio::time::timeout(
            Duration::from_secs(self.config.lock_wait_secs),
            self.mirror_lock.lock(),
        )
        .await
        .map_err(|_| ScmError::Busy)
    }

    /// Reconcile one restriction kind for a branch: update the existing
    /// restriction in place when one matches kind+pattern, create otherwise.
    async fn ensure_restriction(
        &self,
        host: &dyn ScmHostApi,
        restrictions: &[BranchRestriction],
        kind: RestrictionKind,
        branch: &str,
    ) -> Result<(), ScmError> {
        let desired = BranchRestriction::new(kind, branch);
        match restrictions
            .iter()
            .find(|r| r.kind == kind && r.pattern == branch)
        {
            Some(existing) => {
                let id = existing.id.ok_or_else(|| ScmError::Restriction {
                    status: 0,
                    body: format!("existing {kind:?} restriction for {branch} has no id"),
                })?;
                debug!(?kind, branch, id, "Restriction exists - updating in place");
                host.update_branch_restriction(id, &desired).await
            }
            None => host.create_branch_restriction(&desired).await,
        }
    }
}

#[async_trait]
impl RemediationBackend for GitRemediationService {
    async fn revert_commit(&self, commit: &str, branch: &str) -> Result<RevertOutcome, ScmError> {
        let _guard = self.acquire_mirror_lock().await?;
        info!(commit, branch, "Reverting commit");
        mirror::fetch_checkout_revert(&self.config, commit, branch)
    }

    async fn lock_branch(&self, branch: &str) -> Result<(), ScmError> {
        let Some(host) = &self.host else {
            return Err(ScmError::NotImplemented("branch locking"));
        };
        debug!(branch, "Locking branch");

        let restrictions = host.list_branch_restrictions().await?;
        self.ensure_restriction(host.as_ref(), &restrictions, RestrictionKind::Push, branch)
            .await?;
        self.ensure_restriction(
            host.as_ref(),
            &restrictions,
            RestrictionKind::RestrictMerges,
            branch,
        )
        .await?;

        info!(branch, "Locked branch");
        Ok(())
    }

    async fn rebuild_branch(&self, branch: &str) -> Result<String, ScmError> {
        let Some(ci) = &self.ci else {
            return Err(ScmError::NotImplemented("rebuild triggering"));
        };
        let build_id = ci.trigger(branch).await?;
        info!(branch, build_id, "Triggered rebuild");
        Ok(build_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(lock_wait_secs: u64) -> RepositoryConfig {
        RepositoryConfig {
            remote_url: "https://example.com/repo.git".to_string(),
            local_dir: std::env::temp_dir().join("warden-service-test-mirror"),
            push_changes: false,
            username: None,
            password: None,
            strict_host_key_checking: None,
            lock_wait_secs,
        }
    }

    #[tokio::test]
    async fn held_lock_times_out_as_busy() {
        let service = GitRemediationService::new(config(0), None, None);
        let _held = service.mirror_lock.lock().await;

        let err = service.acquire_mirror_lock().await.unwrap_err();
        assert!(matches!(err, ScmError::Busy));
    }

    #[tokio::test]
    async fn free_lock_is_acquired() {
        let service = GitRemediationService::new(config(1), None, None);
        assert!(service.acquire_mirror_lock().await.is_ok());
    }

    #[tokio::test]
    async fn lock_branch_without_host_is_not_implemented() {
        let service = GitRemediationService::new(config(1), None, None);
        let err = service.lock_branch("main").await.unwrap_err();
        assert!(matches!(err, ScmError::NotImplemented(_)));
    }

    #[tokio::test]
    async fn rebuild_without_ci_is_not_implemented() {
        let service = GitRemediationService::new(config(1), None, None);
        let err = service.rebuild_branch("main").await.unwrap_err();
        assert!(matches!(err, ScmError::NotImplemented(_)));
    }
}
