//! SurrealDB-backed implementation of both storage contracts.
//!
//! One connection serves both [`HistoryStore`] and [`PendingActionStore`];
//! the two contracts share a document database but disjoint tables.

use async_trait::async_trait;
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::migrations;
use crate::records::{ActionSet, BuildReport, BuildStatus, PullRequestMergedEvent};
use crate::storage_traits::{HistoryStore, PendingActionStore};

/// SurrealDB-backed store.
pub struct SurrealStore {
    db: Surreal<Any>,
}

impl SurrealStore {
    /// Create an in-memory instance for testing.
    ///
    /// Connects to `mem://`, selects `warden/main`, and runs `init_schema`.
    pub async fn in_memory() -> crate::Result<Self> {
        let db = surrealdb::engine::any::connect("mem://")
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        db.use_ns("warden")
            .use_db("main")
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        migrations::init_schema(&db).await?;

        info!("SurrealStore connected (in-memory)");
        Ok(Self { db })
    }

    /// Create from environment variables.
    ///
    /// Reads `WARDEN_DB_URL` (any SurrealDB engine URL); when unset, falls
    /// back to local persistence in `.warden/db`. `WARDEN_DB_USERNAME` and
    /// `WARDEN_DB_PASSWORD` enable root sign-in when both are present.
    /// Namespace/database default to `warden`/`main` and can be overridden
    /// with `WARDEN_DB_NAMESPACE` / `WARDEN_DB_DATABASE`.
    pub async fn from_env() -> crate::Result<Self> {
        let url = match std::env::var("WARDEN_DB_URL") {
            Ok(url) => url,
            Err(_) => {
                let path = ".warden/db";
                std::fs::create_dir_all(path).map_err(|e| {
                    StoreError::Connection(format!(
                        "failed to create database directory {path}: {e}"
                    ))
                })?;
                let url = format!("surrealkv://{path}");
                info!("WARDEN_DB_URL not set, using local persistence: {url}");
                url
            }
        };

        let db = surrealdb::engine::any::connect(&url)
            .await
            .map_err(|e| StoreError::Connection(format!("failed to connect to {url}: {e}")))?;

        if let (Ok(username), Ok(password)) = (
            std::env::var("WARDEN_DB_USERNAME"),
            std::env::var("WARDEN_DB_PASSWORD"),
        ) {
            db.signin(Root {
                username: &username,
                password: &password,
            })
            .await
            .map_err(|e| StoreError::Connection(format!("auth failed: {e}")))?;
        }

        let namespace =
            std::env::var("WARDEN_DB_NAMESPACE").unwrap_or_else(|_| "warden".to_string());
        let database =
            std::env::var("WARDEN_DB_DATABASE").unwrap_or_else(|_| "main".to_string());

        db.use_ns(&namespace)
            .use_db(&database)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        migrations::init_schema(&db).await?;
        info!("SurrealStore connected ({url})");
        Ok(Self { db })
    }
}

#[async_trait]
impl HistoryStore for SurrealStore {
    async fn record_build(&self, report: &BuildReport) -> StoreResult<()> {
        debug!(branch = %report.branch, build = report.build_number, "Recording build report");
        let _: Option<BuildReport> = self
            .db
            .create("build_reports")
            .content(report.clone())
            .await?;
        Ok(())
    }

    async fn record_merge(&self, event: &PullRequestMergedEvent) -> StoreResult<()> {
        debug!(pr = event.id, branch = %event.target_branch, "Recording merged PR");
        let _: Option<PullRequestMergedEvent> =
            self.db.create("merged_prs").content(event.clone()).await?;
        Ok(())
    }

    async fn last_build(&self, branch: &str) -> StoreResult<Option<BuildReport>> {
        let mut res = self
            .db
            .query(
                "SELECT * FROM build_reports WHERE branch = $branch \
                 ORDER BY received_at DESC LIMIT 1",
            )
            .bind(("branch", branch.to_string()))
            .await?;
        let rows: Vec<BuildReport> = res.take(0)?;
        Ok(rows.into_iter().next())
    }

    async fn builds_for_branch(&self, branch: &str) -> StoreResult<Vec<BuildReport>> {
        let mut res = self
            .db
            .query(
                "SELECT * FROM build_reports WHERE branch = $branch \
                 ORDER BY received_at DESC",
            )
            .bind(("branch", branch.to_string()))
            .await?;
        Ok(res.take(0)?)
    }

    async fn has_ever_succeeded(&self, commit: &str) -> StoreResult<bool> {
        let mut res = self
            .db
            .query(
                "SELECT * FROM build_reports WHERE commit = $commit \
                 AND status = 'passed' LIMIT 1",
            )
            .bind(("commit", commit.to_string()))
            .await?;
        let rows: Vec<BuildReport> = res.take(0)?;
        Ok(!rows.is_empty())
    }

    async fn last_passing_build(&self, branch: &str) -> StoreResult<Option<BuildReport>> {
        let mut res = self
            .db
            .query(
                "SELECT * FROM build_reports WHERE branch = $branch \
                 AND status = 'passed' ORDER BY received_at DESC LIMIT 1",
            )
            .bind(("branch", branch.to_string()))
            .await?;
        let rows: Vec<BuildReport> = res.take(0)?;
        Ok(rows.into_iter().next())
    }

    async fn count_status_for_commit_on_branch(
        &self,
        commit: &str,
        branch: &str,
        status: BuildStatus,
    ) -> StoreResult<usize> {
        let status_str = match status {
            BuildStatus::Passed => "passed",
            BuildStatus::Failed => "failed",
        };
        let mut res = self
            .db
            .query(
                "SELECT * FROM build_reports WHERE commit = $commit \
                 AND branch = $branch AND status = $status",
            )
            .bind(("commit", commit.to_string()))
            .bind(("branch", branch.to_string()))
            .bind(("status", status_str.to_string()))
            .await?;
        let rows: Vec<BuildReport> = res.take(0)?;
        Ok(rows.len())
    }

    async fn last_merge(
        &self,
        branch: Option<&str>,
    ) -> StoreResult<Option<PullRequestMergedEvent>> {
        let mut res = match branch {
            Some(branch) => {
                self.db
                    .query(
                        "SELECT * FROM merged_prs WHERE target_branch = $branch \
                         ORDER BY received_at DESC LIMIT 1",
                    )
                    .bind(("branch", branch.to_string()))
                    .await?
            }
            None => {
                self.db
                    .query("SELECT * FROM merged_prs ORDER BY received_at DESC LIMIT 1")
                    .await?
            }
        };
        let rows: Vec<PullRequestMergedEvent> = res.take(0)?;
        Ok(rows.into_iter().next())
    }

    async fn find_merge_by_commit(
        &self,
        commit: &str,
    ) -> StoreResult<Option<PullRequestMergedEvent>> {
        let mut res = self
            .db
            .query(
                "SELECT * FROM merged_prs WHERE merge_commit = $commit \
                 ORDER BY received_at DESC LIMIT 1",
            )
            .bind(("commit", commit.to_string()))
            .await?;
        let rows: Vec<PullRequestMergedEvent> = res.take(0)?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl PendingActionStore for SurrealStore {
    async fn save(&self, action_set: &ActionSet) -> StoreResult<()> {
        debug!(set_id = %action_set.set_id, "Saving pending action set");
        let _: Option<ActionSet> = self
            .db
            .create("pending_action_sets")
            .content(action_set.clone())
            .await?;
        Ok(())
    }

    async fn load(&self, set_id: &str) -> StoreResult<Option<ActionSet>> {
        let mut res = self
            .db
            .query("SELECT * FROM pending_action_sets WHERE set_id = $set_id")
            .bind(("set_id", set_id.to_string()))
            .await?;
        let rows: Vec<ActionSet> = res.take(0)?;
        Ok(rows.into_iter().next())
    }

    async fn delete(&self, set_id: &str) -> StoreResult<()> {
        self.db
            .query("DELETE FROM pending_action_sets WHERE set_id = $set_id")
            .bind(("set_id", set_id.to_string()))
            .await?;
        Ok(())
    }

    async fn take(&self, set_id: &str) -> StoreResult<Option<ActionSet>> {
        // DELETE ... RETURN BEFORE is the backend's atomic get-and-delete.
        let mut res = self
            .db
            .query("DELETE FROM pending_action_sets WHERE set_id = $set_id RETURN BEFORE")
            .bind(("set_id", set_id.to_string()))
            .await?;
        let rows: Vec<ActionSet> = res.take(0)?;
        Ok(rows.into_iter().next())
    }
}
