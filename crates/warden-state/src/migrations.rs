//! SurrealDB schema initialization
//!
//! Sets up the history and pending-action tables with their indexes.
//! Safe to call multiple times (idempotent).

use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

use crate::Result;

/// Initialize all Buildwarden tables.
pub async fn init_schema(db: &Surreal<Any>) -> Result<()> {
    info!("Initializing Buildwarden SurrealDB schema");

    init_build_reports_table(db).await?;
    init_merged_prs_table(db).await?;
    init_pending_sets_table(db).await?;

    info!("Buildwarden schema initialization complete");
    Ok(())
}

/// `build_reports` — append-only build history.
///
/// ```text
/// TABLE build_reports {
///   job_name:     STRING
///   branch:       STRING (indexed)
///   commit:       STRING (indexed)
///   build_number: INT
///   status:       STRING (enum: passed | failed)
///   build_url:    STRING
///   received_at:  STRING (RFC 3339; lexicographic order == chronological)
/// }
/// ```
async fn init_build_reports_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing build_reports table");

    let sql = r#"
        DEFINE TABLE build_reports
            SCHEMALESS
            PERMISSIONS
                FOR create FULL
                FOR select FULL
                FOR update NONE
                FOR delete NONE;

        -- Branch scans dominate: context assembly reads per-branch history
        DEFINE INDEX idx_branch ON TABLE build_reports COLUMNS branch;
        DEFINE INDEX idx_branch_received_at ON TABLE build_reports COLUMNS branch, received_at;

        -- Commit lookups for has_ever_succeeded / per-commit failure counts
        DEFINE INDEX idx_commit ON TABLE build_reports COLUMNS commit;
        DEFINE INDEX idx_commit_branch ON TABLE build_reports COLUMNS commit, branch;
    "#;

    db.query(sql).await?;
    Ok(())
}

/// `merged_prs` — append-only merged pull request history.
async fn init_merged_prs_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing merged_prs table");

    let sql = r#"
        DEFINE TABLE merged_prs
            SCHEMALESS
            PERMISSIONS
                FOR create FULL
                FOR select FULL
                FOR update NONE
                FOR delete NONE;

        DEFINE INDEX idx_target_branch ON TABLE merged_prs COLUMNS target_branch;
        DEFINE INDEX idx_merge_commit ON TABLE merged_prs COLUMNS merge_commit;
        DEFINE INDEX idx_target_received_at ON TABLE merged_prs COLUMNS target_branch, received_at;
    "#;

    db.query(sql).await?;
    Ok(())
}

/// `pending_action_sets` — action sets awaiting confirmation.
///
/// `set_id` is unique; resolution deletes the row, and the delete-returning
/// query in `SurrealStore::take` is the atomic load-and-delete the
/// confirmation workflow depends on.
async fn init_pending_sets_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing pending_action_sets table");

    let sql = r#"
        DEFINE TABLE pending_action_sets
            SCHEMALESS
            PERMISSIONS
                FOR create FULL
                FOR select FULL
                FOR update NONE
                FOR delete FULL;

        DEFINE INDEX idx_set_id ON TABLE pending_action_sets COLUMNS set_id UNIQUE;
    "#;

    db.query(sql).await?;
    Ok(())
}
