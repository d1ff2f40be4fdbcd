//! SCM host and CI backend HTTP contracts.
//!
//! Branch restrictions and rebuild triggers go through these traits; the
//! HTTP implementations treat 200/201 as success and surface any other
//! status with the response body for diagnostics.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use warden_core::ScmError;

/// What a branch restriction forbids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestrictionKind {
    Push,
    RestrictMerges,
}

/// An SCM-host-enforced rule preventing push or merge into matching
/// branches. At most one restriction of a given kind exists per exact
/// pattern; reconciliation updates in place rather than duplicating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRestriction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub kind: RestrictionKind,
    pub pattern: String,
}

impl BranchRestriction {
    pub fn new(kind: RestrictionKind, pattern: impl Into<String>) -> Self {
        Self {
            id: None,
            kind,
            pattern: pattern.into(),
        }
    }
}

/// Branch restriction operations on the SCM host.
#[async_trait]
pub trait ScmHostApi: Send + Sync {
    async fn list_branch_restrictions(&self) -> Result<Vec<BranchRestriction>, ScmError>;

    async fn create_branch_restriction(
        &self,
        restriction: &BranchRestriction,
    ) -> Result<(), ScmError>;

    async fn update_branch_restriction(
        &self,
        id: i64,
        restriction: &BranchRestriction,
    ) -> Result<(), ScmError>;
}

/// CI backend rebuild trigger.
#[async_trait]
pub trait BuildTriggerApi: Send + Sync {
    /// Re-trigger the last build configuration for a branch, returning the
    /// backend's build identifier.
    async fn trigger(&self, branch: &str) -> Result<String, ScmError>;
}

#[derive(Debug, Deserialize)]
struct RestrictionList {
    values: Vec<BranchRestriction>,
}

/// SCM host client over HTTP with basic authentication.
pub struct HttpScmHost {
    base_url: String,
    repo_owner: String,
    repo_slug: String,
    username: String,
    password: String,
    client: reqwest::Client,
}

impl HttpScmHost {
    pub fn new(config: &warden_core::ScmHostConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("buildwarden/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build HTTP client");
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            repo_owner: config.repo_owner.clone(),
            repo_slug: config.repo_slug.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            client,
        }
    }

    fn restrictions_url(&self) -> String {
        format!(
            "{}/repositories/{}/{}/branch-restrictions",
            self.base_url, self.repo_owner, self.repo_slug
        )
    }

    async fn check_restriction_response(
        response: reqwest::Response,
    ) -> Result<(), ScmError> {
        match response.status().as_u16() {
            200 | 201 => Ok(()),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(ScmError::Restriction { status, body })
            }
        }
    }
}

#[async_trait]
impl ScmHostApi for HttpScmHost {
    async fn list_branch_restrictions(&self) -> Result<Vec<BranchRestriction>, ScmError> {
        let response = self
            .client
            .get(self.restrictions_url())
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|e| ScmError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(ScmError::Restriction { status, body });
        }

        let list: RestrictionList = response
            .json()
            .await
            .map_err(|e| ScmError::Transport(e.to_string()))?;
        Ok(list.values)
    }

    async fn create_branch_restriction(
        &self,
        restriction: &BranchRestriction,
    ) -> Result<(), ScmError> {
        debug!(?restriction.kind, pattern = %restriction.pattern, "Adding branch restriction");
        let response = self
            .client
            .post(self.restrictions_url())
            .basic_auth(&self.username, Some(&self.password))
            .json(restriction)
            .send()
            .await
            .map_err(|e| ScmError::Transport(e.to_string()))?;
        Self::check_restriction_response(response).await?;
        info!(?restriction.kind, pattern = %restriction.pattern, "Set branch restriction");
        Ok(())
    }

    async fn update_branch_restriction(
        &self,
        id: i64,
        restriction: &BranchRestriction,
    ) -> Result<(), ScmError> {
        debug!(id, ?restriction.kind, pattern = %restriction.pattern, "Updating branch restriction");
        let response = self
            .client
            .put(format!("{}/{id}", self.restrictions_url()))
            .basic_auth(&self.username, Some(&self.password))
            .json(restriction)
            .send()
            .await
            .map_err(|e| ScmError::Transport(e.to_string()))?;
        Self::check_restriction_response(response).await?;
        info!(id, ?restriction.kind, pattern = %restriction.pattern, "Set branch restriction");
        Ok(())
    }
}

/// CI rebuild trigger over HTTP.
pub struct HttpBuildTrigger {
    base_url: String,
    username: Option<String>,
    password: Option<String>,
    client: reqwest::Client,
}

impl HttpBuildTrigger {
    pub fn new(config: &warden_core::CiTriggerConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("buildwarden/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build HTTP client");
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            client,
        }
    }
}

#[async_trait]
impl BuildTriggerApi for HttpBuildTrigger {
    async fn trigger(&self, branch: &str) -> Result<String, ScmError> {
        let url = format!("{}/job/{branch}/build", self.base_url);
        let mut request = self.client.post(&url);
        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_deref());
        }

        let response = request
            .send()
            .await
            .map_err(|e| ScmError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScmError::Transport(format!(
                "rebuild trigger for {branch} failed (status {status}): {body}"
            )));
        }

        // The queued build id arrives in the Location header; fall back to
        // the response body for backends that answer inline.
        let build_id = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|loc| loc.trim_end_matches('/').rsplit('/').next())
            .map(str::to_string);
        match build_id {
            Some(id) if !id.is_empty() => Ok(id),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Ok(body.trim().to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restriction_omits_id_when_unset() {
        let restriction = BranchRestriction::new(RestrictionKind::Push, "main");
        let json = serde_json::to_string(&restriction).unwrap();
        assert!(!json.contains("\"id\""));
        assert!(json.contains("\"push\""));
    }

    #[test]
    fn restriction_list_parses() {
        let body = r#"{"values":[{"id":7,"kind":"restrict_merges","pattern":"main"}]}"#;
        let list: RestrictionList = serde_json::from_str(body).unwrap();
        assert_eq!(list.values.len(), 1);
        assert_eq!(list.values[0].id, Some(7));
        assert_eq!(list.values[0].kind, RestrictionKind::RestrictMerges);
    }
}
