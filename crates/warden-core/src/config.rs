//! Process configuration.
//!
//! Built once at startup (environment-driven) and passed by reference into
//! each component; core logic performs no ambient lookups.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::{Result, WardenError};

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_list(name: &str) -> Vec<String> {
    env_var(name)
        .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
        .unwrap_or_default()
}

/// Local mirror and git transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Remote URL the mirror is cloned from (SSH or HTTP(S)).
    pub remote_url: String,
    /// Directory holding the bare mirror.
    pub local_dir: PathBuf,
    /// When false, reverts are committed locally and not pushed.
    pub push_changes: bool,
    /// HTTP(S) credentials; both must be set to authenticate.
    pub username: Option<String>,
    pub password: Option<String>,
    /// SSH host-key checking override; `None` keeps the transport default.
    pub strict_host_key_checking: Option<bool>,
    /// Bound on waiting for the working-copy lock before `Busy`.
    pub lock_wait_secs: u64,
}

impl RepositoryConfig {
    pub fn from_env() -> Result<Self> {
        let remote_url = env_var("WARDEN_GIT_REMOTE_URL")
            .ok_or_else(|| WardenError::Config("WARDEN_GIT_REMOTE_URL is not set".to_string()))?;
        let local_dir = env_var("WARDEN_GIT_LOCAL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("warden_mirror"));
        Ok(Self {
            remote_url,
            local_dir,
            push_changes: env_var("WARDEN_GIT_PUSH_CHANGES").as_deref() == Some("true"),
            username: env_var("WARDEN_GIT_USERNAME"),
            password: env_var("WARDEN_GIT_PASSWORD"),
            strict_host_key_checking: env_var("WARDEN_GIT_STRICT_HOST_KEY_CHECKING")
                .map(|v| v == "true"),
            lock_wait_secs: env_var("WARDEN_SCM_LOCK_WAIT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
        })
    }
}

/// SCM host (branch restriction) API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScmHostConfig {
    pub base_url: String,
    pub repo_owner: String,
    pub repo_slug: String,
    pub username: String,
    pub password: String,
}

impl ScmHostConfig {
    /// `None` when the host section is not configured; branch locking is
    /// then unsupported.
    pub fn from_env() -> Result<Option<Self>> {
        let Some(base_url) = env_var("WARDEN_SCM_HOST_URL") else {
            return Ok(None);
        };
        let require = |name: &str| {
            env_var(name).ok_or_else(|| WardenError::Config(format!("{name} is not set")))
        };
        Ok(Some(Self {
            base_url,
            repo_owner: require("WARDEN_SCM_REPO_OWNER")?,
            repo_slug: require("WARDEN_SCM_REPO_SLUG")?,
            username: require("WARDEN_SCM_USERNAME")?,
            password: require("WARDEN_SCM_PASSWORD")?,
        }))
    }
}

/// CI rebuild trigger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CiTriggerConfig {
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl CiTriggerConfig {
    pub fn from_env() -> Option<Self> {
        env_var("WARDEN_CI_BASE_URL").map(|base_url| Self {
            base_url,
            username: env_var("WARDEN_CI_USERNAME"),
            password: env_var("WARDEN_CI_PASSWORD"),
        })
    }
}

/// Operator notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    pub default_channel: String,
    /// Webhook adapter endpoint; absent means log-only notifications.
    pub webhook_url: Option<String>,
    pub token: Option<String>,
}

impl ChatConfig {
    pub fn from_env() -> Self {
        Self {
            default_channel: env_var("WARDEN_CHAT_CHANNEL")
                .unwrap_or_else(|| "general".to_string()),
            webhook_url: env_var("WARDEN_CHAT_WEBHOOK_URL"),
            token: env_var("WARDEN_CHAT_TOKEN"),
        }
    }
}

/// Inbound event allowlists; empty lists allow everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilterConfig {
    pub job_names: Vec<String>,
    pub branch_names: Vec<String>,
}

impl EventFilterConfig {
    pub fn from_env() -> Self {
        Self {
            job_names: env_list("WARDEN_FILTER_JOBS"),
            branch_names: env_list("WARDEN_FILTER_BRANCHES"),
        }
    }

    /// Whether an event on this job/branch should be processed.
    pub fn allows(&self, job_name: Option<&str>, branch: &str) -> bool {
        let job_ok = self.job_names.is_empty()
            || job_name.map_or(true, |job| self.job_names.iter().any(|j| j == job));
        let branch_ok =
            self.branch_names.is_empty() || self.branch_names.iter().any(|b| b == branch);
        job_ok && branch_ok
    }
}

/// Top-level configuration, constructed once at process start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WardenConfig {
    pub repository: RepositoryConfig,
    pub scm_host: Option<ScmHostConfig>,
    pub ci: Option<CiTriggerConfig>,
    pub chat: ChatConfig,
    pub filters: EventFilterConfig,
    /// Rule table path; absent means the built-in standard table.
    pub rules_file: Option<PathBuf>,
}

impl WardenConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            repository: RepositoryConfig::from_env()?,
            scm_host: ScmHostConfig::from_env()?,
            ci: CiTriggerConfig::from_env(),
            chat: ChatConfig::from_env(),
            filters: EventFilterConfig::from_env(),
            rules_file: env_var("WARDEN_RULES_FILE").map(PathBuf::from),
        })
    }
}
