//! Buildwarden daemon.
//!
//! Builds the component graph from environment configuration and holds it
//! until shutdown. The inbound webhook and chat-callback transports are
//! attached by the embedding deployment; they dispatch into
//! [`EventWorkflow`] and [`ConfirmationWorkflow`].

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, Level};

use warden_core::{
    init_tracing, ConfirmationWorkflow, EventWorkflow, RemediationBackend, RuleEngine, RuleTable,
    WardenConfig,
};
use warden_notify::{NotificationGateway, TracingGateway, WebhookGateway};
use warden_scm::{BuildTriggerApi, GitRemediationService, HttpBuildTrigger, HttpScmHost, ScmHostApi};
use warden_state::{HistoryStore, PendingActionStore, SurrealStore};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(false, Level::INFO);
    info!("wardend {} starting", warden_core::VERSION);

    let config = WardenConfig::from_env().context("loading configuration")?;

    let table = match &config.rules_file {
        Some(path) => RuleTable::load(path)
            .with_context(|| format!("loading rules from {}", path.display()))?,
        None => RuleTable::standard(),
    };
    info!("Loaded rule table with {} rules", table.len());

    let store = Arc::new(
        SurrealStore::from_env()
            .await
            .context("connecting to the state store")?,
    );
    let history: Arc<dyn HistoryStore> = store.clone();
    let pending: Arc<dyn PendingActionStore> = store;

    let gateway: Arc<dyn NotificationGateway> = match &config.chat.webhook_url {
        Some(url) => Arc::new(WebhookGateway::new(url, config.chat.token.clone())),
        None => Arc::new(TracingGateway::new()),
    };

    let host: Option<Arc<dyn ScmHostApi>> = config
        .scm_host
        .as_ref()
        .map(|host| Arc::new(HttpScmHost::new(host)) as Arc<dyn ScmHostApi>);
    let ci: Option<Arc<dyn BuildTriggerApi>> = config
        .ci
        .as_ref()
        .map(|ci| Arc::new(HttpBuildTrigger::new(ci)) as Arc<dyn BuildTriggerApi>);
    let backend: Arc<dyn RemediationBackend> = Arc::new(GitRemediationService::new(
        config.repository.clone(),
        host,
        ci,
    ));

    let _events = EventWorkflow::new(
        history,
        Arc::clone(&pending),
        Arc::clone(&backend),
        Arc::clone(&gateway),
        RuleEngine::new(table, &config.chat.default_channel),
        config.filters.clone(),
        &config.chat.default_channel,
    );
    let _confirmations = ConfirmationWorkflow::new(pending, backend, gateway);

    info!("wardend ready; waiting for inbound transports");
    tokio::signal::ctrl_c().await?;
    info!("wardend shutting down");
    Ok(())
}
