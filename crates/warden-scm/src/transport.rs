//! Git transport configuration.
//!
//! Builds the remote callbacks applied to every command that talks to the
//! remote: HTTP(S) credentials only when both username and password are
//! configured, SSH password or agent keys otherwise, and the host-key
//! checking policy from configuration.

use git2::cert::Cert;
use git2::{CertificateCheckStatus, Cred, CredentialType, RemoteCallbacks};
use tracing::debug;
use warden_core::RepositoryConfig;

/// Remote callbacks for fetch/clone/push against the configured remote.
pub fn remote_callbacks(config: &RepositoryConfig) -> RemoteCallbacks<'_> {
    let mut callbacks = RemoteCallbacks::new();

    callbacks.credentials(move |_url, username_from_url, allowed| {
        // HTTP(S), or SSH with password authentication.
        if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
            if let (Some(username), Some(password)) = (&config.username, &config.password) {
                debug!("Configuring repository transport with username/password credentials");
                return Cred::userpass_plaintext(username, password);
            }
            debug!("No credentials configured for repository transport - assuming unauthenticated");
        }

        // SSH public-key authentication via the agent.
        if allowed.contains(CredentialType::SSH_KEY) {
            if let Some(username) = username_from_url {
                debug!("Configuring repository transport for SSH agent");
                return Cred::ssh_key_from_agent(username);
            }
        }

        Cred::default()
    });

    if config.strict_host_key_checking == Some(false) {
        debug!("SSH strict host key checking disabled by configuration");
        callbacks.certificate_check(|_cert: &Cert<'_>, _host: &str| {
            Ok(CertificateCheckStatus::CertificateOk)
        });
    }

    callbacks
}
