use std::sync::Arc;

use postbridge_core::config::{AppConfig, ConfigError, LoadOptions};
use postbridge_discord::commands::CommandRouter;
use postbridge_discord::gateway::Gateway;
use postbridge_discord::signature::{SignatureError, SignatureVerifier};
use postbridge_publish::host::{GitHubHost, RepositoryHostError};
use postbridge_publish::media::PassthroughMediaStore;
use postbridge_publish::notifier::DiscordNotifier;
use postbridge_publish::orchestrator::Orchestrator;
use thiserror::Error;
use tracing::info;

use crate::pipeline::SubmissionPipeline;

/// Wired application graph: everything the HTTP layer needs, built once at
/// startup from a validated [`AppConfig`].
pub struct Application {
    pub config: AppConfig,
    pub gateway: Arc<Gateway>,
    pub pipeline: Arc<SubmissionPipeline>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("configured public key is not usable: {0}")]
    PublicKey(#[source] SignatureError),
    #[error("repository host client could not be constructed: {0}")]
    HostClient(#[source] RepositoryHostError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let verifier = SignatureVerifier::from_hex(&config.discord.public_key)
        .map_err(BootstrapError::PublicKey)?;
    let router = CommandRouter::new(&config.github.repo, &config.discord.authorized_user_id);
    let gateway = Arc::new(Gateway::new(verifier, router, &config.discord.authorized_user_id));

    let host = GitHubHost::new(&config.github).map_err(BootstrapError::HostClient)?;
    let orchestrator = Orchestrator::new(Arc::new(host), &config.github.base_branch);

    let pipeline = Arc::new(SubmissionPipeline::new(
        orchestrator,
        Arc::new(DiscordNotifier::new(config.github.timeout_secs)),
        Arc::new(PassthroughMediaStore),
        &config.site.base_url,
        &config.github.repo,
    ));

    info!(
        event_name = "system.bootstrap.ready",
        repo = %config.github.repo,
        base_branch = %config.github.base_branch,
        "application graph wired"
    );

    Ok(Application { config, gateway, pipeline })
}
