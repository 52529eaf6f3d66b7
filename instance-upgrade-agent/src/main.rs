use std::sync::Arc;
use std::time::Duration;

use instance_upgrade_core::{BoxError, HealthVerifier, ImageResolver, UpgradeEngine};
use instance_upgrade_kubeapi::KubeApi;
use instance_upgrade_openstack::{Connector, MetadataClient, OpenStack};

use cli::{Cli, Task};

mod channel;
mod cli;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse_args();
    let result = match cli.task() {
        Some(Task::Verify) => verify(&cli).await,
        Some(Task::InstanceUpgrade) => instance_upgrade(&cli).await,
        Some(Task::ServeImageChannel) => serve_image_channel(&cli).await,
        None => Err("no task given".into()),
    };
    result.inspect_err(|err| tracing::error!(%err, "Giving up"))
}

async fn verify(cli: &Cli) -> Result<(), BoxError> {
    tracing::info!(duration = ?cli.duration, "Verifying cluster health");
    let kubeapi = KubeApi::new().await?;
    HealthVerifier::new(kubeapi, cli.verifier_config())
        .verify(cli.duration)
        .await?;
    tracing::info!("Cluster is healthy");
    Ok(())
}

async fn instance_upgrade(cli: &Cli) -> Result<(), BoxError> {
    let metadata = MetadataClient::new(&cli.metadata_url)?;
    let cloud = OpenStack::connect(&cli.openstack.credentials()?).await?;
    let engine = UpgradeEngine::new(metadata, cloud.clone(), cloud);
    let outcome = engine
        .update_instance_image(cli.image_name.as_deref(), &cli.image_id)
        .await?;
    tracing::debug!(?outcome, "Instance upgrade finished");
    Ok(())
}

async fn serve_image_channel(cli: &Cli) -> Result<(), BoxError> {
    tracing::info!("Starting image channel");
    let resolver = ImageResolver::new(Connector::new(cli.openstack.credentials()?));
    channel::serve(&cli.listen, resolver).await?;
    Ok(())
}
