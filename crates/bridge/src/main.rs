// docpush-bridge: webhook server that republishes a Drive document to git.

use anyhow::Context;
use docpush_bridge::config::BridgeConfig;
use docpush_bridge::handler::Bridge;
use docpush_bridge::server::{build_router, shutdown_signal};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = BridgeConfig::from_env().context("invalid bridge configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.log_filter)
                .with_context(|| format!("invalid log filter `{}`", config.log_filter))?,
        )
        .init();

    let bridge = Bridge::from_config(&config).context("failed to build document bridge")?;

    let status = bridge
        .renew_subscription()
        .await
        .context("failed to register the document push channel")?;
    info!(
        document_id = %config.document_id,
        channel_id = %config.channel_id,
        outcome = status.as_str(),
        "push channel ready"
    );

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind listener on {}", config.listen_addr))?;

    info!(listen_addr = %config.listen_addr, "starting docpush bridge");

    axum::serve(listener, build_router(bridge))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("bridge server exited unexpectedly")
}
