use anyhow::{Context, Result};
use flow_sign::{router, SignerConfig};
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let config = SignerConfig::from_env().context("Signing service is not configured")?;
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    log::info!("Signing server listening on port {}", config.port);

    axum::serve(listener, router(config))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("Shutting down signing server");
        })
        .await?;
    Ok(())
}
