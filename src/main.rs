mod configuration;
mod logging;
mod server;
mod shutdown;

use tracing::info;

use self::{
    configuration::Configuration,
    logging::init_logging,
    server::{Server, app},
    shutdown::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load '.env' file; Ignore errors.
    dotenvy::dotenv().ok();
    init_logging();

    let cfg = Configuration::from_env()?;
    let ui_config = cfg.ui_config();
    let prefix = ui_config.prefix.clone();

    // Register signal handlers before accepting connections.
    let shutdown = shutdown_signal().await;

    let server = Server::new(cfg.socket_addr(), app(ui_config, cfg.static_dir())).await?;
    info!(address = %server.local_addr(), %prefix, "Serving embedded UI");

    shutdown.await;
    server.shutdown().await?;
    info!("Server stopped");
    Ok(())
}
