//! Guess Round Server
//!
//! Waits for the configured number of players, groups them, and runs the
//! rounds over WebSocket. Configuration comes from the environment.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use guess_round::{
    VERSION,
    game::config::GameConfig,
    network::{AuthConfig, GameServer, ServerConfig},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let game = GameConfig::from_env().context("reading game config")?;
    game.validate().context("invalid game config")?;
    let auth = AuthConfig::from_env();
    let config = ServerConfig::from_env().context("reading server config")?;

    info!("Guess Round Server v{}", VERSION);
    info!(
        "Groups of {}, {} rounds, {}s to guess",
        game.group_size,
        game.num_rounds,
        game.guess_window.as_secs()
    );
    if !auth.is_configured() {
        anyhow::bail!("set AUTH_SECRET or AUTH_PUBLIC_KEY_PEM to validate join tokens");
    }

    let server = GameServer::new(config, game, &auth)?;
    let shutdown = server.shutdown_handle();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received");
            let _ = shutdown.send(());
        }
    });

    server.run().await?;
    info!("Server stopped");
    Ok(())
}
