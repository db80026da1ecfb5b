use clap::Parser;
use sandbox_ftpd::config::Config;
use sandbox_ftpd::fs::{cleanup_root, seed_root};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = Config::parse();

    tracing_subscriber::fmt().with_env_filter(EnvFilter::new(&config.log_level)).init();

    let (root, owns_root) = match config.root {
        Some(root) => (root, false),
        None => (std::env::temp_dir().join(format!("sandbox-ftpd-{}", std::process::id())), true),
    };

    seed_root(&root).await?;
    tracing::info!(root = %root.display(), "seeded virtual root");

    let cleanup_root_path = root.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        if owns_root {
            tracing::info!("shutdown signal received, removing scratch root");
            if let Err(e) = cleanup_root(&cleanup_root_path).await {
                tracing::warn!("failed to remove scratch root: {e}");
            }
        } else {
            tracing::info!("shutdown signal received");
        }
        std::process::exit(0);
    });

    sandbox_ftpd::server::listen(config.bind, root).await
}

async fn wait_for_shutdown_signal() {
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}
