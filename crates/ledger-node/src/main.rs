use clap::Parser;
use ledger_core::Ledger;
use ledger_node::{config::Args, identity::generate_node_id, router, AppState, HttpPeerClient};
use std::{net::SocketAddr, sync::Arc};
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = args.ledger_config()?;
    let node_id = args.node_id.clone().unwrap_or_else(generate_node_id);

    let ledger = Arc::new(Ledger::new(config));
    if !args.peers.is_empty() {
        ledger.register_peers(&args.peers)?;
    }

    let state = AppState::new(ledger, node_id.clone(), HttpPeerClient::new(args.peer_timeout())?);
    let app = router(state);

    let addr: SocketAddr = args.listen.parse()?;
    info!(%node_id, "ledger-node listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
