use clap::Parser;
use ledger_core::{LedgerConfig, LedgerError};
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "ledger-node")]
#[command(about = "Proof-of-work ledger node")]
pub struct Args {
    /// Address to listen on, e.g. 127.0.0.1:8080
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub listen: String,

    /// Leading zero hex characters required in every mined block hash
    #[arg(long, default_value_t = ledger_core::constants::DEFAULT_DIFFICULTY)]
    pub difficulty: usize,

    /// Peer node address (repeatable), e.g. --peer 127.0.0.1:8081
    #[arg(long = "peer")]
    pub peers: Vec<String>,

    /// Identifier credited with mining rewards; generated when omitted
    #[arg(long)]
    pub node_id: Option<String>,

    /// Search nonces on all cores
    #[arg(long)]
    pub parallel_mining: bool,

    /// Per-request timeout when fetching peer chains
    #[arg(long, default_value_t = 5)]
    pub peer_timeout_secs: u64,
}

impl Args {
    pub fn ledger_config(&self) -> Result<LedgerConfig, LedgerError> {
        let config = LedgerConfig {
            difficulty: self.difficulty,
            parallel_mining: self.parallel_mining,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn peer_timeout(&self) -> Duration {
        Duration::from_secs(self.peer_timeout_secs)
    }
}
