//! Longest-valid-chain resolution across registered peers.
use crate::{block::Block, ledger::Ledger, validate::validate_chain};
use std::future::Future;
use tracing::{debug, info, warn};

/// Fetches the current chain held by a peer.
///
/// Implemented over HTTP by the node; tests substitute an in-memory map.
pub trait ChainSource: Send + Sync {
    fn fetch_chain(&self, peer: &str) -> impl Future<Output = anyhow::Result<Vec<Block>>> + Send;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub replaced: bool,
    /// Local chain length once resolution finished.
    pub length: usize,
    /// Peer whose chain was adopted.
    pub adopted_from: Option<String>,
    pub unreachable: Vec<String>,
}

impl Ledger {
    /// Replace the local chain with the longest valid peer chain, if one is strictly longer.
    ///
    /// Unreachable peers and invalid chains are skipped. Ties keep the local chain.
    pub async fn resolve<C: ChainSource>(&self, source: &C) -> Resolution {
        let difficulty = self.difficulty();
        let mut best_len = self.chain_len();
        let mut best: Option<(String, Vec<Block>)> = None;
        let mut unreachable = Vec::new();

        for peer in self.peers() {
            let chain = match source.fetch_chain(&peer).await {
                Ok(chain) => chain,
                Err(err) => {
                    warn!(%peer, error = %err, "peer unreachable");
                    unreachable.push(peer);
                    continue;
                }
            };
            debug!(%peer, length = chain.len(), "fetched peer chain");
            if chain.len() <= best_len {
                continue;
            }
            if let Err(err) = validate_chain(&chain, difficulty) {
                warn!(%peer, error = %err, "peer chain invalid");
                continue;
            }
            best_len = chain.len();
            best = Some((peer, chain));
        }

        let mut resolution = Resolution {
            unreachable,
            ..Resolution::default()
        };
        if let Some((peer, chain)) = best {
            // The local chain may have grown while peers were queried; replace_chain re-checks.
            if self.replace_chain(chain) {
                info!(%peer, length = best_len, "adopted peer chain");
                resolution.replaced = true;
                resolution.adopted_from = Some(peer);
            }
        }
        resolution.length = self.chain_len();
        resolution
    }
}
