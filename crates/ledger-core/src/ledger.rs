use crate::{
    block::{Block, Transaction},
    config::LedgerConfig,
    error::{AppendError, ChainError, LedgerError},
    pool::TransactionPool,
    pow::{self, CancelToken, Cancelled, Proof},
    validate::{is_valid_chain, validate_chain},
    Hash,
};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Result of one mining attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MineOutcome {
    Mined { index: u64, hash: Hash },
    /// Nothing pending; no block was built.
    NoPendingTransactions,
    /// The candidate failed append-time re-validation. Pending transactions were kept.
    Discarded(AppendError),
    /// The chain was replaced while the search ran. Pending transactions were kept.
    Cancelled,
}

impl MineOutcome {
    pub fn index(&self) -> Option<u64> {
        match self {
            MineOutcome::Mined { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// The canonical chain, the pending pool and the peer registry of one node.
///
/// Lock order is always chain, then pool, then epoch. The proof-of-work search
/// runs with no lock held.
pub struct Ledger {
    config: LedgerConfig,
    chain: RwLock<Vec<Block>>,
    pool: Mutex<TransactionPool>,
    peers: RwLock<BTreeSet<String>>,
    /// Cancelled and replaced whenever the chain is swapped wholesale.
    epoch: Mutex<CancelToken>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}

impl Ledger {
    pub fn new(config: LedgerConfig) -> Self {
        Self::with_genesis(config, Block::genesis())
    }

    /// Start from a specific genesis block so several ledgers can share one root.
    pub fn with_genesis(config: LedgerConfig, genesis: Block) -> Self {
        info!(
            difficulty = config.difficulty,
            genesis = %genesis.hash_hex(),
            "ledger created"
        );
        Self {
            config,
            chain: RwLock::new(vec![genesis]),
            pool: Mutex::new(TransactionPool::new()),
            peers: RwLock::new(BTreeSet::new()),
            epoch: Mutex::new(CancelToken::new()),
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn difficulty(&self) -> usize {
        self.config.difficulty
    }

    pub fn chain(&self) -> Vec<Block> {
        self.chain.read().clone()
    }

    pub fn chain_len(&self) -> usize {
        self.chain.read().len()
    }

    pub fn last_block(&self) -> Block {
        tip(&self.chain.read()).clone()
    }

    pub fn validate(&self) -> Result<(), ChainError> {
        validate_chain(&self.chain.read(), self.config.difficulty)
    }

    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.pool.lock().snapshot()
    }

    /// Queue a transaction and return the index of the block it is expected to land in.
    pub fn submit_transaction(&self, tx: Transaction) -> u64 {
        let chain = self.chain.read();
        let size = self.pool.lock().add(tx);
        debug!(pending = size, "transaction queued");
        chain.len() as u64
    }

    /// Build a block from the pending pool, find its proof and append it.
    ///
    /// Blocks the calling thread for the length of the search.
    pub fn mine(&self) -> MineOutcome {
        let (candidate, taken, cancel) = {
            let chain = self.chain.read();
            let pool = self.pool.lock();
            if pool.is_empty() {
                return MineOutcome::NoPendingTransactions;
            }
            let candidate = Block::new(chain.len() as u64, pool.snapshot(), tip(&chain).hash());
            (candidate, pool.len(), self.epoch.lock().clone())
        };

        let proof = match self.search(&candidate, &cancel) {
            Ok(proof) => proof,
            Err(Cancelled) => {
                warn!(index = candidate.index, "mining abandoned: chain replaced");
                return MineOutcome::Cancelled;
            }
        };

        let index = candidate.index;
        let mut chain = self.chain.write();
        if let Err(err) = append_checked(&mut chain, candidate, proof.nonce, self.config.difficulty) {
            warn!(index, error = %err, "mined block discarded");
            return MineOutcome::Discarded(err);
        }
        let included = self.pool.lock().drain_front(taken);
        info!(
            index,
            nonce = proof.nonce,
            txs = included.len(),
            hash = %hex::encode(proof.hash),
            "block mined"
        );
        MineOutcome::Mined {
            index,
            hash: proof.hash,
        }
    }

    fn search(&self, candidate: &Block, cancel: &CancelToken) -> Result<Proof, Cancelled> {
        if self.config.parallel_mining {
            pow::mine_parallel(candidate, self.config.difficulty, cancel)
        } else {
            pow::mine(candidate, self.config.difficulty, cancel)
        }
    }

    /// Stamp `nonce` onto `block` and append it if it still extends the tip with a valid proof.
    pub fn append_block(&self, block: Block, nonce: u64) -> Result<(), AppendError> {
        let index = block.index;
        let mut chain = self.chain.write();
        append_checked(&mut chain, block, nonce, self.config.difficulty)?;
        info!(index, "block appended");
        Ok(())
    }

    /// Add peer addresses. Every address is checked before any is stored.
    pub fn register_peers<I>(&self, addresses: I) -> Result<usize, LedgerError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let addresses = addresses
            .into_iter()
            .map(|addr| normalize_peer(addr.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        if addresses.is_empty() {
            return Err(LedgerError::EmptyPeerList);
        }

        let mut peers = self.peers.write();
        peers.extend(addresses);
        info!(total = peers.len(), "peers registered");
        Ok(peers.len())
    }

    pub fn peers(&self) -> Vec<String> {
        self.peers.read().iter().cloned().collect()
    }

    /// Swap in `candidate` if it is strictly longer than the local chain and valid.
    ///
    /// Any in-flight mining attempt is cancelled on success.
    pub fn replace_chain(&self, candidate: Vec<Block>) -> bool {
        let mut chain = self.chain.write();
        if candidate.len() <= chain.len() {
            return false;
        }
        if !is_valid_chain(&candidate, self.config.difficulty) {
            warn!(length = candidate.len(), "rejected invalid replacement chain");
            return false;
        }

        let previous = chain.len();
        *chain = candidate;
        let mut epoch = self.epoch.lock();
        epoch.cancel();
        *epoch = CancelToken::new();
        info!(from = previous, to = chain.len(), "chain replaced");
        true
    }
}

fn tip(chain: &[Block]) -> &Block {
    chain.last().expect("chain always holds a genesis block")
}

fn append_checked(
    chain: &mut Vec<Block>,
    mut block: Block,
    nonce: u64,
    difficulty: usize,
) -> Result<(), AppendError> {
    block.nonce = nonce;
    let last = tip(chain);
    if block.previous_hash != last.hash() {
        return Err(AppendError::StalePreviousHash { index: block.index });
    }
    let expected = chain.len() as u64;
    if block.index != expected {
        return Err(AppendError::IndexMismatch {
            expected,
            got: block.index,
        });
    }
    if !pow::validate_proof(&block, difficulty) {
        return Err(AppendError::InvalidProof {
            index: block.index,
            difficulty,
        });
    }
    chain.push(block);
    Ok(())
}

fn normalize_peer(address: &str) -> Result<String, LedgerError> {
    let trimmed = address.trim().trim_end_matches('/');
    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
        return Err(LedgerError::InvalidPeer(address.to_string()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> Ledger {
        Ledger::new(LedgerConfig::with_difficulty(2))
    }

    #[test]
    fn fresh_ledger_holds_genesis() {
        let ledger = ledger();
        assert_eq!(ledger.chain_len(), 1);
        let genesis = ledger.last_block();
        assert!(genesis.is_genesis());
        assert!(ledger.pending_transactions().is_empty());
        assert!(ledger.validate().is_ok());
    }

    #[test]
    fn submit_returns_next_block_index() {
        let ledger = ledger();
        assert_eq!(ledger.submit_transaction(Transaction::new("A", "B", 10)), 1);
        assert_eq!(ledger.submit_transaction(Transaction::new("B", "C", 3)), 1);
        assert_eq!(ledger.pending_transactions().len(), 2);
    }

    #[test]
    fn mine_with_empty_pool_is_a_noop() {
        let ledger = ledger();
        assert_eq!(ledger.mine(), MineOutcome::NoPendingTransactions);
        assert_eq!(ledger.chain_len(), 1);
    }

    #[test]
    fn mine_appends_and_drains() {
        let ledger = ledger();
        ledger.submit_transaction(Transaction::new("A", "B", 10));
        let genesis_hash = ledger.last_block().hash();

        let outcome = ledger.mine();
        assert_eq!(outcome.index(), Some(1));
        assert_eq!(ledger.chain_len(), 2);
        assert!(ledger.pending_transactions().is_empty());

        let block = ledger.last_block();
        assert_eq!(block.previous_hash, genesis_hash);
        assert_eq!(block.transactions, vec![Transaction::new("A", "B", 10)]);
        assert!(block.hash_hex().starts_with("00"));
        assert_eq!(outcome, MineOutcome::Mined { index: 1, hash: block.hash() });
    }

    #[test]
    fn parallel_mining_produces_valid_blocks() {
        let ledger = Ledger::new(LedgerConfig {
            difficulty: 2,
            parallel_mining: true,
        });
        for i in 0..3 {
            ledger.submit_transaction(Transaction::new("A", "B", i));
            assert_eq!(ledger.mine().index(), Some(i + 1));
        }
        assert!(ledger.validate().is_ok());
    }

    #[test]
    fn append_rejects_stale_previous_hash() {
        let ledger = ledger();
        let stale = Block::new(1, vec![Transaction::new("A", "B", 1)], [9u8; 32]);
        let nonce = pow::mine(&stale, 2, &CancelToken::new()).unwrap().nonce;
        assert_eq!(
            ledger.append_block(stale, nonce),
            Err(AppendError::StalePreviousHash { index: 1 })
        );
        assert_eq!(ledger.chain_len(), 1);
    }

    #[test]
    fn append_rejects_bad_proof() {
        let ledger = ledger();
        let mut block = Block::new(1, vec![Transaction::new("A", "B", 1)], ledger.last_block().hash());
        while pow::validate_proof(&block, 2) {
            block.nonce += 1;
        }
        let nonce = block.nonce;
        assert_eq!(
            ledger.append_block(block, nonce),
            Err(AppendError::InvalidProof {
                index: 1,
                difficulty: 2
            })
        );
    }

    #[test]
    fn append_rejects_wrong_index() {
        let ledger = ledger();
        let block = Block::new(7, vec![Transaction::new("A", "B", 1)], ledger.last_block().hash());
        let nonce = pow::mine(&block, 2, &CancelToken::new()).unwrap().nonce;
        assert_eq!(
            ledger.append_block(block, nonce),
            Err(AppendError::IndexMismatch { expected: 1, got: 7 })
        );
    }

    #[test]
    fn append_accepts_mined_successor() {
        let ledger = ledger();
        let block = Block::new(1, vec![Transaction::new("A", "B", 1)], ledger.last_block().hash());
        let nonce = pow::mine(&block, 2, &CancelToken::new()).unwrap().nonce;
        assert_eq!(ledger.append_block(block, nonce), Ok(()));
        assert_eq!(ledger.chain_len(), 2);
        assert!(ledger.validate().is_ok());
    }

    #[test]
    fn register_peers_counts_unique_addresses() {
        let ledger = ledger();
        assert_eq!(
            ledger.register_peers(["127.0.0.1:5001", "127.0.0.1:5002/"]),
            Ok(2)
        );
        assert_eq!(ledger.register_peers(["127.0.0.1:5002"]), Ok(2));
        assert_eq!(ledger.peers(), vec!["127.0.0.1:5001", "127.0.0.1:5002"]);
    }

    #[test]
    fn register_peers_rejects_without_mutating() {
        let ledger = ledger();
        assert_eq!(
            ledger.register_peers(["127.0.0.1:5001", "  "]),
            Err(LedgerError::InvalidPeer("  ".to_string()))
        );
        assert_eq!(
            ledger.register_peers(Vec::<String>::new()),
            Err(LedgerError::EmptyPeerList)
        );
        assert!(ledger.peers().is_empty());
    }

    #[test]
    fn replace_chain_cancels_in_flight_token() {
        let ledger = ledger();
        let before = ledger.epoch.lock().clone();

        let donor = Ledger::with_genesis(LedgerConfig::with_difficulty(2), ledger.chain()[0].clone());
        donor.submit_transaction(Transaction::new("A", "B", 1));
        donor.mine();

        assert!(ledger.replace_chain(donor.chain()));
        assert!(before.is_cancelled());
        assert!(!ledger.epoch.lock().is_cancelled());
        assert_eq!(ledger.chain(), donor.chain());
    }

    #[test]
    fn replace_chain_refuses_equal_length_and_invalid() {
        let ledger = ledger();
        assert!(!ledger.replace_chain(vec![Block::genesis()]));

        let mut bogus = vec![Block::genesis()];
        bogus.push(Block::new(1, vec![Transaction::new("A", "B", 1)], [1u8; 32]));
        assert!(!ledger.replace_chain(bogus));
        assert_eq!(ledger.chain_len(), 1);
    }
}
