use thiserror::Error;

/// Rejected user input. Nothing in the ledger is mutated when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("missing transaction data: `{0}` is required")]
    MissingField(&'static str),
    #[error("please supply a valid list of nodes")]
    EmptyPeerList,
    #[error("invalid peer address {0:?}")]
    InvalidPeer(String),
    #[error("difficulty {requested} exceeds the maximum of {max}")]
    DifficultyTooHigh { requested: usize, max: usize },
}

/// Append-time re-validation failures. The candidate is discarded and the pool left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppendError {
    #[error("stale previous hash: chain tip moved while block {index} was being mined")]
    StalePreviousHash { index: u64 },
    #[error("block index {got} does not extend a chain of length {expected}")]
    IndexMismatch { expected: u64, got: u64 },
    #[error("block {index} does not satisfy difficulty {difficulty}")]
    InvalidProof { index: u64, difficulty: usize },
}

/// First reason a candidate chain failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("chain is empty")]
    Empty,
    #[error("first block is not a well-formed genesis block")]
    InvalidGenesis,
    #[error("block at position {position} carries index {index}")]
    IndexMismatch { position: usize, index: u64 },
    #[error("block {index} does not link to the hash of its predecessor")]
    BrokenLink { index: u64 },
    #[error("block {index} does not satisfy difficulty {difficulty}")]
    InsufficientProof { index: u64, difficulty: usize },
}
