//! Single-node proof-of-work ledger: hash-linked blocks, a pending pool and
//! longest-valid-chain consensus.
pub mod block;
pub mod config;
pub mod consensus;
pub mod constants;
pub mod error;
pub mod ledger;
pub mod pool;
pub mod pow;
pub mod validate;

pub type Hash = [u8; constants::HASH_SIZE];

pub use block::{Block, Transaction};
pub use config::LedgerConfig;
pub use consensus::{ChainSource, Resolution};
pub use error::{AppendError, ChainError, LedgerError};
pub use ledger::{Ledger, MineOutcome};
pub use pool::TransactionPool;
pub use validate::{is_valid_chain, validate_chain};
