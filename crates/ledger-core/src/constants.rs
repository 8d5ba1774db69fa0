pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
pub const DEFAULT_DIFFICULTY: usize = 2;
pub const MAX_DIFFICULTY: usize = HASH_HEX_SIZE;

/// Bumped whenever the field layout fed to the block digest changes.
pub const ENCODING_VERSION: u8 = 1;

/// `previous_hash` of every genesis block.
pub const GENESIS_PREVIOUS_HASH: [u8; HASH_SIZE] = [0u8; HASH_SIZE];

pub const REWARD_SENDER: &str = "0";
pub const MINING_REWARD: u64 = 1;
