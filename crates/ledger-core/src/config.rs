use crate::{
    constants::{DEFAULT_DIFFICULTY, MAX_DIFFICULTY},
    error::LedgerError,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Leading `'0'` hex characters every non-genesis block hash must carry.
    pub difficulty: usize,
    /// Search the nonce space on the rayon pool instead of a single thread.
    pub parallel_mining: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            parallel_mining: false,
        }
    }
}

impl LedgerConfig {
    pub fn with_difficulty(difficulty: usize) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.difficulty > MAX_DIFFICULTY {
            return Err(LedgerError::DifficultyTooHigh {
                requested: self.difficulty,
                max: MAX_DIFFICULTY,
            });
        }
        Ok(())
    }
}
