use crate::block::Block;
use crate::error::ChainError;
use crate::pow::meets_difficulty;

/// Checks that `chain` is a correctly linked, correctly mined sequence rooted at a genesis block.
///
/// Every hash is recomputed from the fields present now, so a block edited
/// after being chained breaks the link recorded by its successor. The genesis
/// block is exempt from the link and proof checks.
pub fn validate_chain(chain: &[Block], difficulty: usize) -> Result<(), ChainError> {
    let genesis = chain.first().ok_or(ChainError::Empty)?;
    if !genesis.is_genesis() {
        return Err(ChainError::InvalidGenesis);
    }

    let mut previous_hash = genesis.hash();
    for (position, block) in chain.iter().enumerate().skip(1) {
        if block.index != position as u64 {
            return Err(ChainError::IndexMismatch {
                position,
                index: block.index,
            });
        }
        if block.previous_hash != previous_hash {
            return Err(ChainError::BrokenLink { index: block.index });
        }
        let hash = block.hash();
        if !meets_difficulty(&hash, difficulty) {
            return Err(ChainError::InsufficientProof {
                index: block.index,
                difficulty,
            });
        }
        previous_hash = hash;
    }
    Ok(())
}

pub fn is_valid_chain(chain: &[Block], difficulty: usize) -> bool {
    validate_chain(chain, difficulty).is_ok()
}
