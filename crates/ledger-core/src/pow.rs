//! Proof-of-work search and verification.
//!
//! A hash satisfies difficulty `d` when its lowercase hex form starts with at
//! least `d` `'0'` characters.
use crate::block::{digest_with_nonce, Block};
use crate::Hash;
use rayon::prelude::*;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use thiserror::Error;

/// Shared flag that stops an in-flight search.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("proof-of-work search cancelled")]
pub struct Cancelled;

/// A nonce together with the hash it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Proof {
    pub nonce: u64,
    pub hash: Hash,
}

/// Number of leading `'0'` characters in the hex encoding of `hash`.
pub fn count_leading_zero_nibbles(hash: &Hash) -> usize {
    let mut total = 0;
    for b in hash {
        if *b == 0 {
            total += 2;
        } else {
            if *b < 0x10 {
                total += 1;
            }
            break;
        }
    }
    total
}

pub fn meets_difficulty(hash: &Hash, difficulty: usize) -> bool {
    count_leading_zero_nibbles(hash) >= difficulty
}

/// Recompute the block hash from its current fields and check it against `difficulty`.
pub fn validate_proof(block: &Block, difficulty: usize) -> bool {
    meets_difficulty(&block.hash(), difficulty)
}

/// Search nonces upward from `block.nonce` until the hash meets `difficulty`.
///
/// The token is polled before every attempt. The block itself is left
/// untouched; the caller stamps the returned nonce.
pub fn mine(block: &Block, difficulty: usize, cancel: &CancelToken) -> Result<Proof, Cancelled> {
    let prefix = block.canonical_prefix();
    let mut nonce = block.nonce;
    loop {
        if cancel.is_cancelled() {
            return Err(Cancelled);
        }
        let hash = digest_with_nonce(&prefix, nonce);
        if meets_difficulty(&hash, difficulty) {
            return Ok(Proof { nonce, hash });
        }
        nonce = nonce.wrapping_add(1);
    }
}

/// Same contract as [`mine`], with the nonce range split across the rayon pool.
///
/// Any satisfying nonce may win, not necessarily the smallest.
pub fn mine_parallel(
    block: &Block,
    difficulty: usize,
    cancel: &CancelToken,
) -> Result<Proof, Cancelled> {
    let prefix = block.canonical_prefix();
    let found = (block.nonce..u64::MAX).into_par_iter().find_any(|nonce| {
        cancel.is_cancelled() || meets_difficulty(&digest_with_nonce(&prefix, *nonce), difficulty)
    });

    let nonce = found.ok_or(Cancelled)?;
    let hash = digest_with_nonce(&prefix, nonce);
    if meets_difficulty(&hash, difficulty) {
        Ok(Proof { nonce, hash })
    } else {
        Err(Cancelled)
    }
}
