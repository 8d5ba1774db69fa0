use crate::constants::{ENCODING_VERSION, GENESIS_PREVIOUS_HASH, MINING_REWARD, REWARD_SENDER};
use crate::Hash;
use serde::{Deserialize, Serialize};
use serde_json::Number;
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

/// Sender and recipient are opaque; the amount is any JSON number, signed or fractional.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: Number,
}

impl Transaction {
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: impl Into<Number>,
    ) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount: amount.into(),
        }
    }

    /// The fixed reward a node pays itself after mining a block.
    pub fn reward(recipient: impl Into<String>) -> Self {
        Self::new(REWARD_SENDER, recipient, MINING_REWARD)
    }

    fn encode_into(&self, bytes: &mut Vec<u8>) {
        encode_str(bytes, &self.sender);
        encode_str(bytes, &self.recipient);
        // The JSON text of a number is its canonical form: "-5", "2.5", "10".
        encode_str(bytes, &self.amount.to_string());
    }
}

fn encode_str(bytes: &mut Vec<u8>, s: &str) {
    bytes.extend_from_slice(&(s.len() as u64).to_le_bytes());
    bytes.extend_from_slice(s.as_bytes());
}

/// A batch of transactions linked to its predecessor by hash.
///
/// The hash is never stored: [`Block::hash`] recomputes it from the current
/// field values, so tampering with a chained block is visible to every
/// successor that recorded the old value. On the wire the hash is emitted
/// alongside the fields and ignored when read back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "BlockRecord", from = "BlockRecord")]
pub struct Block {
    pub index: u64,
    /// Milliseconds since the unix epoch. Informational only.
    pub timestamp: u64,
    pub transactions: Vec<Transaction>,
    pub previous_hash: Hash,
    pub nonce: u64,
}

impl Block {
    /// A fresh, unmined candidate stamped with the current time.
    pub fn new(index: u64, transactions: Vec<Transaction>, previous_hash: Hash) -> Self {
        Self {
            index,
            timestamp: now_millis(),
            transactions,
            previous_hash,
            nonce: 0,
        }
    }

    /// Index 0, no transactions, sentinel previous hash. Exempt from proof of work.
    pub fn genesis() -> Self {
        Self::new(0, vec![], GENESIS_PREVIOUS_HASH)
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0 && self.previous_hash == GENESIS_PREVIOUS_HASH && self.transactions.is_empty()
    }

    /// Canonical encoding of every field except the nonce.
    ///
    /// Layout (v1, integers little-endian u64): version byte, index, timestamp,
    /// transaction count, then per transaction a length-prefixed sender, a
    /// length-prefixed recipient and the length-prefixed JSON text of the
    /// amount, then the 32-byte previous hash.
    pub fn canonical_prefix(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(1 + 8 * 3 + 32 + self.transactions.len() * 64);
        bytes.push(ENCODING_VERSION);
        bytes.extend_from_slice(&self.index.to_le_bytes());
        bytes.extend_from_slice(&self.timestamp.to_le_bytes());
        bytes.extend_from_slice(&(self.transactions.len() as u64).to_le_bytes());
        for tx in &self.transactions {
            tx.encode_into(&mut bytes);
        }
        bytes.extend_from_slice(&self.previous_hash);
        bytes
    }

    /// Full canonical encoding: the prefix followed by the nonce.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut bytes = self.canonical_prefix();
        bytes.extend_from_slice(&self.nonce.to_le_bytes());
        bytes
    }

    pub fn hash(&self) -> Hash {
        digest_with_nonce(&self.canonical_prefix(), self.nonce)
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash())
    }
}

/// SHA-256 over `prefix || nonce`. The nonce sits last in the encoding so the
/// miner can reuse one prefix for every attempt.
pub(crate) fn digest_with_nonce(prefix: &[u8], nonce: u64) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(prefix);
    hasher.update(nonce.to_le_bytes());
    hasher.finalize().into()
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Wire shape of a block: fields in canonical order plus the derived hash.
#[derive(Serialize, Deserialize)]
struct BlockRecord {
    index: u64,
    timestamp: u64,
    transactions: Vec<Transaction>,
    #[serde(with = "hex_hash")]
    previous_hash: Hash,
    nonce: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hash: Option<String>,
}

impl From<Block> for BlockRecord {
    fn from(block: Block) -> Self {
        let hash = Some(block.hash_hex());
        Self {
            index: block.index,
            timestamp: block.timestamp,
            transactions: block.transactions,
            previous_hash: block.previous_hash,
            nonce: block.nonce,
            hash,
        }
    }
}

impl From<BlockRecord> for Block {
    // A claimed hash is never trusted; it is recomputed on demand.
    fn from(record: BlockRecord) -> Self {
        Self {
            index: record.index,
            timestamp: record.timestamp,
            transactions: record.transactions,
            previous_hash: record.previous_hash,
            nonce: record.nonce,
        }
    }
}

pub mod hex_hash {
    use crate::Hash;
    use hex::FromHex;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(hash: &Hash, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(hash))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Hash, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash::from_hex(s).map_err(D::Error::custom)
    }
}
