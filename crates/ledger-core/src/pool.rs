use crate::block::Transaction;

/// Pending transactions in submission order.
#[derive(Clone, Debug, Default)]
pub struct TransactionPool {
    pending: Vec<Transaction>,
}

impl TransactionPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends unconditionally and returns the new pool size.
    pub fn add(&mut self, tx: Transaction) -> usize {
        self.pending.push(tx);
        self.pending.len()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn snapshot(&self) -> Vec<Transaction> {
        self.pending.clone()
    }

    /// Empties the pool, returning its prior contents.
    pub fn drain(&mut self) -> Vec<Transaction> {
        std::mem::take(&mut self.pending)
    }

    /// Removes the oldest `count` transactions, leaving later submissions pending.
    pub fn drain_front(&mut self, count: usize) -> Vec<Transaction> {
        let count = count.min(self.pending.len());
        self.pending.drain(..count).collect()
    }
}
