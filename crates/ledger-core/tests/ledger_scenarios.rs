use ledger_core::{
    pow::{mine, CancelToken},
    validate_chain, AppendError, Block, Ledger, LedgerConfig, MineOutcome, Transaction,
};
use std::sync::Arc;
use std::thread;

fn ledger(difficulty: usize) -> Ledger {
    Ledger::new(LedgerConfig::with_difficulty(difficulty))
}

#[test]
fn submit_mine_and_noop_scenario() {
    let ledger = ledger(2);
    let chain = ledger.chain();
    assert_eq!(chain.len(), 1);
    assert_eq!(chain[0].index, 0);
    assert!(chain[0].transactions.is_empty());

    ledger.submit_transaction(Transaction::new("A", "B", 10));
    assert_eq!(ledger.pending_transactions().len(), 1);

    assert_eq!(ledger.mine().index(), Some(1));
    let chain = ledger.chain();
    assert_eq!(chain.len(), 2);
    assert!(ledger.pending_transactions().is_empty());
    assert_eq!(chain[1].previous_hash, chain[0].hash());

    assert_eq!(ledger.mine(), MineOutcome::NoPendingTransactions);
    assert_eq!(ledger.chain_len(), 2);
}

#[test]
fn chains_built_by_mining_validate_for_lengths_1_through_20() {
    let ledger = ledger(2);
    assert!(validate_chain(&ledger.chain(), 2).is_ok());
    for len in 2..=20u64 {
        ledger.submit_transaction(Transaction::new("A", "B", len));
        assert_eq!(ledger.mine().index(), Some(len - 1));
        let chain = ledger.chain();
        assert_eq!(chain.len() as u64, len);
        assert!(validate_chain(&chain, 2).is_ok());
    }
    for (i, block) in ledger.chain().iter().enumerate() {
        assert_eq!(block.index, i as u64);
    }
}

#[test]
fn manual_mine_then_append_builds_valid_chain() {
    let ledger = ledger(3);
    for i in 1..=4u64 {
        let tip = ledger.last_block();
        let block = Block::new(i, vec![Transaction::new("A", "B", i)], tip.hash());
        let proof = mine(&block, 3, &CancelToken::new()).unwrap();
        assert!(hex::encode(proof.hash).starts_with("000"));
        ledger.append_block(block, proof.nonce).unwrap();
    }
    assert_eq!(ledger.chain_len(), 5);
    assert!(ledger.validate().is_ok());
}

#[test]
fn tampering_with_a_chained_block_is_detected() {
    let ledger = ledger(2);
    for i in 0..5 {
        ledger.submit_transaction(Transaction::new("A", "B", i));
        ledger.mine();
    }
    let chain = ledger.chain();
    assert!(validate_chain(&chain, 2).is_ok());

    // Every block with a successor is guarded by that successor's recorded link.
    // The tip has no successor: only its own proof of work catches an edit, with
    // probability about 1 - 16^-d, so it is left out of this exhaustive sweep.
    for i in 1..chain.len() - 1 {
        let mut tampered = chain.clone();
        tampered[i].transactions[0].recipient = "Mallory".to_string();
        assert!(validate_chain(&tampered, 2).is_err(), "tamper at {i} undetected");
    }
}

#[test]
fn stale_candidate_is_discarded_and_pool_kept() {
    let ledger = ledger(2);
    ledger.submit_transaction(Transaction::new("A", "B", 1));

    // A candidate built on genesis, raced by a block appended first.
    let genesis = ledger.last_block();
    let racer = Block::new(1, vec![Transaction::new("X", "Y", 1)], genesis.hash());
    let nonce = mine(&racer, 2, &CancelToken::new()).unwrap().nonce;
    let late = racer.clone();
    ledger.append_block(racer, nonce).unwrap();

    assert_eq!(
        ledger.append_block(late, nonce),
        Err(AppendError::StalePreviousHash { index: 1 })
    );
    assert_eq!(ledger.chain_len(), 2);
    assert_eq!(ledger.pending_transactions().len(), 1);
}

#[test]
fn concurrent_submissions_are_neither_lost_nor_duplicated() {
    let ledger = Arc::new(ledger(2));
    let total = 200u64;

    let submitter = {
        let ledger = Arc::clone(&ledger);
        thread::spawn(move || {
            for i in 0..total {
                ledger.submit_transaction(Transaction::new("A", "B", i));
            }
        })
    };
    while !submitter.is_finished() {
        ledger.mine();
    }
    submitter.join().unwrap();
    while ledger.mine() != MineOutcome::NoPendingTransactions {}

    let amounts: Vec<u64> = ledger
        .chain()
        .iter()
        .flat_map(|b| b.transactions.iter().filter_map(|t| t.amount.as_u64()))
        .collect();
    assert_eq!(amounts, (0..total).collect::<Vec<_>>());
    assert!(ledger.validate().is_ok());
}

#[test]
fn concurrent_miners_never_corrupt_the_chain() {
    let ledger = Arc::new(ledger(2));
    for i in 0..20 {
        ledger.submit_transaction(Transaction::new("A", "B", i));
    }

    let miners: Vec<_> = (0..4)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                let mut outcomes = Vec::new();
                for _ in 0..5 {
                    outcomes.push(ledger.mine());
                }
                outcomes
            })
        })
        .collect();

    for miner in miners {
        for outcome in miner.join().unwrap() {
            assert!(matches!(
                outcome,
                MineOutcome::Mined { .. }
                    | MineOutcome::NoPendingTransactions
                    | MineOutcome::Discarded(AppendError::StalePreviousHash { .. })
            ));
        }
    }

    while ledger.mine() != MineOutcome::NoPendingTransactions {}
    let included: usize = ledger.chain().iter().map(|b| b.transactions.len()).sum();
    assert_eq!(included, 20);
    assert!(ledger.validate().is_ok());
}
