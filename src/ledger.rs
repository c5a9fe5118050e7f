// Copyright 2026 The Ledger Node Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The ledger: committed chain, transaction pool, and nonce map behind a
//! single mutex.
//!
//! All three pieces of state are protected as one atomic unit by a single
//! `tokio::sync::Mutex`, per the single-writer discipline described in the
//! design notes: splitting the lock risks breaking the pool/nonce-map
//! invariants that `add_block` and `add_transaction` depend on.

use log::info;
use tokio::sync::Mutex;

use crate::block::Block;
use crate::crypto::genesis_hash;
use crate::error::{LedgerError, TransactionError};
use crate::transaction::{validate_transaction, NonceMap, Transaction};

struct LedgerState {
    blocks: Vec<Block>,
    pool: Vec<Transaction>,
    nonce_map: NonceMap,
}

impl LedgerState {
    fn genesis() -> Self {
        let genesis = Block::new(0, Vec::new(), genesis_hash());
        Self {
            blocks: vec![genesis],
            pool: Vec::new(),
            nonce_map: NonceMap::new(),
        }
    }
}

/// The in-memory replicated ledger.
pub struct Ledger {
    state: Mutex<LedgerState>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Creates a ledger seeded with the genesis block.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState::genesis()),
        }
    }

    /// Snapshots the pool and builds (but does not append) the next block.
    ///
    /// The snapshot (pool contents, chain length, last hash) is taken while
    /// the lock is held and hashed from that owned snapshot after releasing
    /// it, which is safe precisely because the snapshot no longer aliases the
    /// locked state.
    pub async fn propose_block(&self) -> Block {
        let (index, transactions, previous_hash) = {
            let state = self.state.lock().await;
            (
                state.blocks.len() as u64,
                state.pool.clone(),
                state
                    .blocks
                    .last()
                    .expect("chain always has at least the genesis block")
                    .current_hash
                    .clone(),
            )
        };
        Block::new(index, transactions, previous_hash)
    }

    /// Appends `block` to the chain, pruning the pool and raising the nonce
    /// map for every sender the block touches.
    ///
    /// Rejects `block` if its `index`/`previous_hash` do not match the
    /// current chain head (the defensive check called out in the design
    /// notes): the original source trusted these blindly.
    pub async fn add_block(&self, block: Block) -> Result<(), LedgerError> {
        let mut state = self.state.lock().await;

        let expected_index = state.blocks.len() as u64;
        if block.index != expected_index {
            return Err(LedgerError::IndexMismatch {
                got: block.index,
                expected: expected_index,
            });
        }
        let expected_prev = &state
            .blocks
            .last()
            .expect("chain always has at least the genesis block")
            .current_hash;
        if &block.previous_hash != expected_prev {
            return Err(LedgerError::PreviousHashMismatch {
                got: block.previous_hash.clone(),
                expected: expected_prev.clone(),
            });
        }

        let mut max_nonces: Vec<(&str, i64)> = Vec::new();
        for tx in &block.transactions {
            match max_nonces.iter_mut().find(|(s, _)| *s == tx.sender) {
                Some((_, n)) if *n < tx.nonce => *n = tx.nonce,
                Some(_) => {}
                None => max_nonces.push((&tx.sender, tx.nonce)),
            }
        }

        state.pool.retain(|tx| {
            let max_for_sender = max_nonces
                .iter()
                .find(|(s, _)| *s == tx.sender)
                .map(|(_, n)| *n);
            !matches!(max_for_sender, Some(max_nonce) if tx.nonce <= max_nonce)
        });

        for (sender, nonce) in max_nonces {
            let entry = state.nonce_map.entry(sender.to_string()).or_insert(-1);
            if *entry < nonce {
                *entry = nonce;
            }
        }

        let hash = block.current_hash.clone();
        state.blocks.push(block);
        info!(target: "ledger", "appended block {hash} at height {}", state.blocks.len() - 1);
        Ok(())
    }

    /// Validates and admits a raw transaction string to the pool.
    pub async fn add_transaction(&self, raw: &str) -> Result<(), TransactionError> {
        let mut state = self.state.lock().await;
        let tx = validate_transaction(raw, &state.nonce_map)?;
        state
            .nonce_map
            .insert(tx.sender.clone(), tx.nonce);
        log::info!(target: "ledger", "admitted transaction {} into the pool", tx.signature);
        state.pool.push(tx);
        Ok(())
    }

    /// The most recently committed block.
    pub async fn last_block(&self) -> Block {
        let state = self.state.lock().await;
        state
            .blocks
            .last()
            .expect("chain always has at least the genesis block")
            .clone()
    }

    /// The committed block at `index`, or an error if `index` is out of range.
    pub async fn get_block(&self, index: u64) -> Result<Block, LedgerError> {
        let state = self.state.lock().await;
        state
            .blocks
            .get(index as usize)
            .cloned()
            .ok_or(LedgerError::BlockIndexOutOfRange {
                requested: index,
                chain_len: state.blocks.len() as u64,
            })
    }

    /// Number of committed blocks, including genesis.
    pub async fn chain_len(&self) -> u64 {
        self.state.lock().await.blocks.len() as u64
    }

    /// Number of transactions currently in the pool.
    pub async fn pool_size(&self) -> usize {
        self.state.lock().await.pool.len()
    }

    /// Whether the pool currently holds any transaction.
    pub async fn pool_is_empty(&self) -> bool {
        self.pool_size().await == 0
    }

    /// A snapshot of the pool's current contents, in admission order.
    pub async fn pool_snapshot(&self) -> Vec<Transaction> {
        self.state.lock().await.pool.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};
    use pretty_assertions::assert_eq;
    use rand::rngs::OsRng;

    fn signed_raw(message: &str, nonce: i64) -> (String, String) {
        let mut csprng = OsRng;
        let signing_key = SigningKey::generate(&mut csprng);
        let sender = hex::encode(signing_key.verifying_key().to_bytes());
        let bytes = crate::crypto::signing_bytes(&sender, message, nonce);
        let signature = hex::encode(signing_key.sign(&bytes).to_bytes());
        let raw = serde_json::json!({
            "sender": sender, "message": message, "nonce": nonce, "signature": signature,
        })
        .to_string();
        (sender, raw)
    }

    #[tokio::test]
    async fn genesis_block_has_zero_hash_and_index() {
        let ledger = Ledger::new();
        let genesis = ledger.last_block().await;
        assert_eq!(genesis.index, 0);
        assert_eq!(genesis.previous_hash, genesis_hash());
        assert!(genesis.transactions.is_empty());
    }

    #[tokio::test]
    async fn pool_snapshot_reflects_admission_order_and_is_independent_of_the_pool() {
        let ledger = Ledger::new();
        assert!(ledger.pool_snapshot().await.is_empty());

        let (_, first) = signed_raw("first", 0);
        let (_, second) = signed_raw("second", 0);
        ledger.add_transaction(&first).await.unwrap();
        ledger.add_transaction(&second).await.unwrap();

        let snapshot = ledger.pool_snapshot().await;
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].message, "first");
        assert_eq!(snapshot[1].message, "second");
    }

    #[tokio::test]
    async fn add_transaction_then_propose_and_commit() {
        let ledger = Ledger::new();
        let (_, raw) = signed_raw("hi", 0);
        ledger.add_transaction(&raw).await.unwrap();
        assert_eq!(ledger.pool_size().await, 1);

        let block = ledger.propose_block().await;
        assert_eq!(block.index, 1);
        assert_eq!(block.transactions.len(), 1);

        ledger.add_block(block).await.unwrap();
        assert_eq!(ledger.chain_len().await, 2);
        assert_eq!(ledger.pool_size().await, 0, "committed tx is pruned from the pool");
    }

    #[tokio::test]
    async fn add_block_prunes_superseded_pool_entries() {
        let ledger = Ledger::new();
        let mut csprng = OsRng;
        let signing_key = SigningKey::generate(&mut csprng);
        let sender = hex::encode(signing_key.verifying_key().to_bytes());

        for nonce in 0..3 {
            let bytes = crate::crypto::signing_bytes(&sender, "m", nonce);
            let signature = hex::encode(signing_key.sign(&bytes).to_bytes());
            let raw = serde_json::json!({
                "sender": sender, "message": "m", "nonce": nonce, "signature": signature,
            })
            .to_string();
            ledger.add_transaction(&raw).await.unwrap();
        }
        assert_eq!(ledger.pool_size().await, 3);

        // Commit a block containing only nonce 1; nonces 0 and 1 must be pruned,
        // nonce 2 survives.
        let block = Block::new(
            1,
            vec![Transaction {
                sender: sender.clone(),
                message: "m".into(),
                nonce: 1,
                signature: "ignored".into(),
            }],
            ledger.last_block().await.current_hash,
        );
        ledger.add_block(block).await.unwrap();
        assert_eq!(ledger.pool_size().await, 1);
    }

    #[tokio::test]
    async fn add_block_rejects_index_mismatch() {
        let ledger = Ledger::new();
        let bad = Block::new(5, Vec::new(), ledger.last_block().await.current_hash);
        let err = ledger.add_block(bad).await.unwrap_err();
        assert!(matches!(err, LedgerError::IndexMismatch { .. }));
    }

    #[tokio::test]
    async fn add_block_rejects_previous_hash_mismatch() {
        let ledger = Ledger::new();
        let bad = Block::new(1, Vec::new(), "not-the-real-hash".to_string());
        let err = ledger.add_block(bad).await.unwrap_err();
        assert!(matches!(err, LedgerError::PreviousHashMismatch { .. }));
    }

    #[tokio::test]
    async fn get_block_out_of_range_is_an_error() {
        let ledger = Ledger::new();
        let err = ledger.get_block(99).await.unwrap_err();
        assert!(matches!(err, LedgerError::BlockIndexOutOfRange { .. }));
    }

    #[tokio::test]
    async fn previous_hash_chains_correctly() {
        let ledger = Ledger::new();
        let genesis_hash = ledger.last_block().await.current_hash;
        let block1 = ledger.propose_block().await;
        assert_eq!(block1.previous_hash, genesis_hash);
        ledger.add_block(block1.clone()).await.unwrap();

        let block2 = ledger.propose_block().await;
        assert_eq!(block2.previous_hash, block1.current_hash);
        assert_eq!(block2.index, 2);
    }
}
