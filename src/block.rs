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

//! Block type and its hash.

use serde::{Deserialize, Serialize};

use crate::crypto::{block_hash_bytes, sha256_hex};
use crate::transaction::Transaction;

/// An immutable, committed (or proposed) block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub transactions: Vec<Transaction>,
    pub previous_hash: String,
    pub current_hash: String,
}

impl Block {
    /// Builds a block from its three content fields and computes `current_hash`.
    pub fn new(index: u64, transactions: Vec<Transaction>, previous_hash: String) -> Self {
        let current_hash = sha256_hex(&block_hash_bytes(index, &transactions, &previous_hash));
        Self {
            index,
            transactions,
            previous_hash,
            current_hash,
        }
    }

    /// Highest nonce used by `sender` within this block's transactions, if any.
    pub fn max_nonce_for(&self, sender: &str) -> Option<i64> {
        self.transactions
            .iter()
            .filter(|tx| tx.sender == sender)
            .map(|tx| tx.nonce)
            .max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(sender: &str, nonce: i64) -> Transaction {
        Transaction {
            sender: sender.to_string(),
            message: "m".to_string(),
            nonce,
            signature: "00".to_string(),
        }
    }

    #[test]
    fn hash_is_deterministic_function_of_content() {
        let a = Block::new(0, vec![tx("s", 0)], "prev".to_string());
        let b = Block::new(0, vec![tx("s", 0)], "prev".to_string());
        assert_eq!(a.current_hash, b.current_hash);
    }

    #[test]
    fn hash_changes_with_content() {
        let a = Block::new(0, vec![tx("s", 0)], "prev".to_string());
        let b = Block::new(1, vec![tx("s", 0)], "prev".to_string());
        assert_ne!(a.current_hash, b.current_hash);
    }

    #[test]
    fn max_nonce_for_picks_the_maximum() {
        let block = Block::new(0, vec![tx("s", 1), tx("s", 5), tx("other", 9)], "p".into());
        assert_eq!(block.max_nonce_for("s"), Some(5));
        assert_eq!(block.max_nonce_for("other"), Some(9));
        assert_eq!(block.max_nonce_for("nobody"), None);
    }
}
