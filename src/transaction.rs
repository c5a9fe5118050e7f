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

//! Transaction type and the five-step validation pipeline.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::crypto::{signing_bytes, verify_signature};
use crate::error::TransactionError;

/// Per-sender highest accepted nonce. Senders absent from the map are treated
/// as having nonce `-1`.
pub type NonceMap = HashMap<String, i64>;

/// An immutable, admitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub message: String,
    pub nonce: i64,
    pub signature: String,
}

fn last_nonce(nonce_map: &NonceMap, sender: &str) -> i64 {
    nonce_map.get(sender).copied().unwrap_or(-1)
}

fn validate_sender(sender: &str) -> bool {
    sender.len() == 64 && sender.chars().all(|c| c.is_ascii_hexdigit())
}

/// Validates a raw JSON transaction string against the current nonce map.
///
/// Checks run in order and stop at the first failure, per the five steps
/// described in the spec: JSON shape, sender, message, nonce, signature.
/// Does not mutate `nonce_map`; the caller (the ledger, under its lock) is
/// responsible for raising the sender's nonce on success.
pub fn validate_transaction(
    raw: &str,
    nonce_map: &NonceMap,
) -> Result<Transaction, TransactionError> {
    let value: Value = serde_json::from_str(raw).map_err(|_| TransactionError::InvalidJson)?;
    let obj = value.as_object().ok_or(TransactionError::InvalidJson)?;

    let sender = obj
        .get("sender")
        .and_then(Value::as_str)
        .filter(|s| validate_sender(s))
        .ok_or(TransactionError::InvalidSender)?
        .to_string();

    let message = obj
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .ok_or(TransactionError::InvalidMessage)?
        .to_string();

    let nonce = obj
        .get("nonce")
        .and_then(Value::as_i64)
        .filter(|n| *n > last_nonce(nonce_map, &sender))
        .ok_or(TransactionError::InvalidNonce)?;

    let signature = obj
        .get("signature")
        .and_then(Value::as_str)
        .ok_or(TransactionError::InvalidSignature)?
        .to_string();

    let bytes = signing_bytes(&sender, &message, nonce);
    verify_signature(&sender, &signature, &bytes)?;

    Ok(Transaction {
        sender,
        message,
        nonce,
        signature,
    })
}
