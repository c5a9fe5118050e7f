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

//! Error types shared across the crate.
//!
//! Each layer gets its own `thiserror`-derived enum rather than one catch-all,
//! following the teacher's convention of small, composable error types linked
//! with `#[from]`.

use thiserror::Error;

/// Why a raw transaction string failed admission to the ledger.
///
/// The five kinds mirror the five validation steps in order; only the first
/// failing step is ever reported.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TransactionError {
    #[error("transaction payload is not a valid JSON object")]
    InvalidJson,
    #[error("sender is not 64 hex characters")]
    InvalidSender,
    #[error("message is empty or not a string")]
    InvalidMessage,
    #[error("nonce is not an integer greater than the sender's last accepted nonce")]
    InvalidNonce,
    #[error("signature does not verify under the sender's public key")]
    InvalidSignature,
}

/// Errors raised by `Ledger` operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("block index {requested} is out of range (chain length {chain_len})")]
    BlockIndexOutOfRange { requested: u64, chain_len: u64 },

    #[error("block index {got} does not match expected chain length {expected}")]
    IndexMismatch { got: u64, expected: u64 },

    #[error("block previous_hash {got} does not match current head hash {expected}")]
    PreviousHashMismatch { got: String, expected: String },
}

/// Errors raised while a peer client or peer server handles the wire protocol.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame did not decode as JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("read timed out")]
    Timeout,

    #[error("connection closed by peer")]
    ConnectionClosed,
}
