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

//! Canonical serialization, hashing, and Ed25519 signature helpers.
//!
//! Every hash and signature in this crate is computed over compact JSON with
//! lexicographically sorted keys. `serde_json::Value` objects are backed by a
//! `BTreeMap` as long as the `preserve_order` feature is not enabled (it isn't,
//! see `Cargo.toml`), so converting any serializable value `to_value` and back
//! `to_vec` already yields the canonical byte string — no hand-rolled key sort
//! is needed.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::Serialize;
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::error::TransactionError;

/// `previous_hash` of the genesis block: 64 `'0'` characters.
pub fn genesis_hash() -> String {
    "0".repeat(64)
}

/// Hex-encoded SHA-256 digest of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(digest)
}

/// Canonical bytes of `{sender, message, nonce}`, the signature input.
pub fn signing_bytes(sender: &str, message: &str, nonce: i64) -> Vec<u8> {
    let value = json!({
        "sender": sender,
        "message": message,
        "nonce": nonce,
    });
    // `to_vec` on a `Value` never fails.
    serde_json::to_vec(&value).expect("serializing a json::Value cannot fail")
}

/// Canonical bytes of `{index, transactions, previous_hash}`, the block hash input.
///
/// `transactions` must already be in canonical (sorted-key, compact) form when
/// serialized, which holds for any `T: Serialize` value passed here as long as
/// its own fields contain no floating point NaNs/Infs (JSON has no encoding
/// for those; `serde_json` rejects them).
pub fn block_hash_bytes<T: Serialize>(index: u64, transactions: &[T], previous_hash: &str) -> Vec<u8> {
    let value = json!({
        "index": index,
        "transactions": transactions,
        "previous_hash": previous_hash,
    });
    serde_json::to_vec(&value).expect("serializing a json::Value cannot fail")
}

/// Decodes `sender` as a 32-byte Ed25519 public key and `signature` as a
/// 64-byte Ed25519 signature, then verifies `signature` over `message`.
pub fn verify_signature(
    sender_hex: &str,
    signature_hex: &str,
    message: &[u8],
) -> Result<(), TransactionError> {
    let key_bytes =
        hex::decode(sender_hex).map_err(|_| TransactionError::InvalidSignature)?;
    let key_bytes: [u8; 32] = key_bytes
        .try_into()
        .map_err(|_| TransactionError::InvalidSignature)?;
    let verifying_key =
        VerifyingKey::from_bytes(&key_bytes).map_err(|_| TransactionError::InvalidSignature)?;

    let sig_bytes = hex::decode(signature_hex).map_err(|_| TransactionError::InvalidSignature)?;
    let sig_bytes: [u8; 64] = sig_bytes
        .try_into()
        .map_err(|_| TransactionError::InvalidSignature)?;
    let signature = Signature::from_bytes(&sig_bytes);

    verifying_key
        .verify(message, &signature)
        .map_err(|_| TransactionError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{SigningKey, Signer};
    use rand::rngs::OsRng;

    #[test]
    fn genesis_hash_is_64_zeros() {
        let h = genesis_hash();
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c == '0'));
    }

    #[test]
    fn sha256_hex_is_deterministic() {
        assert_eq!(sha256_hex(b"hello"), sha256_hex(b"hello"));
        assert_ne!(sha256_hex(b"hello"), sha256_hex(b"world"));
    }

    #[test]
    fn signing_bytes_are_key_order_independent_of_struct() {
        let a = signing_bytes("abc", "hi", 1);
        let b = signing_bytes("abc", "hi", 1);
        assert_eq!(a, b);
        // sorted keys: message, nonce, sender
        let s = String::from_utf8(a).unwrap();
        assert!(s.find("message").unwrap() < s.find("nonce").unwrap());
        assert!(s.find("nonce").unwrap() < s.find("sender").unwrap());
    }

    #[test]
    fn round_trip_sign_and_verify() {
        let mut csprng = OsRng;
        let signing_key = SigningKey::generate(&mut csprng);
        let sender = hex::encode(signing_key.verifying_key().to_bytes());
        let bytes = signing_bytes(&sender, "hello", 0);
        let signature = signing_key.sign(&bytes);
        let sig_hex = hex::encode(signature.to_bytes());
        assert!(verify_signature(&sender, &sig_hex, &bytes).is_ok());
    }

    #[test]
    fn tampered_message_fails_verification() {
        let mut csprng = OsRng;
        let signing_key = SigningKey::generate(&mut csprng);
        let sender = hex::encode(signing_key.verifying_key().to_bytes());
        let bytes = signing_bytes(&sender, "hello", 0);
        let signature = signing_key.sign(&bytes);
        let sig_hex = hex::encode(signature.to_bytes());
        let tampered = signing_bytes(&sender, "goodbye", 0);
        assert!(verify_signature(&sender, &sig_hex, &tampered).is_err());
    }
}
