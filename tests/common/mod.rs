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

//! Shared helpers for the multi-node integration tests: reserving loopback
//! ports, building signed transactions, and issuing raw framed requests
//! against a running node.

use ed25519_dalek::{Signer, SigningKey};
use ledger_node::block::Block;
use ledger_node::crypto::signing_bytes;
use ledger_node::framing;
use ledger_node::messages::{Request, TransactionResponse};
use rand::rngs::OsRng;
use std::net::TcpListener as StdTcpListener;
use tokio::net::TcpStream;

pub fn free_port() -> u16 {
    StdTcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

pub fn signed_transaction(message: &str, nonce: i64) -> serde_json::Value {
    let mut csprng = OsRng;
    let signing_key = SigningKey::generate(&mut csprng);
    let sender = hex::encode(signing_key.verifying_key().to_bytes());
    let bytes = signing_bytes(&sender, message, nonce);
    let signature = hex::encode(signing_key.sign(&bytes).to_bytes());
    serde_json::json!({
        "sender": sender,
        "message": message,
        "nonce": nonce,
        "signature": signature,
    })
}

pub async fn submit(addr: &str, payload: serde_json::Value) -> bool {
    let stream = TcpStream::connect(addr).await.unwrap();
    let mut conn = framing::frame(stream);
    framing::send_json(&mut conn, &Request::Transaction(payload))
        .await
        .unwrap();
    let response: TransactionResponse = framing::recv_json(&mut conn).await.unwrap();
    response.response
}

pub async fn query_values(addr: &str, idx: u64) -> Vec<Block> {
    let stream = TcpStream::connect(addr).await.unwrap();
    let mut conn = framing::frame(stream);
    framing::send_json(&mut conn, &Request::Values(idx)).await.unwrap();
    framing::recv_json(&mut conn).await.unwrap()
}
