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

//! Accept loop and per-connection request dispatch.
//!
//! One task per accepted connection, as in the teacher's `events::network`
//! listener. A frame that fails to decode as JSON (or decodes to something
//! other than a known request shape) is logged and skipped; the connection
//! keeps serving subsequent frames. Only an actual I/O failure — a read
//! error, a timeout, or the peer closing the socket — ends the connection.

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::net::TcpListener;

use crate::config::NodeConfig;
use crate::consensus::SharedConsensus;
use crate::error::NetworkError;
use crate::framing::{self, FramedConnection};
use crate::ledger::Ledger;
use crate::messages::{Request, TransactionResponse};

/// Binds the listen address and serves connections until the process exits.
pub async fn run_server(
    config: NodeConfig,
    ledger: Arc<Ledger>,
    shared: Arc<SharedConsensus>,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(config.listen_addr()).await?;
    info!(target: "network", "listening on {}", config.listen_addr());

    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let ledger = ledger.clone();
        let shared = shared.clone();
        tokio::spawn(async move {
            debug!(target: "network", "accepted connection from {peer_addr}");
            let mut conn = framing::frame(stream);
            if let Err(err) = serve_connection(&mut conn, &ledger, &shared).await {
                warn!(target: "network", "connection from {peer_addr} closed: {err}");
            }
        });
    }
}

async fn serve_connection(
    conn: &mut FramedConnection,
    ledger: &Ledger,
    shared: &SharedConsensus,
) -> Result<(), NetworkError> {
    loop {
        let request: Request = match framing::recv_json(conn).await {
            Ok(request) => request,
            Err(NetworkError::Decode(err)) => {
                warn!(target: "network", "dropping malformed frame: {err}");
                continue;
            }
            Err(err) => return Err(err),
        };
        match request {
            Request::Transaction(payload) => {
                let raw = payload.to_string();
                let accepted = match ledger.add_transaction(&raw).await {
                    Ok(()) => {
                        shared.notify_new_transaction();
                        true
                    }
                    Err(err) => {
                        debug!(target: "network", "rejected transaction: {err}");
                        false
                    }
                };
                framing::send_json(conn, &TransactionResponse { response: accepted }).await?;
            }
            Request::Values(idx) => {
                let blocks = shared.handle_values_request(idx).await;
                framing::send_json(conn, &blocks).await?;
            }
        }
    }
}
