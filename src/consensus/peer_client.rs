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

//! One long-lived outbound connection per configured peer.
//!
//! Mirrors the retry semantics called out in the design notes: the first
//! connection attempt retries forever on a fixed backoff and is not subject
//! to the consecutive-failure counter; once a connection has been
//! established at least once, any subsequent connect/send/recv failure
//! counts toward it, and two in a row permanently removes the peer from the
//! round barrier. A round that fails mid-query is retried against the same
//! height after reconnecting, rather than being skipped.

use std::sync::Arc;

use log::{info, warn};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::sleep;

use crate::block::Block;
use crate::config::NodeConfig;
use crate::error::NetworkError;
use crate::framing::{self, FramedConnection};
use crate::messages::Request;

use super::SharedConsensus;

pub struct PeerClient {
    index: usize,
    address: String,
    shared: Arc<SharedConsensus>,
    round_rx: watch::Receiver<u64>,
    config: NodeConfig,
}

impl PeerClient {
    pub fn new(
        index: usize,
        address: String,
        shared: Arc<SharedConsensus>,
        round_rx: watch::Receiver<u64>,
        config: NodeConfig,
    ) -> Self {
        Self {
            index,
            address,
            shared,
            round_rx,
            config,
        }
    }

    pub async fn run(mut self) {
        let mut armed = false;
        let mut consecutive_failures: u32 = 0;
        // Set when a round's query failed and must be retried against the
        // same height once reconnected, instead of waiting for a new round.
        let mut retry_idx: Option<u64> = None;

        'connection: loop {
            let stream = if armed {
                match TcpStream::connect(&self.address).await {
                    Ok(stream) => stream,
                    Err(err) => {
                        warn!(target: "consensus", "peer {} reconnect failed: {err}", self.address);
                        consecutive_failures += 1;
                        if consecutive_failures >= self.config.max_consecutive_failures {
                            self.give_up();
                            return;
                        }
                        continue 'connection;
                    }
                }
            } else {
                self.connect_with_indefinite_retry().await
            };

            if !armed {
                self.shared.record_round_response();
                armed = true;
                info!(target: "consensus", "connected to peer {}", self.address);
            }

            let mut conn = framing::frame(stream);

            loop {
                let idx = match retry_idx.take() {
                    Some(idx) => idx,
                    None => {
                        if self.round_rx.changed().await.is_err() {
                            return;
                        }
                        self.shared.current_idx().await
                    }
                };

                match self.query_once(&mut conn, idx).await {
                    Ok(()) => {
                        consecutive_failures = 0;
                        self.shared.record_round_response();
                    }
                    Err(err) => {
                        warn!(target: "consensus", "peer {} (#{}) query failed: {err}", self.address, self.index);
                        consecutive_failures += 1;
                        if consecutive_failures >= self.config.max_consecutive_failures {
                            self.give_up();
                            return;
                        }
                        retry_idx = Some(idx);
                        continue 'connection;
                    }
                }
            }
        }
    }

    async fn connect_with_indefinite_retry(&self) -> TcpStream {
        loop {
            match TcpStream::connect(&self.address).await {
                Ok(stream) => return stream,
                Err(err) => {
                    warn!(target: "consensus", "peer {} unreachable, retrying: {err}", self.address);
                    sleep(self.config.connect_retry_backoff).await;
                }
            }
        }
    }

    async fn query_once(&self, conn: &mut FramedConnection, idx: u64) -> Result<(), NetworkError> {
        let request = Request::Values(idx);
        framing::send_json(conn, &request).await?;
        let blocks: Vec<Block> = tokio::time::timeout(self.config.read_timeout, framing::recv_json(conn))
            .await
            .map_err(|_| NetworkError::Timeout)??;
        self.shared.merge_blocks(blocks).await;
        Ok(())
    }

    fn give_up(&self) {
        self.shared.remove_peer_from_barrier();
        info!(
            target: "consensus",
            "peer {} (#{}) permanently removed after {} consecutive failures",
            self.address, self.index, self.config.max_consecutive_failures
        );
    }
}
