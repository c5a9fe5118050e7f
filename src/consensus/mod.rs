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

//! The consensus engine: round-based agreement on the next block.
//!
//! The distilled spec describes this engine in terms of OS threads, two
//! condition variables, and a mutex. Per the design notes, this is
//! reimplemented as a set of Tokio tasks coordinated with async-native
//! primitives: a `watch` channel broadcasts round starts to every peer
//! client, a `Notify` wakes the engine on new work, and a small atomic
//! barrier tracks round completions. This eliminates the shared
//! `client_flags` array from the original design.

pub mod peer_client;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use log::{error, info, trace};
use tokio::sync::{watch, Mutex, Notify};

use crate::block::Block;
use crate::config::NodeConfig;
use crate::ledger::Ledger;
use peer_client::PeerClient;

/// The union of block proposals collected for the height currently being
/// decided, plus the bookkeeping needed to answer block requests.
#[derive(Default)]
struct ProposalSet {
    /// Proposals keyed by `current_hash`.
    blocks: HashMap<String, Block>,
    /// Height the engine is currently running rounds for.
    current_idx: u64,
    /// Highest height anyone (a peer request or the engine itself) has
    /// indicated exists.
    consensus_todo: u64,
}

/// Tracks how many of the `node_count` expected peers have completed the
/// current round (or the startup handshake). `node_count` shrinks when a
/// peer permanently drops out.
struct RoundBarrier {
    node_count: AtomicUsize,
    responses_count: AtomicUsize,
    notify: Notify,
}

impl RoundBarrier {
    fn new(node_count: usize) -> Self {
        Self {
            node_count: AtomicUsize::new(node_count),
            responses_count: AtomicUsize::new(0),
            notify: Notify::new(),
        }
    }

    fn reset(&self) {
        self.responses_count.store(0, Ordering::SeqCst);
    }

    fn node_count(&self) -> usize {
        self.node_count.load(Ordering::SeqCst)
    }

    /// Records that one more peer has responded (or connected, for the
    /// startup barrier), waking the engine if the barrier is now satisfied.
    fn record_response(&self) {
        let prev = self.responses_count.fetch_add(1, Ordering::SeqCst);
        if prev + 1 >= self.node_count() {
            self.notify.notify_one();
        }
    }

    /// Permanently removes a peer from the barrier's expected count.
    fn remove_peer(&self) {
        self.node_count.fetch_sub(1, Ordering::SeqCst);
        if self.responses_count.load(Ordering::SeqCst) >= self.node_count() {
            self.notify.notify_one();
        }
    }

    async fn wait_for_all(&self) {
        loop {
            let notified = self.notify.notified();
            if self.responses_count.load(Ordering::SeqCst) >= self.node_count() {
                return;
            }
            notified.await;
        }
    }
}

/// State shared between the engine and every peer client / server task.
pub struct SharedConsensus {
    ledger: Arc<Ledger>,
    set: Mutex<ProposalSet>,
    /// Wakes the engine when a transaction is admitted or a block request
    /// introduces a fresh proposal for a not-yet-started height.
    wakeup: Notify,
    /// Broadcasts a new round generation to every peer client.
    round_tx: watch::Sender<u64>,
    barrier: RoundBarrier,
}

impl SharedConsensus {
    fn new(ledger: Arc<Ledger>, node_count: usize) -> Arc<Self> {
        let (round_tx, _round_rx) = watch::channel(0u64);
        Arc::new(Self {
            ledger,
            set: Mutex::new(ProposalSet::default()),
            wakeup: Notify::new(),
            round_tx,
            barrier: RoundBarrier::new(node_count),
        })
    }

    fn subscribe_round(&self) -> watch::Receiver<u64> {
        self.round_tx.subscribe()
    }

    pub(crate) async fn current_idx(&self) -> u64 {
        self.set.lock().await.current_idx
    }

    /// Merges freshly received proposals into the current set, keyed by hash.
    pub(crate) async fn merge_blocks(&self, blocks: Vec<Block>) {
        let mut set = self.set.lock().await;
        for block in blocks {
            set.blocks.insert(block.current_hash.clone(), block);
        }
    }

    pub(crate) fn record_round_response(&self) {
        self.barrier.record_response();
    }

    pub(crate) fn remove_peer_from_barrier(&self) {
        self.barrier.remove_peer();
    }

    /// Wakes the engine after a transaction has been admitted to the pool.
    /// Called by the peer server's transaction handler, never by the ledger
    /// itself, keeping the ledger independent of consensus.
    pub fn notify_new_transaction(&self) {
        self.wakeup.notify_one();
    }

    /// Implements the block-request algorithm (spec §4.3), executed "under
    /// the consensus lock": the whole read-modify-maybe-propose sequence
    /// runs while holding `self.set`'s lock, and may itself acquire the
    /// ledger lock (consensus → ledger is the only permitted lock order).
    pub async fn handle_values_request(&self, idx: u64) -> Vec<Block> {
        let mut set = self.set.lock().await;
        set.consensus_todo = set.consensus_todo.max(idx);

        let chain_len = self.ledger.chain_len().await;
        if idx < chain_len {
            return match self.ledger.get_block(idx).await {
                Ok(block) => vec![block],
                Err(err) => {
                    error!(target: "consensus", "block {idx} reported in range but missing: {err}");
                    Vec::new()
                }
            };
        }
        if idx == chain_len {
            if set.current_idx < idx {
                let block = self.ledger.propose_block().await;
                set.blocks.insert(block.current_hash.clone(), block.clone());
                self.wakeup.notify_one();
                return vec![block];
            }
            return set.blocks.values().cloned().collect();
        }
        Vec::new()
    }
}

/// Drives the round-based consensus algorithm for one node.
pub struct ConsensusEngine {
    ledger: Arc<Ledger>,
    config: NodeConfig,
    shared: Arc<SharedConsensus>,
}

impl ConsensusEngine {
    /// Builds the engine and the state it shares with peer clients and the
    /// peer server's block-request handler.
    pub fn new(ledger: Arc<Ledger>, config: NodeConfig) -> (Self, Arc<SharedConsensus>) {
        let shared = SharedConsensus::new(ledger.clone(), config.peers.len());
        let engine = Self {
            ledger,
            config,
            shared: shared.clone(),
        };
        (engine, shared)
    }

    /// Runs the engine forever: the startup barrier, then the round phase.
    pub async fn run(self) {
        let f = self.config.failure_bound();

        for (index, address) in self.config.peers.iter().enumerate() {
            let client = PeerClient::new(
                index,
                address.clone(),
                self.shared.clone(),
                self.shared.subscribe_round(),
                self.config.clone(),
            );
            tokio::spawn(client.run());
        }

        self.shared.barrier.wait_for_all().await;
        info!(target: "consensus", "all {} configured peers reachable", self.config.peers.len());

        loop {
            self.wait_for_work().await;

            let chain_len = self.ledger.chain_len().await;
            {
                let mut set = self.shared.set.lock().await;
                set.current_idx = chain_len;
                if set.blocks.is_empty() && !self.ledger.pool_is_empty().await {
                    let block = self.ledger.propose_block().await;
                    info!(target: "consensus", "created block proposal {}", block.current_hash);
                    set.blocks.insert(block.current_hash.clone(), block);
                }
                set.consensus_todo = set.consensus_todo.max(chain_len);
            }

            for round in 0..=f {
                self.shared.barrier.reset();
                self.shared.round_tx.send_modify(|generation| *generation = generation.wrapping_add(1));
                trace!(target: "consensus", "round {round}/{f} at height {chain_len} started");
                self.shared.barrier.wait_for_all().await;
            }

            let winner = {
                let mut set = self.shared.set.lock().await;
                let winner = set
                    .blocks
                    .values()
                    .filter(|block| !block.transactions.is_empty())
                    .min_by(|a, b| a.current_hash.cmp(&b.current_hash))
                    .cloned();
                set.blocks.clear();
                winner
            };

            if let Some(block) = winner {
                let hash = block.current_hash.clone();
                match self.ledger.add_block(block).await {
                    Ok(()) => info!(target: "consensus", "committed block {hash}"),
                    Err(err) => error!(target: "consensus", "refused to commit block {hash}: {err}"),
                }
            }
        }
    }

    async fn wait_for_work(&self) {
        loop {
            let notified = self.shared.wakeup.notified();
            let chain_len = self.ledger.chain_len().await;
            let todo = self.shared.set.lock().await.consensus_todo;
            if !self.ledger.pool_is_empty().await || todo > chain_len {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn barrier_is_satisfied_once_every_peer_responds() {
        let barrier = RoundBarrier::new(3);
        barrier.record_response();
        barrier.record_response();
        assert!(timeout(Duration::from_millis(50), barrier.wait_for_all())
            .await
            .is_err());
        barrier.record_response();
        timeout(Duration::from_millis(50), barrier.wait_for_all())
            .await
            .expect("barrier satisfied after third response");
    }

    #[tokio::test]
    async fn removing_a_peer_can_satisfy_an_already_waiting_barrier() {
        let barrier = RoundBarrier::new(3);
        barrier.record_response();
        barrier.record_response();
        // Two of three responded; the third peer crashes instead of
        // responding. Dropping the expected count to match should unblock
        // the engine without it ever seeing a third response.
        barrier.remove_peer();
        assert_eq!(barrier.node_count(), 2);
        timeout(Duration::from_millis(50), barrier.wait_for_all())
            .await
            .expect("barrier satisfied once node_count drops to match responses");
    }

    #[tokio::test]
    async fn reset_clears_responses_for_the_next_round() {
        let barrier = RoundBarrier::new(1);
        barrier.record_response();
        timeout(Duration::from_millis(50), barrier.wait_for_all())
            .await
            .expect("single-peer barrier satisfied immediately");
        barrier.reset();
        assert!(timeout(Duration::from_millis(50), barrier.wait_for_all())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn handle_values_request_proposes_once_per_height() {
        let ledger = Arc::new(Ledger::new());
        let shared = SharedConsensus::new(ledger.clone(), 1);

        let first = shared.handle_values_request(1).await;
        assert_eq!(first.len(), 1);
        let second = shared.handle_values_request(1).await;
        assert_eq!(second.len(), 1);
        assert_eq!(first[0].current_hash, second[0].current_hash);
    }

    #[tokio::test]
    async fn handle_values_request_returns_committed_block_below_chain_len() {
        let ledger = Arc::new(Ledger::new());
        let shared = SharedConsensus::new(ledger.clone(), 1);
        let genesis = shared.handle_values_request(0).await;
        assert_eq!(genesis.len(), 1);
        assert_eq!(genesis[0].index, 0);
    }
}
