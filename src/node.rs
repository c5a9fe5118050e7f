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

//! Composes the ledger, consensus engine, and peer server into one running
//! node.

use std::sync::Arc;

use log::error;

use crate::config::NodeConfig;
use crate::consensus::ConsensusEngine;
use crate::ledger::Ledger;
use crate::network::run_server;

/// A single node: owns the ledger, drives consensus, and serves peers.
pub struct Node {
    config: NodeConfig,
    ledger: Arc<Ledger>,
}

impl Node {
    pub fn new(config: NodeConfig) -> Self {
        Self {
            config,
            ledger: Arc::new(Ledger::new()),
        }
    }

    /// Runs the node until the process is terminated: the peer server and
    /// the consensus engine run concurrently, each as its own task.
    pub async fn run(self) {
        let (engine, shared) = ConsensusEngine::new(self.ledger.clone(), self.config.clone());

        let server_config = self.config.clone();
        let server_ledger = self.ledger.clone();
        let server_shared = shared.clone();
        let server = tokio::spawn(async move {
            if let Err(err) = run_server(server_config, server_ledger, server_shared).await {
                error!(target: "network", "peer server exited: {err}");
            }
        });

        let engine_task = tokio::spawn(engine.run());

        let _ = tokio::join!(server, engine_task);
    }
}
