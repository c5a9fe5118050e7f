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

//! Node configuration, assembled from CLI arguments.
//!
//! Flattened compared to the teacher's `NetworkConfiguration`/`NodeConfig`
//! split, since this system has far fewer knobs: one struct covers both the
//! wire-level timeouts and the node's own listen address.

use std::time::Duration;

/// Runtime configuration for a single node.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Host the peer server binds to.
    pub listen_host: String,
    /// Port the peer server binds to.
    pub listen_port: u16,
    /// `host:port` addresses of every other peer in the network.
    pub peers: Vec<String>,
    /// Backoff between connection attempts while a peer client has never
    /// connected successfully.
    pub connect_retry_backoff: Duration,
    /// Read timeout applied to an established peer-client connection.
    pub read_timeout: Duration,
    /// Consecutive round failures on an established connection before the
    /// peer client exits permanently.
    pub max_consecutive_failures: u32,
}

impl NodeConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.listen_host, self.listen_port)
    }

    /// `f`, the assumed maximum number of crashed peers, computed once at
    /// startup from the configured peer count.
    pub fn failure_bound(&self) -> usize {
        self.peers.len() / 2
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen_host: "0.0.0.0".to_string(),
            listen_port: 0,
            peers: Vec::new(),
            connect_retry_backoff: Duration::from_secs(2),
            read_timeout: Duration::from_secs(5),
            max_consecutive_failures: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_bound_is_integer_division_by_two() {
        let mut config = NodeConfig::default();
        config.peers = vec!["a".into(), "b".into(), "c".into()];
        assert_eq!(config.failure_bound(), 1);
        config.peers.push("d".into());
        assert_eq!(config.failure_bound(), 2);
    }
}
