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

//! CLI entry point: parses arguments, assembles `NodeConfig`, and runs a node.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use ledger_node::config::NodeConfig;
use ledger_node::node::Node;
use ledger_node::peer_list::parse_node_list;
use log::error;

/// A node in a small replicated ledger network.
#[derive(Debug, Parser)]
#[command(name = "ledger-node", about = "Round-based consensus over a framed TCP transport")]
struct Cli {
    /// Port this node's peer server listens on.
    #[arg(short, long)]
    port: u16,

    /// Host this node's peer server binds to.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Path to a newline-delimited `host:port` file listing every other peer.
    #[arg(short = 'l', long = "node-list")]
    node_list: PathBuf,

    /// Seconds to wait between connection attempts to an unreachable peer.
    #[arg(long, default_value_t = 2)]
    connect_retry_secs: u64,

    /// Seconds to wait for a peer's response before counting it as a failure.
    #[arg(long, default_value_t = 5)]
    read_timeout_secs: u64,

    /// Enables verbose (debug-level) logging.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let peers = match parse_node_list(&cli.node_list) {
        Ok(peers) => peers,
        Err(err) => {
            error!("failed to read node list {}: {err:#}", cli.node_list.display());
            std::process::exit(1);
        }
    };

    let config = NodeConfig {
        listen_host: cli.host,
        listen_port: cli.port,
        peers,
        connect_retry_backoff: Duration::from_secs(cli.connect_retry_secs),
        read_timeout: Duration::from_secs(cli.read_timeout_secs),
        ..NodeConfig::default()
    };

    Node::new(config).run().await;
}
