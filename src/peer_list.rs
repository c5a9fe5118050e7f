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

//! Reads the newline-delimited `host:port` peer list file.

use std::path::Path;

use anyhow::{bail, Context, Result};

/// Parses a peer-list file into `host:port` address strings.
///
/// Blank lines are skipped. Each non-blank line must contain exactly one
/// `:` separating a host from a numeric port; resolution (including DNS) is
/// deferred to connection time, matching `tokio::net::TcpStream::connect`'s
/// own `ToSocketAddrs` handling of `"host:port"` strings.
pub fn parse_node_list(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading peer list file {}", path.display()))?;

    let mut peers = Vec::new();
    for (line_no, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((host, port)) = line.rsplit_once(':') else {
            bail!("peer list line {}: expected `host:port`, got {line:?}", line_no + 1);
        };
        if host.is_empty() {
            bail!("peer list line {}: empty host in {line:?}", line_no + 1);
        }
        port.parse::<u16>()
            .with_context(|| format!("peer list line {}: invalid port in {line:?}", line_no + 1))?;
        peers.push(line.to_string());
    }
    Ok(peers)
}
