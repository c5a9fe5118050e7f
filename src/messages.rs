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

//! Wire message shapes exchanged over the framed TCP transport.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An inbound request, as decoded from a single frame.
///
/// `{"type": "transaction", "payload": {...}}` or
/// `{"type": "values", "payload": <int>}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum Request {
    Transaction(Value),
    Values(u64),
}

/// Response to a `transaction` request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub response: bool,
}
