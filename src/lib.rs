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

//! A small replicated ledger: round-based consensus over a framed TCP
//! transport.

pub mod block;
pub mod config;
pub mod consensus;
pub mod crypto;
pub mod error;
pub mod framing;
pub mod ledger;
pub mod messages;
pub mod network;
pub mod node;
pub mod peer_list;
pub mod transaction;
