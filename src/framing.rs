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

//! The length-prefixed framing primitive.
//!
//! The distilled spec treats framing as an external interface (§6): a fixed
//! width, big-endian length header followed by a UTF-8 JSON payload. This
//! crate supplies a concrete instance of that interface built on
//! `tokio_util::codec::LengthDelimitedCodec` rather than hand-rolling a
//! length-prefix reader/writer, matching how the teacher builds its framed
//! transport (`exonum-node`'s `events::codec`) on top of `tokio_util`.

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::error::NetworkError;

/// Maximum payload size accepted in a single frame.
pub const MAX_FRAME_LEN: usize = 8 * 1024 * 1024;

/// A TCP stream framed with a 4-byte big-endian length prefix.
pub type FramedConnection = Framed<TcpStream, LengthDelimitedCodec>;

/// Wraps `stream` in the big-endian length-delimited codec used by every
/// connection in this crate, peer-to-peer or client-to-peer alike.
pub fn frame(stream: TcpStream) -> FramedConnection {
    let codec = LengthDelimitedCodec::builder()
        .big_endian()
        .length_field_length(4)
        .max_frame_length(MAX_FRAME_LEN)
        .new_codec();
    Framed::new(stream, codec)
}

/// Serializes `value` as compact JSON and sends it as a single frame.
pub async fn send_json<T: Serialize>(
    conn: &mut FramedConnection,
    value: &T,
) -> Result<(), NetworkError> {
    let bytes = serde_json::to_vec(value)?;
    conn.send(Bytes::from(bytes)).await?;
    Ok(())
}

/// Reads a single frame and decodes it as JSON.
pub async fn recv_json<T: DeserializeOwned>(conn: &mut FramedConnection) -> Result<T, NetworkError> {
    let frame = conn
        .next()
        .await
        .ok_or(NetworkError::ConnectionClosed)??;
    let value = serde_json::from_slice(&frame)?;
    Ok(value)
}
