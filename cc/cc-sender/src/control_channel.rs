// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Client side of C6/C2's wire contract: the same length-prefixed JSON
//! framing the server speaks, built from this side instead of parsed
//! (`cc_core::ClientMessage`/`ServerMessage` are server-side types; the
//! driver constructs request envelopes and parses reply envelopes
//! directly, matching the original's `ipc_send_message`/response-parsing
//! split in `server_sender.cc`).

use std::net::SocketAddr;
use std::path::Path;

use bytes::{Bytes, BytesMut};
use cc_core::Telemetry;
use serde::{Deserialize, Serialize};
use tokio::net::{UdpSocket, UnixStream};

use crate::error::{Error, Result};

#[derive(Serialize)]
struct StartRequest {
    #[serde(rename = "type")]
    kind: u8,
    flow_id: u64,
}

#[derive(Serialize)]
struct AliveRequest<'a> {
    #[serde(rename = "type")]
    kind: u8,
    flow_id: u64,
    state: &'a Telemetry,
}

#[derive(Serialize)]
struct EndRequest {
    #[serde(rename = "type")]
    kind: u8,
    flow_id: u64,
}

#[derive(Deserialize)]
struct StartReply {
    flow_id: u64,
}

#[derive(Deserialize)]
struct AliveReply {
    #[allow(dead_code)]
    flow_id: u64,
    cwnd: u32,
}

const TYPE_START: u8 = 1;
const TYPE_END: u8 = 2;
const TYPE_ALIVE: u8 = 3;

/// The sender's handle to the control-plane server: either a Unix-domain
/// stream (one context per connection) or a connected UDP socket (one
/// context per `flow_id`, released only by an explicit [`ControlChannel::end`]).
pub enum ControlChannel {
    Unix(UnixStream),
    Udp(UdpSocket),
}

impl ControlChannel {
    pub async fn connect_unix(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::Unix(UnixStream::connect(path).await?))
    }

    pub async fn connect_udp(server_addr: SocketAddr) -> Result<Self> {
        let local: SocketAddr = if server_addr.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        }
        .parse()
        .expect("static bind address is valid");
        let socket = UdpSocket::bind(local).await?;
        socket.connect(server_addr).await?;
        Ok(Self::Udp(socket))
    }

    async fn send(&mut self, payload: &[u8]) -> Result<()> {
        match self {
            ControlChannel::Unix(stream) => cc_codec::write_framed(stream, payload).await?,
            ControlChannel::Udp(socket) => {
                let mut buf = BytesMut::with_capacity(2 + payload.len());
                cc_codec::encode(payload, &mut buf)?;
                socket.send(&buf).await?;
            }
        }
        Ok(())
    }

    async fn recv(&mut self) -> Result<Vec<u8>> {
        match self {
            ControlChannel::Unix(stream) => cc_codec::read_framed(stream)
                .await?
                .ok_or(Error::ControlChannelClosed),
            ControlChannel::Udp(socket) => {
                let mut buf = vec![0u8; 2 + cc_codec::MAX_MESSAGE_LEN];
                let len = socket.recv(&mut buf).await?;
                let mut cursor = Bytes::copy_from_slice(&buf[..len]);
                cc_codec::decode(&mut cursor)?.ok_or(Error::ControlChannelClosed)
            }
        }
    }

    /// Registers `flow_id` and returns the id the server actually assigned
    /// (identical unless a collision forced a reassignment).
    pub async fn start(&mut self, flow_id: u64) -> Result<u64> {
        let payload = serde_json::to_vec(&StartRequest { kind: TYPE_START, flow_id })
            .expect("START envelope always serializes");
        self.send(&payload).await?;
        let reply = self.recv().await?;
        let reply: StartReply = serde_json::from_slice(&reply)?;
        Ok(reply.flow_id)
    }

    /// Sends one ALIVE tick and returns the assigned `cwnd`.
    pub async fn alive(&mut self, flow_id: u64, state: &Telemetry) -> Result<u32> {
        let payload = serde_json::to_vec(&AliveRequest { kind: TYPE_ALIVE, flow_id, state })
            .expect("ALIVE envelope always serializes");
        self.send(&payload).await?;
        let reply = self.recv().await?;
        let reply: AliveReply = serde_json::from_slice(&reply)?;
        Ok(reply.cwnd)
    }

    /// Sends END. The server does not reply to it.
    pub async fn end(&mut self, flow_id: u64) -> Result<()> {
        let payload = serde_json::to_vec(&EndRequest { kind: TYPE_END, flow_id })
            .expect("END envelope always serializes");
        self.send(&payload).await
    }
}
