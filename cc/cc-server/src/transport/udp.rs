// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use cc_codec::MAX_MESSAGE_LEN;
use cc_core::ClientMessage;
use cc_inference::Engine;
use tokio::net::UdpSocket;

use crate::dispatch::dispatch;
use crate::registry::FlowRegistry;
use crate::Error;

/// Datagram-framed messages never span more than one UDP packet, so the
/// recv buffer only needs to hold the worst case: the two-byte length
/// prefix plus the maximum payload.
const RECV_BUF_LEN: usize = 2 + MAX_MESSAGE_LEN;

/// Runs the UDP control-plane listener on `port` until the socket itself
/// errors. Unlike the stream transport, there is exactly one task here —
/// contexts are keyed by `flow_id` and live until an explicit `END`,
/// regardless of which datagram (or source address) carries it.
pub async fn serve(port: u16, registry: Arc<FlowRegistry>, engine: &'static Engine, batch: bool) -> Result<(), Error> {
    let socket = UdpSocket::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "udp control-plane server listening");

    let mut buf = vec![0u8; RECV_BUF_LEN];
    loop {
        let (len, addr) = match socket.recv_from(&mut buf).await {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(error = %e, "udp recv error; dropping this datagram's slot");
                continue;
            }
        };

        if let Err(e) = handle_datagram(&socket, &buf[..len], addr, &registry, engine, batch).await {
            tracing::warn!(error = %e, %addr, "failed to handle datagram");
        }
    }
}

async fn handle_datagram(
    socket: &UdpSocket,
    datagram: &[u8],
    addr: SocketAddr,
    registry: &FlowRegistry,
    engine: &Engine,
    batch: bool,
) -> Result<(), Error> {
    let mut cursor = Bytes::copy_from_slice(datagram);
    let Some(payload) = cc_codec::decode(&mut cursor)? else {
        tracing::warn!(%addr, "datagram shorter than its declared length prefix; dropping");
        return Ok(());
    };

    let msg = ClientMessage::parse(&payload)?;
    let (reply, _event) = dispatch(registry, engine, batch, msg).await;

    if let Some(reply) = reply {
        let payload = reply.to_json_bytes();
        let mut framed = bytes::BytesMut::with_capacity(2 + payload.len());
        cc_codec::encode(&payload, &mut framed)?;
        socket.send_to(&framed, addr).await?;
    }
    Ok(())
}
