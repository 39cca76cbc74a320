// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use cc_core::ClientMessage;
use cc_inference::Engine;
use tokio::net::{UnixListener, UnixStream};

use crate::dispatch::{dispatch, DispatchEvent};
use crate::registry::FlowRegistry;
use crate::Error;

/// Runs the Unix-domain stream listener until `accept` itself fails. Each
/// accepted connection gets its own `tokio::task` ("one reactor thread
/// owns the server socket and all session sockets; no two callbacks for the
/// same session run concurrently" — giving each session its own task is
/// what makes that true without an explicit per-session lock).
///
/// The socket path is unlinked before bind, so a stale file left behind
/// by a previous crashed run doesn't block the new listener.
pub async fn serve(
    path: impl AsRef<Path>,
    registry: Arc<FlowRegistry>,
    engine: &'static Engine,
    batch: bool,
) -> Result<(), Error> {
    let path = path.as_ref();
    let _ = std::fs::remove_file(path);
    let listener = UnixListener::bind(path)?;
    tracing::info!(path = %path.display(), "unix-domain control-plane server listening");

    loop {
        let (stream, _addr) = listener.accept().await?;
        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            handle_connection(stream, registry, engine, batch).await;
        });
    }
}

async fn handle_connection(stream: UnixStream, registry: Arc<FlowRegistry>, engine: &'static Engine, batch: bool) {
    let (mut reader, mut writer) = stream.into_split();
    let mut owned_flows: HashSet<u64> = HashSet::new();

    loop {
        let payload = match cc_codec::read_framed(&mut reader).await {
            Ok(Some(payload)) => payload,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "transport read error; closing session");
                break;
            }
        };

        let msg = match ClientMessage::parse(&payload) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!(error = %e, "malformed ALIVE/START/END payload; skipping message");
                continue;
            }
        };

        let (reply, event) = dispatch(&registry, engine, batch, msg).await;
        match event {
            DispatchEvent::FlowStarted(id) => {
                owned_flows.insert(id);
            }
            DispatchEvent::FlowEnded(id) => {
                owned_flows.remove(&id);
            }
            DispatchEvent::None => {}
        }

        if let Some(reply) = reply {
            if let Err(e) = cc_codec::write_framed(&mut writer, &reply.to_json_bytes()).await {
                tracing::warn!(error = %e, "transport write error; closing session");
                break;
            }
        }
    }

    for flow_id in owned_flows {
        registry.end(flow_id).await;
    }
}
