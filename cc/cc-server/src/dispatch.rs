// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use cc_core::{map_action, ClientMessage, ServerMessage};
use cc_inference::Engine;

use crate::registry::FlowRegistry;

/// A side effect `dispatch` wants the caller to apply to its own
/// connection-scoped bookkeeping (stream sessions track which `flow_id`s
/// they registered, so a disconnect can clean them all up; see
/// [`crate::transport::unix`]). UDP sessions ignore this — their contexts
/// live until an explicit `END` regardless of which datagram carried it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchEvent {
    None,
    FlowStarted(u64),
    FlowEnded(u64),
}

/// Dispatches one decoded client message against `registry` and `engine`,
/// per message type. Returns the reply to send (if any) and
/// the bookkeeping event the caller should apply.
pub async fn dispatch(
    registry: &FlowRegistry,
    engine: &Engine,
    batch: bool,
    msg: ClientMessage,
) -> (Option<ServerMessage>, DispatchEvent) {
    match msg {
        ClientMessage::Start { flow_id } => {
            let assigned = registry.start(flow_id).await;
            if assigned != flow_id {
                tracing::info!(requested = flow_id, assigned, "flow_id collision; reassigned");
            }
            (
                Some(ServerMessage::StartAck { flow_id: assigned }),
                DispatchEvent::FlowStarted(assigned),
            )
        }
        ClientMessage::Alive { flow_id, state } => {
            let Some(window) = registry.observe(flow_id, &state).await else {
                tracing::warn!(flow_id, "ALIVE for unknown flow_id; no reply");
                return (None, DispatchEvent::None);
            };

            let action = match evaluate(engine, batch, flow_id, window).await {
                Some(action) => action,
                None => {
                    tracing::error!(flow_id, "inference failed for this tick; no reply");
                    return (None, DispatchEvent::None);
                }
            };

            let cwnd = map_action(action, state.cwnd);
            (Some(ServerMessage::AliveAck { flow_id, cwnd }), DispatchEvent::None)
        }
        ClientMessage::End { flow_id } => {
            let existed = registry.end(flow_id).await;
            if !existed {
                tracing::warn!(flow_id, "END for unknown flow_id");
            }
            (None, DispatchEvent::FlowEnded(flow_id))
        }
        ClientMessage::Ignored => (None, DispatchEvent::None),
    }
}

/// Runs inference in the configured mode and waits for its single reply.
/// Returns `None` if the reply callback is dropped without firing (the
/// engine's "evaluation failure" path).
async fn evaluate(engine: &Engine, batch: bool, flow_id: u64, window: [f32; cc_core::NN_INPUT_SIZE]) -> Option<f32> {
    let (tx, rx) = tokio::sync::oneshot::channel();
    let reply = Box::new(move |action: f32, _info: &str| {
        let _ = tx.send(action);
    });
    if batch {
        engine.submit(flow_id, window, reply);
    } else {
        engine.inference_imdt(flow_id, window, reply);
    }
    rx.await.ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_core::Telemetry;
    use cc_inference::Policy;
    use std::sync::Arc;

    struct ConstantPolicy(f32);
    impl Policy for ConstantPolicy {
        fn infer(&self, _observation: &[f32; cc_core::NN_INPUT_SIZE]) -> f32 {
            self.0
        }
    }

    #[tokio::test]
    async fn start_then_duplicate_start_reassigns() {
        let registry = FlowRegistry::new();
        let engine = Engine::new(Arc::new(ConstantPolicy(0.0)));

        let (reply, event) = dispatch(&registry, &engine, false, ClientMessage::Start { flow_id: 1 }).await;
        assert_eq!(reply, Some(ServerMessage::StartAck { flow_id: 1 }));
        assert_eq!(event, DispatchEvent::FlowStarted(1));

        let (reply, event) = dispatch(&registry, &engine, false, ClientMessage::Start { flow_id: 1 }).await;
        let Some(ServerMessage::StartAck { flow_id }) = reply else {
            panic!("expected StartAck");
        };
        assert_ne!(flow_id, 1);
        assert_eq!(event, DispatchEvent::FlowStarted(flow_id));
    }

    #[tokio::test]
    async fn alive_on_unknown_flow_produces_no_reply() {
        let registry = FlowRegistry::new();
        let engine = Engine::new(Arc::new(ConstantPolicy(0.0)));
        let (reply, event) = dispatch(
            &registry,
            &engine,
            false,
            ClientMessage::Alive {
                flow_id: 99,
                state: Telemetry::default(),
            },
        )
        .await;
        assert_eq!(reply, None);
        assert_eq!(event, DispatchEvent::None);
    }

    #[tokio::test]
    async fn end_then_alive_produces_no_reply() {
        let registry = FlowRegistry::new();
        let engine = Engine::new(Arc::new(ConstantPolicy(0.0)));
        dispatch(&registry, &engine, false, ClientMessage::Start { flow_id: 5 }).await;
        let (_, event) = dispatch(&registry, &engine, false, ClientMessage::End { flow_id: 5 }).await;
        assert_eq!(event, DispatchEvent::FlowEnded(5));

        let (reply, _) = dispatch(
            &registry,
            &engine,
            false,
            ClientMessage::Alive {
                flow_id: 5,
                state: Telemetry::default(),
            },
        )
        .await;
        assert_eq!(reply, None);
    }

    #[tokio::test]
    async fn alive_maps_action_through_cwnd() {
        let registry = FlowRegistry::new();
        // action == 1.0 -> cwnd' = ceil(1.025 * cwnd)
        let engine = Engine::new(Arc::new(ConstantPolicy(1.0)));
        dispatch(&registry, &engine, false, ClientMessage::Start { flow_id: 1 }).await;
        let (reply, _) = dispatch(
            &registry,
            &engine,
            false,
            ClientMessage::Alive {
                flow_id: 1,
                state: Telemetry {
                    cwnd: 100,
                    ..Default::default()
                },
            },
        )
        .await;
        assert_eq!(reply, Some(ServerMessage::AliveAck { flow_id: 1, cwnd: 103 }));
    }
}
