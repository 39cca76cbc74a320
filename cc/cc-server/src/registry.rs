// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use cc_core::{FlowContext, Telemetry, NN_INPUT_SIZE};
use rand::Rng;
use tokio::sync::Mutex;

/// The server's `flow_contexts` table ("accessed only from the
/// reactor"). Guarded by a single async mutex rather than per-flow locks —
/// every operation here is a short `HashMap` lookup, never an `.await`
/// while holding the lock, so contention is not a concern at the scale this
/// control plane runs at.
#[derive(Default)]
pub struct FlowRegistry {
    contexts: Mutex<HashMap<u64, FlowContext>>,
}

impl FlowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `flow_id`. If it's already live, allocates a fresh random
    /// replacement and returns that instead ("collisions
    /// cause the server to allocate a fresh random identifier and return
    /// it").
    pub async fn start(&self, flow_id: u64) -> u64 {
        let mut contexts = self.contexts.lock().await;
        let id = if contexts.contains_key(&flow_id) {
            let mut rng = rand::thread_rng();
            loop {
                let candidate: u64 = rng.gen();
                if !contexts.contains_key(&candidate) {
                    break candidate;
                }
            }
        } else {
            flow_id
        };
        contexts.insert(id, FlowContext::new(id));
        id
    }

    /// Runs the observation pipeline for `flow_id` and returns the updated
    /// recurrent window, or `None` if `flow_id` is unknown ("Unknown
    /// flow_id on ALIVE/END: Log; no reply").
    pub async fn observe(&self, flow_id: u64, telemetry: &Telemetry) -> Option<[f32; NN_INPUT_SIZE]> {
        let mut contexts = self.contexts.lock().await;
        let ctx = contexts.get_mut(&flow_id)?;
        Some(*ctx.ingest(telemetry))
    }

    /// Destroys `flow_id`'s context, if any. Returns whether it existed, so
    /// callers can decide whether END deserves a log line.
    pub async fn end(&self, flow_id: u64) -> bool {
        self.contexts.lock().await.remove(&flow_id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.contexts.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_flow_id_gets_a_random_replacement() {
        let registry = FlowRegistry::new();
        let first = registry.start(42).await;
        assert_eq!(first, 42);
        let second = registry.start(42).await;
        assert_ne!(second, 42);
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn end_then_observe_yields_no_context() {
        let registry = FlowRegistry::new();
        registry.start(7).await;
        assert!(registry.end(7).await);
        assert!(registry.observe(7, &Telemetry::default()).await.is_none());
        assert!(!registry.end(7).await);
    }
}
