// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use cc_core::NN_INPUT_SIZE;
use crossbeam_channel::{Receiver, Sender};
use once_cell::sync::OnceCell;

use crate::policy::Policy;

/// Minimum spacing between batch drains, giving concurrently arriving
/// requests a chance to coalesce into one tensor evaluation.
const BATCH_INTERVAL: Duration = Duration::from_micros(5_000);

/// A reply callback: fired exactly once with `(action, info)`. `info` is
/// always empty in this implementation, carried over from the original
/// contract's `reply_cb(action, info="")` signature for parity.
pub type ReplyCallback = Box<dyn FnOnce(f32, &str) + Send>;

struct InferenceRequest {
    #[allow(dead_code)] // carried for parity with the wire contract; logged on failure
    flow_id: u64,
    observation: [f32; NN_INPUT_SIZE],
    reply: ReplyCallback,
}

enum WorkerMsg {
    Submit(InferenceRequest),
    Stop,
}

/// Process-wide inference engine: owns one pre-loaded [`Policy`] and serves
/// both the immediate and batched calling conventions.
///
/// `inference_imdt` evaluates synchronously on the caller's thread.
/// `submit` enqueues onto a background worker that drains the queue,
/// sleeping [`BATCH_INTERVAL`] between drains to let concurrent submissions
/// coalesce into a single `[N, NN_INPUT_SIZE]` evaluation, then fires every
/// reply callback in enqueue order.
pub struct Engine {
    policy: Arc<dyn Policy>,
    tx: Sender<WorkerMsg>,
    worker: Option<JoinHandle<()>>,
}

impl Engine {
    /// Constructs the engine and runs the mandatory warm-up inference (an
    /// all-zeros observation) to force any lazy allocations in the policy
    /// before the first real request arrives.
    pub fn new(policy: Arc<dyn Policy>) -> Self {
        let _ = policy.infer(&[0.0; NN_INPUT_SIZE]);

        let (tx, rx) = crossbeam_channel::unbounded();
        let worker_policy = Arc::clone(&policy);
        let worker = std::thread::Builder::new()
            .name("cc-inference-batch".to_string())
            .spawn(move || worker_loop(worker_policy, rx))
            .expect("failed to spawn inference batch worker");

        Self {
            policy,
            tx,
            worker: Some(worker),
        }
    }

    /// Immediate-mode evaluation: synchronous on the caller's thread, fires
    /// `reply` exactly once. An evaluation panic is treated as an
    /// evaluation failure ("log, drop this reply, continue") rather
    /// than propagated to the caller.
    pub fn inference_imdt(&self, flow_id: u64, observation: [f32; NN_INPUT_SIZE], reply: ReplyCallback) {
        match std::panic::catch_unwind(AssertUnwindSafe(|| self.policy.infer(&observation))) {
            Ok(action) => reply(action, ""),
            Err(_) => {
                tracing::error!(flow_id, "immediate inference failed; dropping reply");
            }
        }
    }

    /// Batched-mode evaluation: enqueues and returns immediately. The
    /// worker thread evaluates this request together with whatever else
    /// coalesces within [`BATCH_INTERVAL`] and fires `reply` from its own
    /// thread, in enqueue order within that batch.
    pub fn submit(&self, flow_id: u64, observation: [f32; NN_INPUT_SIZE], reply: ReplyCallback) {
        let req = InferenceRequest {
            flow_id,
            observation,
            reply,
        };
        if self.tx.send(WorkerMsg::Submit(req)).is_err() {
            tracing::error!(flow_id, "inference engine worker is gone; dropping submission");
        }
    }

    /// Signals the worker to stop after draining outstanding requests, and
    /// joins it. Mirrors the original's "stop flag + condvar signal" design
    /// without sleeping on the caller's thread.
    pub fn shutdown(&mut self) {
        let _ = self.tx.send(WorkerMsg::Stop);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.shutdown();
        }
    }
}

fn worker_loop(policy: Arc<dyn Policy>, rx: Receiver<WorkerMsg>) {
    loop {
        let first = match rx.recv() {
            Ok(WorkerMsg::Submit(req)) => req,
            Ok(WorkerMsg::Stop) | Err(_) => return,
        };

        std::thread::sleep(BATCH_INTERVAL);

        let mut batch = vec![first];
        let mut stopping = false;
        while let Ok(msg) = rx.try_recv() {
            match msg {
                WorkerMsg::Submit(req) => batch.push(req),
                WorkerMsg::Stop => {
                    stopping = true;
                    break;
                }
            }
        }

        evaluate_batch(&policy, batch);

        if stopping {
            return;
        }
    }
}

fn evaluate_batch(policy: &Arc<dyn Policy>, batch: Vec<InferenceRequest>) {
    let observations: Vec<[f32; NN_INPUT_SIZE]> = batch.iter().map(|r| r.observation).collect();
    let flow_ids: Vec<u64> = batch.iter().map(|r| r.flow_id).collect();

    let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| policy.infer_batch(&observations)));

    match outcome {
        Ok(actions) if actions.len() == batch.len() => {
            for (req, action) in batch.into_iter().zip(actions) {
                (req.reply)(action, "");
            }
        }
        Ok(actions) => {
            tracing::error!(
                got = actions.len(),
                want = batch.len(),
                "batched inference returned a mismatched row count; dropping batch"
            );
        }
        Err(_) => {
            tracing::error!(flow_ids = ?flow_ids, "batched inference failed; dropping batch");
        }
    }
}

/// Process-wide singleton accessor: the
/// first caller to reach [`install`] constructs the engine (including the
/// warm-up pass); every later caller and every [`global`] call shares it.
static ENGINE: OnceCell<Engine> = OnceCell::new();

/// Installs the process-wide engine if it hasn't been installed yet, and
/// returns a reference to it either way.
pub fn install(policy: Arc<dyn Policy>) -> &'static Engine {
    ENGINE.get_or_init(|| Engine::new(policy))
}

/// Returns the process-wide engine. Panics if [`install`] has not been
/// called yet — mirrors the original's lazy-accessor-with-one-construction
/// contract, which likewise assumes start-up has already run.
pub fn global() -> &'static Engine {
    ENGINE.get().expect("inference engine accessed before install()")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    struct ConstantPolicy(f32);
    impl Policy for ConstantPolicy {
        fn infer(&self, _observation: &[f32; NN_INPUT_SIZE]) -> f32 {
            self.0
        }
    }

    struct PanicPolicy;
    impl Policy for PanicPolicy {
        fn infer(&self, _observation: &[f32; NN_INPUT_SIZE]) -> f32 {
            panic!("synthetic evaluation failure")
        }
    }

    #[test]
    fn immediate_mode_fires_reply_exactly_once() {
        let engine = Engine::new(Arc::new(ConstantPolicy(0.5)));
        let (tx, rx) = bounded(1);
        engine.inference_imdt(1, [0.0; NN_INPUT_SIZE], Box::new(move |action, _| {
            tx.send(action).unwrap();
        }));
        assert_eq!(rx.recv().unwrap(), 0.5);
    }

    #[test]
    fn batched_mode_delivers_replies_in_enqueue_order() {
        let engine = Engine::new(Arc::new(ConstantPolicy(1.0)));
        let (tx, rx) = bounded(4);
        for i in 0..4u64 {
            let tx = tx.clone();
            let mut obs = [0.0; NN_INPUT_SIZE];
            obs[0] = i as f32;
            engine.submit(i, obs, Box::new(move |action, _| {
                tx.send((i, action)).unwrap();
            }));
        }
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(rx.recv_timeout(Duration::from_secs(1)).unwrap().0);
        }
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn immediate_evaluation_panic_is_logged_and_reply_is_dropped() {
        let engine = Engine::new(Arc::new(PanicPolicy));
        let (tx, rx) = bounded::<()>(1);
        engine.inference_imdt(1, [0.0; NN_INPUT_SIZE], Box::new(move |_, _| {
            tx.send(()).unwrap();
        }));
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn shutdown_joins_the_worker_thread() {
        let mut engine = Engine::new(Arc::new(ConstantPolicy(0.0)));
        engine.shutdown();
        assert!(engine.worker.is_none());
    }
}
