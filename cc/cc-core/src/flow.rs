// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::observation::{self, Telemetry};
use crate::{NN_INPUT_SIZE, STATE_SIZE};

/// Per-flow state held by the control-plane server: the latest normalized
/// observation and the sliding recurrent window of the last
/// [`crate::RECURRENT_NUM`] observations, oldest first.
///
/// Invariant: after every successful [`FlowContext::ingest`], `state` equals
/// the previous `state` left-shifted by [`STATE_SIZE`] positions with
/// `current` appended at the end.
#[derive(Clone, Debug)]
pub struct FlowContext {
    flow_id: u64,
    current: [f32; STATE_SIZE],
    state: [f32; NN_INPUT_SIZE],
}

impl FlowContext {
    /// Creates a fresh context with an all-zero sliding window, as on flow
    /// registration.
    pub fn new(flow_id: u64) -> Self {
        Self {
            flow_id,
            current: [0.0; STATE_SIZE],
            state: [0.0; NN_INPUT_SIZE],
        }
    }

    pub fn flow_id(&self) -> u64 {
        self.flow_id
    }

    pub fn current(&self) -> &[f32; STATE_SIZE] {
        &self.current
    }

    pub fn state(&self) -> &[f32; NN_INPUT_SIZE] {
        &self.state
    }

    /// Transforms `telemetry` into a normalized observation, slides the
    /// recurrent window, and returns the updated window (the value handed to
    /// the inference engine).
    pub fn ingest(&mut self, telemetry: &Telemetry) -> &[f32; NN_INPUT_SIZE] {
        self.current = observation::observe(telemetry);

        self.state.copy_within(STATE_SIZE.., 0);
        self.state[NN_INPUT_SIZE - STATE_SIZE..].copy_from_slice(&self.current);

        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn telemetry_with(avg_thr: u32) -> Telemetry {
        Telemetry {
            avg_thr,
            cwnd: 10,
            ..Default::default()
        }
    }

    #[test]
    fn sliding_window_after_five_observations() {
        let mut ctx = FlowContext::new(1);
        let mut first = [0.0f32; STATE_SIZE];
        for i in 0..5u32 {
            let obs = ctx.ingest(&telemetry_with(i));
            if i == 0 {
                first.copy_from_slice(&obs[0..STATE_SIZE]);
            }
        }
        let state = ctx.state();
        assert_eq!(&state[0..STATE_SIZE], &first[..]);
        assert_eq!(&state[40..50], ctx.current());
    }

    #[test]
    fn new_context_window_is_all_zero() {
        let ctx = FlowContext::new(7);
        assert_eq!(ctx.state(), &[0.0; NN_INPUT_SIZE]);
        assert_eq!(ctx.flow_id(), 7);
    }
}
