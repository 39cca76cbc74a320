// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::{MSS_BYTES, STATE_SIZE};
use serde::{Deserialize, Serialize};

/// Raw per-tick kernel telemetry for one flow, as handed to the observation
/// pipeline by the sender-side control driver.
///
/// Field names and types match the wire contract exactly (all unsigned
/// integers except `loss_ratio`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    pub avg_thr: u32,
    pub avg_urtt: u32,
    pub srtt_us: u32,
    pub min_rtt: u32,
    pub max_tput: u32,
    pub cwnd: u32,
    pub packets_out: u32,
    pub pacing_rate: u32,
    pub retrans_out: u32,
    pub loss_ratio: f64,
}

/// Ceiling applied to features 2, 3, 4, 9 (indices 1, 2, 3, 8) after they are
/// computed.
const FEATURE_CEILING: f32 = 2.0;

/// Transforms raw telemetry into the ten-float normalized observation.
///
/// This is a literal port of the original `transform_state`, including the
/// preserved `avg_thr / avg_thr` normalizer for feature 1 noted as a likely
/// latent bug, preserved rather than fixed: it is kept because the contract
/// says to keep it, not because it's believed correct.
pub fn observe(t: &Telemetry) -> [f32; STATE_SIZE] {
    let avg_thr = t.avg_thr as f64;
    let avg_urtt = t.avg_urtt as f64;
    let srtt_us = t.srtt_us as f64;
    let min_rtt = t.min_rtt as f64;
    let max_tput = t.max_tput as f64;
    let cwnd = t.cwnd as f64;
    let packets_out = t.packets_out as f64;
    let pacing_rate = t.pacing_rate as f64;
    let retrans_out = t.retrans_out as f64;
    let loss_ratio = t.loss_ratio;

    let f0 = if t.avg_thr == 0 {
        0.5
    } else if t.max_tput > 0 {
        avg_thr / avg_thr
    } else {
        0.0
    };

    let f1 = if t.avg_urtt == 0 {
        2.0
    } else if t.min_rtt == 0 {
        0.0
    } else {
        avg_urtt / min_rtt
    };

    let f2 = if t.srtt_us == 0 {
        2.0
    } else if t.min_rtt == 0 {
        0.0
    } else {
        (srtt_us / 8.0) / min_rtt
    };

    let f3 = if t.min_rtt == 0 || t.max_tput == 0 {
        0.0
    } else {
        (cwnd * MSS_BYTES * 8.0) / (min_rtt / 1e6) / max_tput / 10.0
    };

    let f4 = max_tput / 1e7;
    let f5 = min_rtt / 5e5;
    let f6 = if t.max_tput > 0 { loss_ratio / max_tput } else { 0.0 };
    let f7 = packets_out / cwnd;
    let f8 = if t.max_tput > 0 { pacing_rate / max_tput } else { 0.0 };
    let f9 = if t.packets_out > 0 { retrans_out / packets_out } else { 0.0 };

    let mut out = [f0, f1, f2, f3, f4, f5, f6, f7, f8, f9].map(|v| v as f32);

    out[1] = out[1].min(FEATURE_CEILING);
    out[2] = out[2].min(FEATURE_CEILING);
    out[3] = out[3].min(FEATURE_CEILING);
    out[8] = out[8].min(FEATURE_CEILING);

    out
}
