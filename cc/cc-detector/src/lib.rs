// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! In-kernel-shaped bandwidth-plateau detector and pacing/`cwnd` cap.
//!
//! [`Estimator`] is the pure per-ACK state machine (`struct PMODRL` in the
//! original kernel module). [`PerSocketState`] is the thin per-socket shell
//! around it (`struct astraea`): it owns the congestion-avoidance state
//! needed to decide *when* an `exclude_*` reset should fire, and exposes the
//! `cong_control`/`set_state`/`ssthresh`/`undo_cwnd`/`release` call sites a
//! real kernel-module shim (or a test harness standing in for one) drives.

mod classify;
mod constants;
mod estimator;
mod sample;
mod socket;
mod tunables;

pub use classify::{Classify, ResetCodes};
pub use constants::{
    ABRUPT_DECREASE_THRESH, BASED_SCALE, BASED_UNIT, BBR_SCALE, BBR_UNIT, BW_SCALE, BW_UNIT,
    LOSS_THRESH, PACING_MARGIN_PERCENT, PERCENT_ARR, PERCENT_ARR_NUM, THR_SCALE, THR_UNIT,
};
pub use estimator::{AppliedCaps, DebugSample, Estimator};
pub use sample::{AckSample, CaState};
pub use socket::PerSocketState;
pub use tunables::Tunables;
