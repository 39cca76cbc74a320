// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

/// Fixed-point scale for the delivery-rate conversion (`THR_SCALE`).
pub const THR_SCALE: u32 = 24;
pub const THR_UNIT: u64 = 1 << THR_SCALE;

/// Fixed-point scale shared by the `B`/`R` arrays (`BW_SCALE`).
pub const BW_SCALE: u32 = 24;
pub const BW_UNIT: u64 = 1 << BW_SCALE;

/// Fixed-point scale for pacing gains (`BBR_SCALE`).
pub const BBR_SCALE: u32 = 8;
pub const BBR_UNIT: u32 = 1 << BBR_SCALE;

/// Fixed-point scale used by `comp`'s threshold comparison and the probe
/// gain multiplier (`BASED_SCALE`).
pub const BASED_SCALE: u64 = 8;
pub const BASED_UNIT: u64 = 1 << BASED_SCALE;

/// Number of candidate cap fractions tracked in `B`/`R`.
pub const PERCENT_ARR_NUM: usize = 9;

/// `B`/`R` slot fractions, in `BW_UNIT` fixed point: `1, 7/8, 6/8, ..., 0`.
pub const PERCENT_ARR: [u64; PERCENT_ARR_NUM] = [
    BW_UNIT,
    BW_UNIT * 7 / 8,
    BW_UNIT * 6 / 8,
    BW_UNIT * 5 / 8,
    BW_UNIT * 4 / 8,
    BW_UNIT * 3 / 8,
    BW_UNIT * 2 / 8,
    BW_UNIT * 1 / 8,
    0,
];

/// Declared in the source (`loss_thresh = 50`) but never read by any
/// branch of the classification logic; the literal 20% threshold in
/// `estimation_classify` is hardcoded separately. Kept for parity only.
pub const LOSS_THRESH: u32 = 50;

/// `abrupt_decrease_thresh`: goodput-diff-over-before-empty threshold, in
/// `BASED_UNIT` fixed point (150/256 ~= 58.6%).
pub const ABRUPT_DECREASE_THRESH: u64 = 150;

/// `bbr_pacing_margin_percent`: shaved off the pacing-rate conversion.
pub const PACING_MARGIN_PERCENT: u64 = 1;

pub const USEC_PER_SEC: u64 = 1_000_000;
pub const USEC_PER_MSEC: u32 = 1_000;
