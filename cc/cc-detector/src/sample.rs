// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

/// Congestion-avoidance state, ordered the way the kernel's `TCP_CA_*`
/// enum is ordered (`Open < Disorder < Cwr < Recovery < Loss`); `save_cwnd`
/// relies on that ordering to decide whether `prior_cwnd` should be
/// overwritten or just raised.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum CaState {
    Open = 0,
    Disorder = 1,
    Cwr = 2,
    Recovery = 3,
    Loss = 4,
}

/// One delivered-sample event: the subset of `struct tcp_sock` and
/// `struct rate_sample` the estimator actually reads, flattened into a
/// single plain struct so the detector never touches a live socket.
#[derive(Clone, Copy, Debug)]
pub struct AckSample {
    /// Monotonic microsecond clock at the time of this ACK.
    pub now_us: u32,
    /// Sampled round-trip time for this ACK, microseconds.
    pub rtt_us: u32,
    /// Smoothed RTT, microseconds (`srtt_us >> 3` in the kernel's fixed
    /// point; pass the already-shifted value here).
    pub srtt_us: u32,
    /// Cumulative packets delivered (`tp->delivered`).
    pub delivered_pkts: u32,
    /// Cumulative bytes acknowledged divided by MSS (`tp->snd_una / mss`),
    /// used in place of `delivered_pkts` when `use_goodput` is set.
    pub goodput_pkts: u32,
    /// Cumulative packets lost (`tp->lost`).
    pub lost_pkts: u32,
    /// `rs->prior_delivered`: delivered count as of when the now-acked
    /// segment was sent, used for round-boundary detection.
    pub prior_delivered: u32,
    /// Current MSS in bytes.
    pub mss: u32,
    /// Cumulative bytes acknowledged (`tp->bytes_acked`), recorded verbatim
    /// into the detector's debug trace and the detected-event snapshot.
    pub bytes_acked: u64,
    /// Whether this sample's send was application-limited
    /// (`rs->is_app_limited`).
    pub is_app_limited: bool,
    /// Whether the flow is currently receive-window limited
    /// (`tp->chrono_type == TCP_CHRONO_RWND_LIMITED`).
    pub rwnd_limited: bool,
    /// Whether this rate sample carries a usable delivery-rate interval
    /// (`rs->delivered >= 0 && rs->interval_us > 0`).
    pub has_delivery_rate: bool,
    pub ca_state: CaState,
}
