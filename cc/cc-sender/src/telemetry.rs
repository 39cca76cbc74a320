// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The opaque kernel-telemetry source a control tick samples from: a
//! `TelemetrySource` fills a [`cc_core::Telemetry`] once per control tick.
//!
//! Two implementations are provided: [`MockTelemetrySource`] for tests and
//! offline replay, and [`LoopbackTelemetrySource`], which reads the real
//! `TCP_INFO`/`SO_MAX_PACING_RATE` counters off a live socket on Linux and
//! turns the cumulative kernel counters into the per-tick rates/ratios the
//! observation pipeline expects.

use cc_core::Telemetry;

/// Fills one [`Telemetry`] snapshot per control tick. Implementations do
/// whatever a single kernel query per tick means for their
/// backend; the trait itself makes no assumption about blocking vs. async
/// since a `getsockopt` call is fast enough to run inline on the driver's
/// task.
pub trait TelemetrySource: Send {
    fn sample(&mut self) -> Telemetry;
}

/// A scripted source for tests: replays a fixed sequence of [`Telemetry`]
/// values, repeating the last one once exhausted.
pub struct MockTelemetrySource {
    ticks: Vec<Telemetry>,
    next: usize,
}

impl MockTelemetrySource {
    pub fn new(ticks: Vec<Telemetry>) -> Self {
        assert!(!ticks.is_empty(), "MockTelemetrySource needs at least one tick");
        Self { ticks, next: 0 }
    }
}

impl TelemetrySource for MockTelemetrySource {
    fn sample(&mut self) -> Telemetry {
        let idx = self.next.min(self.ticks.len() - 1);
        self.next += 1;
        self.ticks[idx]
    }
}

#[cfg(target_os = "linux")]
mod linux {
    use super::*;
    use std::mem;
    use std::os::unix::io::RawFd;
    use std::sync::Mutex;
    use std::time::Instant;

    /// Binary-compatible subset of Linux's `struct tcp_info`
    /// (`include/uapi/linux/tcp.h`), sized generously so a `getsockopt`
    /// against a newer kernel that returns a larger structure still leaves
    /// our fields at the right offsets; we never read past
    /// `tcpi_delivery_rate`.
    #[repr(C)]
    #[derive(Debug, Clone, Copy, Default)]
    struct RawTcpInfo {
        tcpi_state: u8,
        tcpi_ca_state: u8,
        tcpi_retransmits: u8,
        tcpi_probes: u8,
        tcpi_backoff: u8,
        tcpi_options: u8,
        tcpi_snd_wscale: u8,
        tcpi_rcv_wscale: u8,
        tcpi_rto: u32,
        tcpi_ato: u32,
        tcpi_snd_mss: u32,
        tcpi_rcv_mss: u32,
        tcpi_unacked: u32,
        tcpi_sacked: u32,
        tcpi_lost: u32,
        tcpi_retrans: u32,
        tcpi_fackets: u32,
        tcpi_last_data_sent: u32,
        tcpi_last_ack_sent: u32,
        tcpi_last_data_recv: u32,
        tcpi_last_ack_recv: u32,
        tcpi_pmtu: u32,
        tcpi_rcv_ssthresh: u32,
        tcpi_rtt: u32,
        tcpi_rttvar: u32,
        tcpi_snd_ssthresh: u32,
        tcpi_snd_cwnd: u32,
        tcpi_advmss: u32,
        tcpi_reordering: u32,
        tcpi_rcv_rtt: u32,
        tcpi_rcv_space: u32,
        tcpi_total_retrans: u32,
        tcpi_pacing_rate: u64,
        tcpi_max_pacing_rate: u64,
        tcpi_bytes_acked: u64,
        tcpi_bytes_received: u64,
        tcpi_segs_out: u32,
        tcpi_segs_in: u32,
        tcpi_notsent_bytes: u32,
        tcpi_min_rtt: u32,
        tcpi_data_segs_in: u32,
        tcpi_data_segs_out: u32,
        tcpi_delivery_rate: u64,
    }

    const SOL_TCP: libc::c_int = libc::IPPROTO_TCP;
    const TCP_INFO: libc::c_int = 11;

    fn query(fd: RawFd) -> Option<RawTcpInfo> {
        let mut info = RawTcpInfo::default();
        let mut len = mem::size_of::<RawTcpInfo>() as libc::socklen_t;
        // SAFETY: `info` is a plain-old-data struct sized for the call, and
        // `getsockopt` only ever writes up to `len` bytes into it; a short
        // return from an older kernel just leaves trailing fields zeroed.
        let rc = unsafe {
            libc::getsockopt(
                fd,
                SOL_TCP,
                TCP_INFO,
                &mut info as *mut _ as *mut libc::c_void,
                &mut len,
            )
        };
        (rc == 0).then_some(info)
    }

    #[derive(Clone, Copy, Default)]
    struct Cumulative {
        bytes_acked: u64,
        segs_out: u32,
        total_retrans: u32,
    }

    const USEC_PER_SEC: u64 = 1_000_000;

    /// Reads real `TCP_INFO` counters off `fd` every tick and turns the
    /// cumulative kernel counters into the per-tick rates/ratios
    /// [`cc_core::observe`](cc_core::Telemetry) expects: `avg_thr` is the
    /// delivered-bytes rate since the last sample, `max_tput` is the
    /// highest `avg_thr` observed so far this flow (a running high-water
    /// mark, standing in for a richer bandwidth-estimate signal a real
    /// deployment would source from the kernel CC module directly),
    /// `avg_urtt` is the RTT sample on this tick (there being exactly one
    /// `TCP_INFO` query per tick, "average" collapses to "latest"),
    /// `min_rtt` tracks the lowest RTT seen, and `loss_ratio` is the
    /// fraction of this tick's new segments that were retransmissions.
    pub struct LoopbackTelemetrySource {
        fd: RawFd,
        prev: Mutex<(Instant, Cumulative)>,
        max_tput: Mutex<u32>,
        min_rtt: Mutex<u32>,
    }

    impl LoopbackTelemetrySource {
        pub fn new(fd: RawFd) -> Self {
            Self {
                fd,
                prev: Mutex::new((Instant::now(), Cumulative::default())),
                max_tput: Mutex::new(0),
                min_rtt: Mutex::new(0),
            }
        }
    }

    impl TelemetrySource for LoopbackTelemetrySource {
        fn sample(&mut self) -> Telemetry {
            let Some(info) = query(self.fd) else {
                tracing::warn!("TCP_INFO query failed; reporting an all-zero telemetry sample");
                return Telemetry::default();
            };

            let now = Instant::now();
            let mut prev = self.prev.lock().unwrap();
            let (prev_instant, prev_cum) = *prev;
            let elapsed_us = now.duration_since(prev_instant).as_micros().max(1) as u64;

            let delta_bytes = info.tcpi_bytes_acked.saturating_sub(prev_cum.bytes_acked);
            let delta_segs_out = info.tcpi_segs_out.saturating_sub(prev_cum.segs_out);
            let delta_retrans = info.tcpi_total_retrans.saturating_sub(prev_cum.total_retrans);

            let avg_thr = ((delta_bytes * USEC_PER_SEC) / elapsed_us) as u32;

            *prev = (
                now,
                Cumulative {
                    bytes_acked: info.tcpi_bytes_acked,
                    segs_out: info.tcpi_segs_out,
                    total_retrans: info.tcpi_total_retrans,
                },
            );
            drop(prev);

            let mut max_tput = self.max_tput.lock().unwrap();
            *max_tput = (*max_tput).max(avg_thr);
            let max_tput = *max_tput;

            let mut min_rtt = self.min_rtt.lock().unwrap();
            *min_rtt = if *min_rtt == 0 {
                info.tcpi_rtt
            } else {
                (*min_rtt).min(info.tcpi_rtt)
            };
            let min_rtt = *min_rtt;

            let loss_ratio = if delta_segs_out > 0 {
                delta_retrans as f64 / delta_segs_out as f64
            } else {
                0.0
            };

            Telemetry {
                avg_thr,
                avg_urtt: info.tcpi_rtt,
                srtt_us: info.tcpi_rtt,
                min_rtt,
                max_tput,
                cwnd: info.tcpi_snd_cwnd,
                packets_out: info.tcpi_unacked + info.tcpi_sacked,
                pacing_rate: info.tcpi_pacing_rate.min(u32::MAX as u64) as u32,
                retrans_out: info.tcpi_total_retrans,
                loss_ratio,
            }
        }
    }
}

#[cfg(target_os = "linux")]
pub use linux::LoopbackTelemetrySource;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_repeats_last_tick_once_exhausted() {
        let mut source = MockTelemetrySource::new(vec![
            Telemetry { cwnd: 1, ..Default::default() },
            Telemetry { cwnd: 2, ..Default::default() },
        ]);
        assert_eq!(source.sample().cwnd, 1);
        assert_eq!(source.sample().cwnd, 2);
        assert_eq!(source.sample().cwnd, 2);
        assert_eq!(source.sample().cwnd, 2);
    }
}
