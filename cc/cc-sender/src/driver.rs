// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The per-tick control loop: an "observe, ask, apply" cycle,
//! grounded on `server_sender.cc`'s `control_thread`/`do_congestion_control`
//! pair (INIT/START once up front, then ALIVE on a fixed interval, with the
//! reply's `cwnd` written back before the next tick).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::control_channel::ControlChannel;
use crate::cwnd_writer::CwndWriter;
use crate::error::Result;
use crate::perf_log::{PerfLogRow, PerfLogWriter};
use crate::telemetry::TelemetrySource;

/// How long to wait for a reply to one ALIVE before giving up on the tick.
/// The original blocks on a synchronous IPC read with no timeout; we bound
/// it so a wedged control-plane process cannot stall the data path
/// indefinitely: skip the tick and keep the last assigned `cwnd`.
const REPLY_TIMEOUT: Duration = Duration::from_millis(500);

/// Drives one flow's control cycle until `send_traffic` is cleared.
pub struct ControlDriver {
    flow_id: u64,
    channel: ControlChannel,
    telemetry: Box<dyn TelemetrySource>,
    cwnd_writer: Box<dyn CwndWriter>,
    perf_log: Option<PerfLogWriter>,
    interval: Duration,
    send_traffic: Arc<AtomicBool>,
    /// How many control ticks elapse between performance-log rows (the CLI's
    /// separate `--perf-interval` cadence, rounded to whole ticks and
    /// floored at 1 so a `--perf-interval` shorter than `--interval` still
    /// logs every tick instead of dividing by zero).
    perf_log_every_n_ticks: u32,
    ticks_since_perf_log: u32,
}

impl ControlDriver {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        flow_id: u64,
        channel: ControlChannel,
        telemetry: Box<dyn TelemetrySource>,
        cwnd_writer: Box<dyn CwndWriter>,
        perf_log: Option<PerfLogWriter>,
        interval: Duration,
        perf_log_interval: Duration,
        send_traffic: Arc<AtomicBool>,
    ) -> Self {
        let perf_log_every_n_ticks = (perf_log_interval.as_millis() / interval.as_millis().max(1))
            .max(1) as u32;
        Self {
            flow_id,
            channel,
            telemetry,
            cwnd_writer,
            perf_log,
            interval,
            send_traffic,
            perf_log_every_n_ticks,
            ticks_since_perf_log: 0,
        }
    }

    /// Registers the flow, then loops ALIVE ticks until `send_traffic` goes
    /// false, then sends END. Returns the (possibly server-reassigned)
    /// `flow_id` this driver ended up registered under.
    pub async fn run(mut self) -> Result<u64> {
        let flow_id = self.channel.start(self.flow_id).await?;
        tracing::info!(flow_id, "registered flow with control plane");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        while self.send_traffic.load(Ordering::Relaxed) {
            ticker.tick().await;
            if let Err(err) = self.tick(flow_id).await {
                tracing::warn!(flow_id, %err, "control tick failed; keeping last cwnd");
            }
        }

        if let Err(err) = self.channel.end(flow_id).await {
            tracing::warn!(flow_id, %err, "failed to send END");
        }
        Ok(flow_id)
    }

    async fn tick(&mut self, flow_id: u64) -> Result<()> {
        let state = self.telemetry.sample();

        let cwnd = match tokio::time::timeout(REPLY_TIMEOUT, self.channel.alive(flow_id, &state))
            .await
        {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(flow_id, "ALIVE reply timed out; skipping this tick");
                return Ok(());
            }
        };

        self.cwnd_writer.apply(cwnd);

        self.ticks_since_perf_log += 1;
        let due = self.ticks_since_perf_log >= self.perf_log_every_n_ticks;
        if due {
            self.ticks_since_perf_log = 0;
        }
        if let (true, Some(perf_log)) = (due, self.perf_log.as_mut()) {
            let cumulative = state.packets_out as u64;
            perf_log.write_row(&PerfLogRow {
                min_rtt: state.min_rtt,
                avg_urtt: state.avg_urtt,
                cnt: cumulative,
                srtt_us: state.srtt_us,
                avg_thr: state.avg_thr,
                thr_cnt: cumulative,
                pacing_rate: state.pacing_rate,
                loss_bytes: (state.loss_ratio * state.retrans_out as f64) as u64,
                packets_out: state.packets_out,
                retrans_out: state.retrans_out,
                cwnd_kernel: state.cwnd,
                cwnd_assigned: cwnd,
            })?;
        }

        Ok(())
    }
}
