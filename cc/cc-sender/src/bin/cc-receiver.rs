// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Receiver CLI: the passive side of the bulk-data connection, grounded on
//! `new_client_receiver.cc`/`new_client_receiver_nocomm.cc`'s connect-then-drain
//! loop. It carries no control-plane logic of its own (the sender owns
//! `cwnd`); it only drains `--size` bytes and, if asked, appends periodic
//! throughput rows to a performance log.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use cc_sender::{PerfLogRow, PerfLogWriter};
use structopt::StructOpt;
use tokio::net::TcpStream;

type Result<T, E = Box<dyn std::error::Error>> = std::result::Result<T, E>;

#[derive(Debug, StructOpt)]
#[structopt(name = "cc-receiver", about = "Passive receiver for the congestion-control sender")]
struct Opt {
    /// Sender's IP address to connect to.
    #[structopt(long)]
    ip: String,

    /// Sender's TCP port.
    #[structopt(long)]
    port: u16,

    /// Congestion-control algorithm to request on this side of the
    /// connection (the sender side is what actually gets overridden by the
    /// control plane; this exists for symmetry with the sender CLI and to
    /// match the original's flag surface).
    #[structopt(long, default_value = "cubic")]
    cong: String,

    /// Total number of bytes expected from the sender.
    #[structopt(long)]
    size: u64,

    /// Optional performance-log output file.
    #[structopt(long, parse(from_os_str))]
    perf_log: Option<PathBuf>,

    /// Performance-log row interval, milliseconds.
    #[structopt(long, default_value = "1000")]
    perf_interval: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let opt = Opt::from_args();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("cc_receiver=info"))
        .init();

    if opt.size == 0 {
        return Err("--size must be greater than 0".into());
    }

    let stream = TcpStream::connect((opt.ip.as_str(), opt.port)).await?;
    stream.set_nodelay(true)?;
    tracing::info!(ip = %opt.ip, port = opt.port, "connected to sender");

    #[cfg(target_os = "linux")]
    {
        use std::os::unix::io::AsRawFd;
        if let Err(err) = cc_sender::set_congestion(stream.as_raw_fd(), &opt.cong) {
            tracing::warn!(cong = %opt.cong, %err, "failed to set congestion-control algorithm");
        }
    }

    let running = Arc::new(AtomicBool::new(true));
    let sigint_flag = Arc::clone(&running);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown signal received");
        sigint_flag.store(false, Ordering::Relaxed);
    });

    let (mut read_half, _write_half) = stream.into_split();

    let mut perf_log = opt
        .perf_log
        .as_ref()
        .map(PerfLogWriter::create)
        .transpose()?;

    let perf_interval = Duration::from_millis(opt.perf_interval);
    let size = opt.size;
    let recv_flag = Arc::clone(&running);
    let progress = Arc::new(AtomicU64::new(0));
    let recv_progress = Arc::clone(&progress);

    let start = Instant::now();
    let mut last_log = start;
    let mut last_logged_bytes = 0u64;
    let mut total_read = 0u64;

    let recv_task = tokio::spawn(async move {
        cc_sender::recv_all(&mut read_half, size, recv_flag, recv_progress).await
    });

    // Poll progress on the perf-log cadence while the drain runs in its own
    // task; `progress` is updated live by `recv_all`, so this gives real
    // mid-flight throughput rows without the drain loop itself knowing
    // about logging.
    tokio::pin!(recv_task);
    loop {
        tokio::select! {
            result = &mut recv_task => {
                total_read = result??;
                break;
            }
            _ = tokio::time::sleep(perf_interval) => {
                if let Some(writer) = perf_log.as_mut() {
                    let now = Instant::now();
                    let elapsed_us = now.duration_since(last_log).as_micros().max(1) as u64;
                    let delivered = progress.load(Ordering::Relaxed);
                    let delta_bytes = delivered.saturating_sub(last_logged_bytes);
                    let avg_thr = (delta_bytes * 1_000_000 / elapsed_us) as u32;
                    writer.write_row(&PerfLogRow {
                        cnt: delivered,
                        avg_thr,
                        thr_cnt: delivered,
                        packets_out: 0,
                        retrans_out: 0,
                        cwnd_kernel: 0,
                        cwnd_assigned: 0,
                        ..Default::default()
                    })?;
                    last_log = now;
                    last_logged_bytes = delivered;
                }
            }
        }
    }

    tracing::info!(bytes_received = total_read, "receive loop finished");
    Ok(())
}
