// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Sender CLI: listens for one incoming data connection, drives its
//! congestion control through the control-plane server (`--pyhelper`) while
//! pushing `--size` bytes of filler payload, and optionally logs a
//! performance row every `--perf-interval` milliseconds.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cc_sender::{ControlChannel, ControlDriver, LoggingCwndWriter, PerfLogWriter};
use structopt::StructOpt;
use tokio::net::TcpListener;

type Result<T, E = Box<dyn std::error::Error>> = std::result::Result<T, E>;

#[derive(Debug, StructOpt)]
#[structopt(name = "cc-sender", about = "ML-assisted congestion-control sender")]
struct Opt {
    /// TCP port to listen on for the incoming data connection.
    #[structopt(long)]
    port: u16,

    /// Initial TCP congestion-control algorithm to request on the data
    /// socket before the control plane starts overriding it.
    #[structopt(long, default_value = "cubic")]
    cong: String,

    /// Control-tick interval, milliseconds.
    #[structopt(long, default_value = "20")]
    interval: u64,

    /// Unix-domain socket path the control-plane server (the "python
    /// helper" in the original's naming) is listening on.
    #[structopt(long, parse(from_os_str))]
    pyhelper: PathBuf,

    /// Path to the policy checkpoint the control-plane server was started
    /// with. Not read by this process directly; validated at start-up so a
    /// stale `--model` path surfaces before the flow runs instead of as a
    /// cryptic remote failure during the first ALIVE tick.
    #[structopt(long, parse(from_os_str))]
    model: PathBuf,

    /// Flow id to register with the control plane.
    #[structopt(long, default_value = "0")]
    id: u64,

    /// Optional performance-log output file.
    #[structopt(long, parse(from_os_str))]
    perf_log: Option<PathBuf>,

    /// Performance-log row interval, milliseconds.
    #[structopt(long, default_value = "1000")]
    perf_interval: u64,

    /// Total number of filler bytes to push over the data connection.
    #[structopt(long)]
    size: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let opt = Opt::from_args();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("cc_sender=info"))
        .init();

    if opt.size == 0 {
        return Err("--size must be greater than 0".into());
    }
    if !opt.pyhelper.exists() {
        return Err(format!("--pyhelper path does not exist: {}", opt.pyhelper.display()).into());
    }
    if !opt.model.exists() {
        return Err(format!("--model path does not exist: {}", opt.model.display()).into());
    }

    let listener = TcpListener::bind(("0.0.0.0", opt.port)).await?;
    tracing::info!(port = opt.port, "waiting for data connection");
    let (stream, peer) = listener.accept().await?;
    tracing::info!(%peer, "accepted data connection");
    stream.set_nodelay(true)?;

    #[cfg(target_os = "linux")]
    {
        use std::os::unix::io::AsRawFd;
        if let Err(err) = cc_sender::set_congestion(stream.as_raw_fd(), &opt.cong) {
            tracing::warn!(cong = %opt.cong, %err, "failed to set initial congestion-control algorithm");
        }
    }

    let send_traffic = Arc::new(AtomicBool::new(true));

    #[cfg(unix)]
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    let sigint_flag = Arc::clone(&send_traffic);
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
        }
        tracing::info!("shutdown signal received");
        sigint_flag.store(false, Ordering::Relaxed);
    });

    #[cfg(target_os = "linux")]
    let telemetry: Box<dyn cc_sender::TelemetrySource> = {
        use std::os::unix::io::AsRawFd;
        Box::new(cc_sender::LoopbackTelemetrySource::new(stream.as_raw_fd()))
    };
    #[cfg(not(target_os = "linux"))]
    let telemetry: Box<dyn cc_sender::TelemetrySource> =
        Box::new(cc_sender::MockTelemetrySource::new(vec![Default::default()]));

    // The data connection is write-only from this side; the read half is
    // kept alive (dropping it would close the socket) but never read from.
    let (_read_half, mut write_half) = stream.into_split();

    let perf_log = opt
        .perf_log
        .as_ref()
        .map(PerfLogWriter::create)
        .transpose()?;

    let channel = ControlChannel::connect_unix(&opt.pyhelper).await?;
    let driver = ControlDriver::new(
        opt.id,
        channel,
        telemetry,
        Box::new(LoggingCwndWriter::default()),
        perf_log,
        Duration::from_millis(opt.interval),
        Duration::from_millis(opt.perf_interval),
        Arc::clone(&send_traffic),
    );

    let data_flag = Arc::clone(&send_traffic);
    let size = opt.size;
    let data_task = tokio::spawn(async move { cc_sender::send_all(&mut write_half, size, data_flag).await });

    let control_result = driver.run().await;
    send_traffic.store(false, Ordering::Relaxed);

    let bytes_sent = data_task.await??;
    tracing::info!(bytes_sent, "data thread finished");

    match control_result {
        Ok(flow_id) => tracing::info!(flow_id, "control driver finished"),
        Err(err) => tracing::warn!(%err, "control driver exited with an error"),
    }

    Ok(())
}
