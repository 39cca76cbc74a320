// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;
use std::sync::Arc;

use cc_inference::DenseNetPolicy;
use cc_server::{transport, FlowRegistry};
use structopt::StructOpt;

type Result<T, E = Box<dyn std::error::Error>> = std::result::Result<T, E>;

/// Control-plane server: listens for flow registrations and ALIVE ticks,
/// and replies with the policy's chosen `cwnd`.
#[derive(Debug, StructOpt)]
struct Opt {
    /// Path to the pre-trained policy checkpoint (JSON).
    #[structopt(long, parse(from_os_str))]
    model: PathBuf,

    /// Unix-domain socket path to listen on. If omitted, only the UDP
    /// listener runs (unless `--no-udp` is also given).
    #[structopt(long, parse(from_os_str))]
    unix_path: Option<PathBuf>,

    /// UDP port to listen on.
    #[structopt(long, default_value = "8888")]
    udp_port: u16,

    /// Disable the UDP listener even if `--unix-path` is not given.
    #[structopt(long)]
    no_udp: bool,

    /// Serve inference in batched mode (coalescing across flows) instead of
    /// immediate (synchronous per-request) mode.
    #[structopt(long)]
    batch: bool,

    #[structopt(long, default_value = "cc_server=info,cc_detector=info")]
    log_filter: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let opt = Opt::from_args();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&opt.log_filter))
        .init();

    // A model-load error is fatal at start-up: propagate
    // it out of main so the process exits non-zero.
    let policy = DenseNetPolicy::load(&opt.model)?;
    tracing::info!(model = %opt.model.display(), tensors = ?policy.tensor_names(), "loaded policy checkpoint");

    // The engine is a genuine process-wide singleton (one loaded policy,
    // shared by every transport task): install it once here and hand out
    // the `&'static Engine` handle `cc_inference::global()` would otherwise
    // return to a later caller.
    let engine = cc_inference::install(Arc::new(policy));
    let registry = Arc::new(FlowRegistry::new());
    let run_udp = !opt.no_udp;

    if opt.unix_path.is_none() && !run_udp {
        return Err("no transport enabled: pass --unix-path or drop --no-udp".into());
    }

    let unix_task = opt.unix_path.clone().map(|path| {
        let registry = Arc::clone(&registry);
        let batch = opt.batch;
        tokio::spawn(async move { transport::unix::serve(path, registry, engine, batch).await })
    });
    let udp_task = run_udp.then(|| {
        let registry = Arc::clone(&registry);
        let batch = opt.batch;
        let port = opt.udp_port;
        tokio::spawn(async move { transport::udp::serve(port, registry, engine, batch).await })
    });

    match (unix_task, udp_task) {
        (Some(unix_task), Some(udp_task)) => {
            tokio::select! {
                r = unix_task => r??,
                r = udp_task => r??,
            }
        }
        (Some(unix_task), None) => unix_task.await??,
        (None, Some(udp_task)) => udp_task.await??,
        (None, None) => unreachable!("checked above"),
    }

    Ok(())
}
