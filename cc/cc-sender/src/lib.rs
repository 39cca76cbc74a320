// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Sender-side control driver (C5): per-tick telemetry pull, ALIVE
//! round-trip against the control-plane server, and the write-back of the
//! resulting `cwnd`, plus the bulk-data and performance-log peers that
//! coordinate with it on a single `send_traffic` flag.

mod bulk;
mod cong;
mod control_channel;
mod cwnd_writer;
mod driver;
mod error;
mod perf_log;
mod telemetry;

pub use bulk::{recv_all, send_all};
pub use cong::set_congestion;
pub use control_channel::ControlChannel;
pub use cwnd_writer::{CwndWriter, LoggingCwndWriter};
pub use driver::ControlDriver;
pub use error::{Error, Result};
pub use perf_log::{PerfLogRow, PerfLogWriter};
pub use telemetry::{MockTelemetrySource, TelemetrySource};

#[cfg(target_os = "linux")]
pub use telemetry::LoopbackTelemetrySource;
