// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Writing a policy-chosen `cwnd` back into the kernel socket (the last
//! step of the per-tick control loop) needs the companion kernel CC
//! module (C1) to accept an externally supplied window; stock Linux has no
//! standard socket option for "set my congestion window to exactly N"
//! outside of that module ("a pure-userspace reimplementation may omit
//! C1 entirely if the host stack's pacing and cwnd writes are available
//! through a sufficiently expressive socket-options surface" — on a stock
//! kernel that surface does not exist). [`CwndWriter`] is the seam: a real
//! deployment with `cc-detector`'s C1 loaded would write through
//! `TCP_CC_INFO`/a custom sockopt; here, [`LoggingCwndWriter`] records what
//! would have been written so the rest of the driver's shape (including the
//! performance log's `cwnd_assigned` column) is exercised without
//! fabricating a sockopt the host kernel doesn't expose.

use std::sync::atomic::{AtomicU32, Ordering};

/// Applies the `cwnd` a control-plane reply assigned to the underlying
/// socket.
pub trait CwndWriter: Send {
    fn apply(&mut self, cwnd: u32);

    /// The most recently applied value, for the performance log's
    /// `cwnd_assigned` column.
    fn last_applied(&self) -> u32;
}

/// Records the assigned `cwnd` without attempting a kernel write. This is
/// the only writer that works on a host without C1's kernel module loaded,
/// and the one used by every test and by the CLI by default.
#[derive(Default)]
pub struct LoggingCwndWriter {
    last: AtomicU32,
}

impl CwndWriter for LoggingCwndWriter {
    fn apply(&mut self, cwnd: u32) {
        tracing::trace!(cwnd, "cwnd_writer: recording assigned cwnd (no kernel write)");
        *self.last.get_mut() = cwnd;
    }

    fn last_applied(&self) -> u32 {
        self.last.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_the_most_recently_applied_value() {
        let mut writer = LoggingCwndWriter::default();
        assert_eq!(writer.last_applied(), 0);
        writer.apply(37);
        assert_eq!(writer.last_applied(), 37);
        writer.apply(40);
        assert_eq!(writer.last_applied(), 40);
    }
}
