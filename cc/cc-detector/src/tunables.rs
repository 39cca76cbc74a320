// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Live-tunable knobs for the estimator, mirroring the kernel module's
/// `module_param_named` surface. Each is independently adjustable at
/// runtime (the original exposes them through `/sys/module/.../parameters`);
/// here they're exposed as atomics so a control surface can flip them
/// without taking a lock on the hot ACK path.
#[derive(Debug)]
pub struct Tunables {
    probe_interval: AtomicU32,
    probe_per: AtomicU32,
    optimize_flag: AtomicBool,
    monitor_period: AtomicU32,
    use_goodput: AtomicBool,
    exclude_rto: AtomicBool,
    exclude_rwnd: AtomicBool,
    exclude_applimited: AtomicBool,
    /// Declared in the source (`high_loss_disclassify`) but never consumed
    /// by any branch of the classification logic. Kept for parity with the
    /// tunable surface; reading it has no effect on `Estimator` behavior.
    pub high_loss_disclassify: AtomicU32,
    /// Gates the `tracing` calls callers place on the estimator's state
    /// transitions, the userspace analogue of the kernel module's
    /// `enable_printk` parameter. Off by default, matching the module's
    /// default of not flooding the kernel log.
    enable_printk: AtomicBool,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            probe_interval: AtomicU32::new(20),
            probe_per: AtomicU32::new(24),
            optimize_flag: AtomicBool::new(true),
            monitor_period: AtomicU32::new(3),
            use_goodput: AtomicBool::new(true),
            exclude_rto: AtomicBool::new(false),
            exclude_rwnd: AtomicBool::new(false),
            exclude_applimited: AtomicBool::new(false),
            high_loss_disclassify: AtomicU32::new(2),
            enable_printk: AtomicBool::new(false),
        }
    }
}

impl Tunables {
    pub fn probe_interval(&self) -> u32 {
        self.probe_interval.load(Ordering::Relaxed)
    }

    pub fn set_probe_interval(&self, value: u32) {
        self.probe_interval.store(value, Ordering::Relaxed);
    }

    pub fn probe_per(&self) -> u32 {
        self.probe_per.load(Ordering::Relaxed)
    }

    pub fn set_probe_per(&self, value: u32) {
        self.probe_per.store(value, Ordering::Relaxed);
    }

    pub fn optimize_flag(&self) -> bool {
        self.optimize_flag.load(Ordering::Relaxed)
    }

    pub fn set_optimize_flag(&self, value: bool) {
        self.optimize_flag.store(value, Ordering::Relaxed);
    }

    pub fn monitor_period(&self) -> u32 {
        self.monitor_period.load(Ordering::Relaxed)
    }

    pub fn set_monitor_period(&self, value: u32) {
        self.monitor_period.store(value, Ordering::Relaxed);
    }

    pub fn use_goodput(&self) -> bool {
        self.use_goodput.load(Ordering::Relaxed)
    }

    pub fn set_use_goodput(&self, value: bool) {
        self.use_goodput.store(value, Ordering::Relaxed);
    }

    pub fn exclude_rto(&self) -> bool {
        self.exclude_rto.load(Ordering::Relaxed)
    }

    pub fn set_exclude_rto(&self, value: bool) {
        self.exclude_rto.store(value, Ordering::Relaxed);
    }

    pub fn exclude_rwnd(&self) -> bool {
        self.exclude_rwnd.load(Ordering::Relaxed)
    }

    pub fn set_exclude_rwnd(&self, value: bool) {
        self.exclude_rwnd.store(value, Ordering::Relaxed);
    }

    pub fn exclude_applimited(&self) -> bool {
        self.exclude_applimited.load(Ordering::Relaxed)
    }

    pub fn set_exclude_applimited(&self, value: bool) {
        self.exclude_applimited.store(value, Ordering::Relaxed);
    }

    pub fn enable_printk(&self) -> bool {
        self.enable_printk.load(Ordering::Relaxed)
    }

    pub fn set_enable_printk(&self, value: bool) {
        self.enable_printk.store(value, Ordering::Relaxed);
    }
}
