// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::classify::ResetCodes;
use crate::estimator::{AppliedCaps, Estimator};
use crate::sample::{AckSample, CaState};
use crate::tunables::Tunables;

/// Per-socket shell around [`Estimator`] (`struct astraea`). Owns the bits
/// the estimator itself has no opinion on: the previous congestion-avoidance
/// state (needed to decide when an `exclude_*` reset fires and to refuse the
/// default post-loss `cwnd` shrinkage) and the allocation-failure fallback
/// (a socket that failed to allocate its estimator
/// behaves as a pass-through forever after).
#[derive(Clone, Debug)]
pub struct PerSocketState {
    prev_ca_state: CaState,
    prior_cwnd: u32,
    estimator: Option<Estimator>,
}

impl PerSocketState {
    /// `astraea_init`. `estimator` is `None` when allocation is modeled as
    /// having failed; every subsequent call becomes a no-op pass-through.
    pub fn attach(now_us: u32, allocation_succeeded: bool) -> Self {
        Self {
            prev_ca_state: CaState::Open,
            prior_cwnd: 0,
            estimator: allocation_succeeded.then(|| Estimator::new(now_us, 0, 0)),
        }
    }

    pub fn estimator(&self) -> Option<&Estimator> {
        self.estimator.as_ref()
    }

    pub fn prior_cwnd(&self) -> u32 {
        self.prior_cwnd
    }

    pub fn prev_ca_state(&self) -> CaState {
        self.prev_ca_state
    }

    /// `astraea_cwnd_event` on `CA_EVENT_TX_START`: re-anchors the estimator
    /// at the start of a new transfer era. No-op on a pass-through socket.
    pub fn on_tx_start(&mut self, now_us: u32, delivered: u32, lost: u32) {
        if self.estimator.is_some() {
            self.estimator = Some(Estimator::new(now_us, delivered, lost));
        }
    }

    /// `astraea_set_state`: tracks the congestion-avoidance transition and
    /// snapshots `prior_cwnd` the way `save_cwnd` does — once per entry into
    /// `Recovery`/`Loss`, not on every call while already inside one.
    pub fn set_state(&mut self, new_state: CaState, cwnd: u32) {
        if new_state >= CaState::Recovery && self.prev_ca_state < CaState::Recovery {
            self.prior_cwnd = cwnd;
        }
        self.prev_ca_state = new_state;
    }

    /// One delivered-sample event. Runs the estimator (if attached), then
    /// applies any `exclude_*` reset the tunables call for, keyed off the
    /// congestion-avoidance transition this same sample carries.
    pub fn on_ack(&mut self, tunables: &Tunables, sample: &AckSample) {
        let Some(estimator) = self.estimator.as_mut() else {
            self.prev_ca_state = sample.ca_state;
            return;
        };

        estimator.on_ack(tunables, sample);

        if tunables.exclude_rwnd() && sample.rwnd_limited {
            estimator.reset(sample.now_us, 0, 0, ResetCodes::RWND_LIMITED);
        } else if tunables.exclude_rto()
            && self.prev_ca_state == CaState::Loss
            && sample.ca_state != CaState::Loss
        {
            estimator.reset(sample.now_us, 0, 0, ResetCodes::RTO_EXCLUDED);
        } else if tunables.exclude_applimited() && sample.is_app_limited {
            estimator.reset(sample.now_us, 0, 0, ResetCodes::APP_LIMITED);
        }

        self.prev_ca_state = sample.ca_state;
    }

    /// Caps to apply to the socket's pacing rate / `cwnd` for `sample`, or
    /// `AppliedCaps::default()` on a pass-through (unattached or disabled)
    /// socket.
    pub fn caps(&self, tunables: &Tunables, sample: &AckSample) -> AppliedCaps {
        self.estimator
            .as_ref()
            .map(|e| e.caps(tunables, sample))
            .unwrap_or_default()
    }

    /// `astraea_ssthresh`: snapshots `prior_cwnd` and returns `max(cwnd, 10)`.
    pub fn ssthresh(&mut self, cwnd: u32) -> u32 {
        self.prior_cwnd = cwnd;
        cwnd.max(10)
    }

    /// `astraea_undo_cwnd`: always a no-op, attached estimator or not — the
    /// module never second-guesses a previously applied `cwnd`.
    pub fn undo_cwnd(&self, cwnd: u32) -> u32 {
        cwnd
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classify;

    fn sample_at(now_us: u32) -> AckSample {
        AckSample {
            now_us,
            rtt_us: 10_000,
            srtt_us: 10_000,
            delivered_pkts: 0,
            goodput_pkts: 0,
            lost_pkts: 0,
            prior_delivered: 0,
            mss: 1460,
            bytes_acked: 0,
            is_app_limited: false,
            rwnd_limited: true,
            has_delivery_rate: true,
            ca_state: CaState::Open,
        }
    }

    #[test]
    fn allocation_failure_is_a_silent_pass_through() {
        let tunables = Tunables::default();
        let mut socket = PerSocketState::attach(0, false);
        assert!(socket.estimator().is_none());

        socket.on_ack(&tunables, &sample_at(1_000));
        assert_eq!(socket.caps(&tunables, &sample_at(1_000)), AppliedCaps::default());
        assert_eq!(socket.undo_cwnd(500), 500);
        assert_eq!(socket.ssthresh(500), 500);
    }

    #[test]
    fn ssthresh_floors_at_ten() {
        let mut socket = PerSocketState::attach(0, true);
        assert_eq!(socket.ssthresh(3), 10);
        assert_eq!(socket.prior_cwnd(), 3);
    }

    #[test]
    fn rwnd_limited_reset_zeroes_classify_code_five_while_capped() {
        let tunables = Tunables::default();
        tunables.set_exclude_rwnd(true);
        let mut socket = PerSocketState::attach(0, true);
        socket.estimator.as_mut().unwrap().reset_for_test_capped();

        socket.on_ack(&tunables, &sample_at(5_000));

        assert_eq!(socket.estimator().unwrap().classify(), Classify::ResetDisabled(5));
    }

    #[test]
    fn prior_cwnd_snapshot_only_on_entry_to_recovery() {
        let mut socket = PerSocketState::attach(0, true);
        socket.set_state(CaState::Open, 100);
        assert_eq!(socket.prior_cwnd(), 0);

        socket.set_state(CaState::Recovery, 80);
        assert_eq!(socket.prior_cwnd(), 80);

        // Still inside Recovery: a later cwnd change must not overwrite it.
        socket.set_state(CaState::Recovery, 40);
        assert_eq!(socket.prior_cwnd(), 80);
    }
}
